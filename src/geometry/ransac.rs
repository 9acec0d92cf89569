use log::trace;
use nalgebra as na;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::PointPair;

/// A minimal-sample model fit plus its per-pair error.
pub trait Estimator {
    const MIN_SAMPLES: usize;

    fn estimate(&self, pairs: &[PointPair]) -> Option<na::Matrix3<f64>>;

    fn residual(&self, model: &na::Matrix3<f64>, pair: &PointPair) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ransac {
    /// Inlier tolerance, in the units of `Estimator::residual`.
    pub threshold: f64,
    pub confidence: f64,
    pub max_iterations: usize,
    pub seed: u64,
}

impl Default for Ransac {
    fn default() -> Self {
        Self {
            threshold: 3.0,
            confidence: 0.99,
            max_iterations: 2000,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Consensus {
    pub model: na::Matrix3<f64>,
    pub inliers: Vec<bool>,
    pub num_inliers: usize,
}

impl Consensus {
    pub fn inlier_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.inliers
            .iter()
            .enumerate()
            .filter_map(|(i, &inlier)| inlier.then_some(i))
    }
}

/// Iterations needed to draw one all-inlier sample with probability
/// `confidence`, given the current inlier ratio.
pub fn required_iterations(
    confidence: f64,
    inlier_ratio: f64,
    sample_size: usize,
    max_iterations: usize,
) -> usize {
    let p = confidence.clamp(0.0, 1.0);
    let num = (1.0 - p).max(f64::MIN_POSITIVE).ln();
    let all_inliers = inlier_ratio.clamp(0.0, 1.0).powi(sample_size as i32);
    let denom = 1.0 - all_inliers;
    if denom < f64::MIN_POSITIVE {
        return 0;
    }
    let denom = denom.ln();
    if denom >= 0.0 || -num >= max_iterations as f64 * -denom {
        max_iterations
    } else {
        (num / denom).round() as usize
    }
}

impl Ransac {
    pub fn run<E: Estimator>(&self, estimator: &E, pairs: &[PointPair]) -> Option<Consensus> {
        let n = pairs.len();
        if n < E::MIN_SAMPLES {
            trace!("ransac needs {} pairs, got {}", E::MIN_SAMPLES, n);
            return None;
        }
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut nums: Vec<usize> = (0..n).collect();
        let mut sample: Vec<PointPair> = Vec::with_capacity(E::MIN_SAMPLES);
        let mut best: Option<Consensus> = None;
        let mut iterations = self.max_iterations.max(1);
        let mut iter = 0;
        while iter < iterations {
            iter += 1;
            let (chosen, _) = nums.partial_shuffle(&mut rng, E::MIN_SAMPLES);
            sample.clear();
            sample.extend(chosen.iter().map(|&i| pairs[i]));
            let Some(model) = estimator.estimate(&sample) else {
                continue;
            };
            let inliers: Vec<bool> = pairs
                .iter()
                .map(|p| estimator.residual(&model, p) <= self.threshold)
                .collect();
            let num_inliers = inliers.iter().filter(|&&b| b).count();
            let improved = match &best {
                Some(b) => num_inliers > b.num_inliers,
                None => true,
            };
            if improved {
                iterations = iterations.min(required_iterations(
                    self.confidence,
                    num_inliers as f64 / n as f64,
                    E::MIN_SAMPLES,
                    self.max_iterations,
                ));
                best = Some(Consensus {
                    model,
                    inliers,
                    num_inliers,
                });
            }
        }
        trace!(
            "ransac finished after {} iterations, {:?} inliers of {}",
            iter,
            best.as_ref().map(|b| b.num_inliers),
            n
        );
        best.filter(|b| b.num_inliers >= E::MIN_SAMPLES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_inliers_needs_no_more_iterations() {
        assert_eq!(required_iterations(0.99, 1.0, 8, 2000), 0);
    }

    #[test]
    fn no_inliers_saturates() {
        assert_eq!(required_iterations(0.99, 0.0, 8, 2000), 2000);
    }

    #[test]
    fn half_inliers_four_samples() {
        // log(0.01) / log(1 - 0.5^4) ~= 71.4
        assert_eq!(required_iterations(0.99, 0.5, 4, 2000), 71);
    }
}
