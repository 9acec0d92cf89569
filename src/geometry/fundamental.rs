use log::debug;
use nalgebra as na;

use super::{Estimator, PointPair, normalize_points, smallest_eigenvector, to_homogeneous};

/// Normalized eight-point fit of F with x1ᵀ F x0 = 0, where each pair is
/// (x0, x1). Uses every pair given, so it serves both as the RANSAC minimal
/// solver and as the least-squares refit on all inliers.
pub fn eight_point(pairs: &[PointPair]) -> Option<na::Matrix3<f64>> {
    if pairs.len() < 8 {
        debug!("eight point needs 8 pairs, got {}", pairs.len());
        return None;
    }
    let (t0, p0) = normalize_points(pairs.iter().map(|p| p.0))?;
    let (t1, p1) = normalize_points(pairs.iter().map(|p| p.1))?;

    let mut a = na::DMatrix::zeros(pairs.len(), 9);
    for (r, (x0, x1)) in p0.iter().zip(&p1).enumerate() {
        a[(r, 0)] = x1.x * x0.x;
        a[(r, 1)] = x1.x * x0.y;
        a[(r, 2)] = x1.x;
        a[(r, 3)] = x1.y * x0.x;
        a[(r, 4)] = x1.y * x0.y;
        a[(r, 5)] = x1.y;
        a[(r, 6)] = x0.x;
        a[(r, 7)] = x0.y;
        a[(r, 8)] = 1.0;
    }
    let f_norm = enforce_rank2(&smallest_eigenvector(&a)?)?;
    let f = t1.transpose() * f_norm * t0;

    let norm = f.norm();
    if !norm.is_finite() || norm < 1e-15 {
        return None;
    }
    let f = f / norm;
    // fix the sign so identical inputs give identical matrices
    if f[(2, 2)] < 0.0 { Some(-f) } else { Some(f) }
}

fn enforce_rank2(f: &na::Matrix3<f64>) -> Option<na::Matrix3<f64>> {
    let mut svd = f.svd(true, true);
    let (min_idx, _) = svd
        .singular_values
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))?;
    svd.singular_values[min_idx] = 0.0;
    svd.recompose().ok()
}

/// First-order geometric distance of a pair to the epipolar relation, in pixels.
pub fn sampson_distance(f: &na::Matrix3<f64>, pair: &PointPair) -> f64 {
    let x0 = to_homogeneous(pair.0);
    let x1 = to_homogeneous(pair.1);
    let fx0 = f * x0;
    let ftx1 = f.transpose() * x1;
    let num = x1.dot(&fx0);
    let den = fx0.x * fx0.x + fx0.y * fx0.y + ftx1.x * ftx1.x + ftx1.y * ftx1.y;
    if den <= f64::EPSILON {
        // both points sit on their epipoles
        return if num.abs() <= f64::EPSILON { 0.0 } else { f64::INFINITY };
    }
    (num * num / den).sqrt()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FundamentalEstimator;

impl Estimator for FundamentalEstimator {
    const MIN_SAMPLES: usize = 8;

    fn estimate(&self, pairs: &[PointPair]) -> Option<na::Matrix3<f64>> {
        eight_point(pairs)
    }

    fn residual(&self, model: &na::Matrix3<f64>, pair: &PointPair) -> f64 {
        sampson_distance(model, pair)
    }
}
