use std::collections::HashMap;

use glam::DVec2;
use log::debug;
use nalgebra as na;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::MatcherConfig;
use crate::features::{Descriptors, FeatureSet, euclidean_distance};
use crate::geometry::{FundamentalEstimator, PointPair, eight_point};
use crate::types::{Correspondence, GeometryEstimate, KnnMatches, ValidatedCorrespondence};

/// Per-stage counts of one `match_features` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStats {
    pub forward: usize,
    pub backward: usize,
    pub forward_ratio_removed: usize,
    pub backward_ratio_removed: usize,
    pub symmetric: usize,
    pub validated: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MatchResult {
    pub validated: Vec<ValidatedCorrespondence>,
    pub geometry: Option<GeometryEstimate>,
    pub stats: MatchStats,
}

/// The `k` nearest train descriptors of every query descriptor, nearest first.
/// Ties keep the lower train index.
///
/// # Panics
/// When both sets are non-empty and their descriptor lengths differ.
pub fn knn_match(query: &Descriptors, train: &Descriptors, k: usize) -> KnnMatches {
    if !query.is_empty() && !train.is_empty() && query.dim() != train.dim() {
        panic!(
            "query descriptor length {} and train descriptor length {} are not the same.",
            query.dim(),
            train.dim()
        )
    }
    (0..query.len())
        .into_par_iter()
        .map(|q| {
            let q_desc = query.row(q);
            let mut best: Vec<Correspondence> = Vec::with_capacity(k + 1);
            for (t, t_desc) in train.rows().enumerate() {
                let distance = euclidean_distance(q_desc, t_desc);
                if best.len() == k && best.last().is_some_and(|b| distance >= b.distance) {
                    continue;
                }
                let pos = best.partition_point(|b| b.distance <= distance);
                best.insert(pos, Correspondence::new(q, t, distance));
                best.truncate(k);
            }
            best
        })
        .collect()
}

/// Clears every entry with fewer than two neighbours or with
/// `d1 / d2 > ratio`. Returns the number of entries cleared.
pub fn ratio_test(matches: &mut KnnMatches, ratio: f32) -> usize {
    let mut removed = 0;
    for knn in matches.iter_mut() {
        // a NaN ratio (0 / 0) is not ambiguous
        let ambiguous = knn.len() < 2 || knn[0].distance / knn[1].distance > ratio;
        if ambiguous {
            knn.clear();
            removed += 1;
        }
    }
    removed
}

/// Keeps forward matches `q -> t` whose backward best match is `t -> q`.
/// Entries with fewer than two candidates count as removed.
pub fn symmetry_test(forward: &KnnMatches, backward: &KnnMatches) -> Vec<Correspondence> {
    let backward_best: HashMap<usize, usize> = backward
        .iter()
        .filter(|knn| knn.len() >= 2)
        .map(|knn| (knn[0].query, knn[0].target))
        .collect();
    forward
        .iter()
        .filter(|knn| knn.len() >= 2)
        .map(|knn| knn[0])
        .filter(|m| backward_best.get(&m.target) == Some(&m.query))
        .collect()
}

fn point_pairs(
    matches: &[Correspondence],
    reference: &FeatureSet,
    frame: &FeatureSet,
) -> Vec<PointPair> {
    matches
        .iter()
        .map(|m| {
            (
                reference.point(m.query).as_dvec2(),
                frame.point(m.target).as_dvec2(),
            )
        })
        .collect()
}

/// Refits F on every pair with the least-squares eight-point solver.
pub fn refine_fundamental(pairs: &[PointPair]) -> Option<na::Matrix3<f64>> {
    eight_point(pairs)
}

#[derive(Debug, Clone, Default)]
pub struct CorrespondenceMatcher {
    config: MatcherConfig,
}

impl CorrespondenceMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub fn set_ratio(&mut self, ratio: f32) {
        self.config.ratio = ratio;
    }

    pub fn set_refine_fundamental(&mut self, refine: bool) {
        self.config.refine_fundamental = refine;
    }

    pub fn set_epipolar_distance(&mut self, distance: f64) {
        self.config.epipolar_distance = distance;
    }

    pub fn set_confidence(&mut self, confidence: f64) {
        self.config.confidence = confidence;
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.config.seed = seed;
    }

    /// Matches the reference features against the frame features.
    ///
    /// Runs k=2 nearest-neighbour search both ways, the ratio test on each
    /// direction, the symmetry test, then RANSAC on the fundamental matrix.
    /// Too few or degenerate points, or descriptors of different lengths, give
    /// an empty result, never an error.
    pub fn match_features(&self, reference: &FeatureSet, frame: &FeatureSet) -> MatchResult {
        let (ref_dim, frame_dim) = (reference.descriptors().dim(), frame.descriptors().dim());
        if !reference.is_empty() && !frame.is_empty() && ref_dim != frame_dim {
            debug!(
                "descriptor length {} of the reference and {} of the frame differ",
                ref_dim, frame_dim
            );
            return MatchResult::default();
        }
        let (mut forward, mut backward) = rayon::join(
            || knn_match(reference.descriptors(), frame.descriptors(), 2),
            || knn_match(frame.descriptors(), reference.descriptors(), 2),
        );
        let mut stats = MatchStats {
            forward: forward.len(),
            backward: backward.len(),
            ..Default::default()
        };
        debug!("matched points ref->frame: {}", stats.forward);
        debug!("matched points frame->ref: {}", stats.backward);

        stats.forward_ratio_removed = ratio_test(&mut forward, self.config.ratio);
        stats.backward_ratio_removed = ratio_test(&mut backward, self.config.ratio);
        debug!(
            "after ratio test ref->frame: {}, frame->ref: {}",
            stats.forward - stats.forward_ratio_removed,
            stats.backward - stats.backward_ratio_removed
        );

        let symmetric = symmetry_test(&forward, &backward);
        stats.symmetric = symmetric.len();
        debug!("after symmetry test: {}", stats.symmetric);

        let (validated, geometry) = self.ransac_test(&symmetric, reference, frame);
        stats.validated = validated.len();
        debug!("after ransac: {}", stats.validated);

        MatchResult {
            validated,
            geometry,
            stats,
        }
    }

    fn ransac_test(
        &self,
        matches: &[Correspondence],
        reference: &FeatureSet,
        frame: &FeatureSet,
    ) -> (Vec<Correspondence>, Option<GeometryEstimate>) {
        let pairs = point_pairs(matches, reference, frame);
        let Some(consensus) = self.config.ransac().run(&FundamentalEstimator, &pairs) else {
            debug!("no fundamental matrix from {} pairs", pairs.len());
            return (Vec::new(), None);
        };
        let validated: Vec<Correspondence> =
            consensus.inlier_indices().map(|i| matches[i]).collect();

        let mut fundamental = consensus.model;
        if self.config.refine_fundamental && validated.len() >= 8 {
            let inlier_pairs: Vec<PointPair> =
                consensus.inlier_indices().map(|i| pairs[i]).collect();
            if let Some(refined) = refine_fundamental(&inlier_pairs) {
                fundamental = refined;
            }
        }
        (validated, Some(fundamental))
    }
}

/// Pixel endpoints of each correspondence, reference first.
pub fn match_lines(
    matches: &[Correspondence],
    reference: &FeatureSet,
    frame: &FeatureSet,
) -> Vec<(DVec2, DVec2)> {
    point_pairs(matches, reference, frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knn(q: usize, entries: &[(usize, f32)]) -> Vec<Correspondence> {
        entries
            .iter()
            .map(|&(t, d)| Correspondence::new(q, t, d))
            .collect()
    }

    #[test]
    fn ratio_test_clears_ambiguous_and_single() {
        let mut matches = vec![
            knn(0, &[(3, 1.0), (4, 4.0)]),
            knn(1, &[(5, 3.0), (6, 3.1)]),
            knn(2, &[(7, 1.0)]),
            vec![],
        ];
        let removed = ratio_test(&mut matches, 0.65);
        assert_eq!(removed, 3);
        assert_eq!(matches[0].len(), 2);
        assert!(matches[1].is_empty());
        assert!(matches[2].is_empty());
    }

    #[test]
    fn ratio_test_keeps_duplicate_zero_distances() {
        let mut matches = vec![knn(0, &[(1, 0.0), (2, 0.0)])];
        assert_eq!(ratio_test(&mut matches, 0.65), 0);
        assert_eq!(matches[0].len(), 2);
    }

    #[test]
    fn knn_orders_nearest_first() {
        let query = Descriptors::from_rows(vec![vec![0.0, 0.0]]);
        let train = Descriptors::from_rows(vec![
            vec![3.0, 0.0],
            vec![1.0, 0.0],
            vec![2.0, 0.0],
            vec![1.0, 0.0],
        ]);
        let m = knn_match(&query, &train, 2);
        assert_eq!(m[0].len(), 2);
        assert_eq!(m[0][0].target, 1);
        assert_eq!(m[0][1].target, 3);
        assert_eq!(m[0][0].distance, 1.0);
    }

    #[test]
    fn knn_against_single_train_gives_one_neighbour() {
        let query = Descriptors::from_rows(vec![vec![0.0], vec![1.0]]);
        let train = Descriptors::from_rows(vec![vec![0.5]]);
        let m = knn_match(&query, &train, 2);
        assert!(m.iter().all(|knn| knn.len() == 1));
    }
}
