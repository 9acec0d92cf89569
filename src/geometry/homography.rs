use glam::DVec2;
use log::debug;
use nalgebra as na;

use super::{Estimator, PointPair, Ransac, normalize_points, smallest_eigenvector, to_homogeneous};

/// Map a point through H. `None` when it lands at infinity.
pub fn project(h: &na::Matrix3<f64>, p: DVec2) -> Option<DVec2> {
    let q = h * to_homogeneous(p);
    if q.z.abs() < 1e-12 {
        return None;
    }
    let out = DVec2::new(q.x / q.z, q.y / q.z);
    out.is_finite().then_some(out)
}

pub fn reprojection_error(h: &na::Matrix3<f64>, pair: &PointPair) -> f64 {
    project(h, pair.0)
        .map(|p| p.distance(pair.1))
        .unwrap_or(f64::INFINITY)
}

/// Normalized DLT from ≥4 pairs, scaled so that H[(2, 2)] = 1.
///
/// Returns `None` for too few pairs or a singular result (e.g. collinear points).
pub fn homography_dlt(pairs: &[PointPair]) -> Option<na::Matrix3<f64>> {
    if pairs.len() < 4 {
        debug!("homography needs 4 pairs, got {}", pairs.len());
        return None;
    }
    let (t_src, src) = normalize_points(pairs.iter().map(|p| p.0))?;
    let (t_dst, dst) = normalize_points(pairs.iter().map(|p| p.1))?;

    let mut a = na::DMatrix::zeros(2 * pairs.len(), 9);
    for (i, (s, d)) in src.iter().zip(&dst).enumerate() {
        a[(2 * i, 3)] = -s.x;
        a[(2 * i, 4)] = -s.y;
        a[(2 * i, 5)] = -1.0;
        a[(2 * i, 6)] = d.y * s.x;
        a[(2 * i, 7)] = d.y * s.y;
        a[(2 * i, 8)] = d.y;

        a[(2 * i + 1, 0)] = s.x;
        a[(2 * i + 1, 1)] = s.y;
        a[(2 * i + 1, 2)] = 1.0;
        a[(2 * i + 1, 6)] = -d.x * s.x;
        a[(2 * i + 1, 7)] = -d.x * s.y;
        a[(2 * i + 1, 8)] = -d.x;
    }
    let h_norm = smallest_eigenvector(&a)?;
    let h = t_dst.try_inverse()? * h_norm * t_src;

    let scale = h[(2, 2)];
    if scale.abs() < 1e-12 {
        return None;
    }
    let h = h / scale;
    if !h.iter().all(|v| v.is_finite()) || h.determinant().abs() < 1e-12 {
        debug!("degenerate homography");
        return None;
    }
    Some(h)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HomographyEstimator;

impl Estimator for HomographyEstimator {
    const MIN_SAMPLES: usize = 4;

    fn estimate(&self, pairs: &[PointPair]) -> Option<na::Matrix3<f64>> {
        homography_dlt(pairs)
    }

    fn residual(&self, model: &na::Matrix3<f64>, pair: &PointPair) -> f64 {
        reprojection_error(model, pair)
    }
}

/// RANSAC homography followed by a DLT refit on the consensus set.
pub fn fit_homography(pairs: &[PointPair], ransac: &Ransac) -> Option<na::Matrix3<f64>> {
    let consensus = ransac.run(&HomographyEstimator, pairs)?;
    let inliers: Vec<PointPair> = consensus.inlier_indices().map(|i| pairs[i]).collect();
    Some(homography_dlt(&inliers).unwrap_or(consensus.model))
}
