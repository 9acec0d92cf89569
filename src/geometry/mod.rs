pub mod fundamental;
pub mod homography;
pub mod ransac;

pub use fundamental::*;
pub use homography::*;
pub use ransac::*;

use glam::DVec2;
use nalgebra as na;

/// Point in the first image paired with its counterpart in the second.
pub type PointPair = (DVec2, DVec2);

/// Translate the centroid to the origin and scale the mean distance to sqrt(2).
///
/// Returns `None` when all points coincide.
pub(crate) fn normalize_points(
    pts: impl Iterator<Item = DVec2> + Clone,
) -> Option<(na::Matrix3<f64>, Vec<DVec2>)> {
    let n = pts.clone().count();
    if n == 0 {
        return None;
    }
    let centroid = pts.clone().fold(DVec2::ZERO, |acc, p| acc + p) / n as f64;
    let mean_dist = pts.clone().map(|p| (p - centroid).length()).sum::<f64>() / n as f64;
    if !mean_dist.is_finite() || mean_dist < 1e-12 {
        return None;
    }
    let s = std::f64::consts::SQRT_2 / mean_dist;
    let t = na::Matrix3::new(
        s,
        0.0,
        -s * centroid.x,
        0.0,
        s,
        -s * centroid.y,
        0.0,
        0.0,
        1.0,
    );
    let normalized = pts.map(|p| (p - centroid) * s).collect();
    Some((t, normalized))
}

/// Unit vector minimizing |A h|, taken as the eigenvector of the smallest
/// eigenvalue of AᵀA (always 9×9, whatever the number of rows).
pub(crate) fn smallest_eigenvector(a: &na::DMatrix<f64>) -> Option<na::Matrix3<f64>> {
    let ata = a.transpose() * a;
    let eigens = ata.try_symmetric_eigen(1e-12, 1000)?;
    let (min_idx, _) = eigens
        .eigenvalues
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))?;
    let h = eigens.eigenvectors.column(min_idx);
    let mat = na::Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]);
    if mat.iter().all(|v| v.is_finite()) {
        Some(mat)
    } else {
        None
    }
}

pub fn to_homogeneous(p: DVec2) -> na::Vector3<f64> {
    na::Vector3::new(p.x, p.y, 1.0)
}
