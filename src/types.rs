use glam::IVec2;
use nalgebra as na;
use serde::{Deserialize, Serialize};

/// A proposed pairing of feature `query` in one set with feature `target` in
/// another. Lower distance means more similar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Correspondence {
    pub query: usize,
    pub target: usize,
    pub distance: f32,
}

impl Correspondence {
    pub fn new(query: usize, target: usize, distance: f32) -> Correspondence {
        Correspondence {
            query,
            target,
            distance,
        }
    }
}

/// Up to k candidates per query index, nearest first.
pub type KnnMatches = Vec<Vec<Correspondence>>;

/// A correspondence that survived the ratio, symmetry and RANSAC stages.
pub type ValidatedCorrespondence = Correspondence;

/// Fundamental matrix during verification, homography during projection.
pub type GeometryEstimate = na::Matrix3<f64>;

/// Projected reference corners, ordered top-left, top-right, bottom-right,
/// bottom-left of the reference image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outline {
    /// Corners in side-by-side composite coordinates (reference left, frame right).
    pub corners: [IVec2; 4],
    pub x_offset: i32,
}

impl Outline {
    pub fn in_frame(&self) -> [IVec2; 4] {
        self.corners.map(|c| c - IVec2::new(self.x_offset, 0))
    }
}
