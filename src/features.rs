use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub pt: Vec2,
    pub size: f32,
    pub response: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32) -> Keypoint {
        Keypoint {
            pt: Vec2::new(x, y),
            size: 1.0,
            response: 0.0,
        }
    }

    pub fn with_size(mut self, size: f32) -> Keypoint {
        self.size = size;
        self
    }

    pub fn with_response(mut self, response: f32) -> Keypoint {
        self.response = response;
        self
    }
}

/// Row-major descriptor matrix, one fixed-length row per keypoint.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Descriptors {
    dim: usize,
    data: Vec<f32>,
}

impl Descriptors {
    pub fn new(dim: usize, data: Vec<f32>) -> Descriptors {
        if dim == 0 {
            if !data.is_empty() {
                panic!("zero-length descriptors cannot carry data.")
            }
        } else if data.len() % dim != 0 {
            panic!(
                "descriptor data length {} is not a multiple of dim {}.",
                data.len(),
                dim
            )
        }
        Descriptors { dim, data }
    }

    pub fn from_rows(rows: Vec<Vec<f32>>) -> Descriptors {
        let dim = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut data = Vec::with_capacity(dim * rows.len());
        for row in rows {
            if row.len() != dim {
                panic!("descriptor rows must all have length {}.", dim)
            }
            data.extend(row);
        }
        Descriptors { dim, data }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.data.len() / self.dim
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        // chunks_exact panics on a zero chunk size
        self.data.chunks_exact(self.dim.max(1))
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Keypoints of one image with their parallel descriptors; index `i` in both
/// refers to the same feature.
#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    keypoints: Vec<Keypoint>,
    descriptors: Descriptors,
}

impl FeatureSet {
    pub fn new(keypoints: Vec<Keypoint>, descriptors: Descriptors) -> FeatureSet {
        if keypoints.len() != descriptors.len() {
            panic!(
                "keypoint count {} and descriptor count {} are not the same.",
                keypoints.len(),
                descriptors.len()
            )
        }
        FeatureSet {
            keypoints,
            descriptors,
        }
    }

    pub fn empty() -> FeatureSet {
        FeatureSet::default()
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    pub fn descriptors(&self) -> &Descriptors {
        &self.descriptors
    }

    pub fn point(&self, i: usize) -> Vec2 {
        self.keypoints[i].pt
    }
}
