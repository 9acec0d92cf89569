use serde::{Deserialize, Serialize};

use crate::geometry::Ransac;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Max ratio between the 1st and 2nd nearest neighbour distances.
    pub ratio: f32,
    /// Refit the fundamental matrix on all RANSAC inliers.
    pub refine_fundamental: bool,
    /// Max distance to the epipolar relation, in pixels.
    pub epipolar_distance: f64,
    pub confidence: f64,
    pub max_iterations: usize,
    pub seed: u64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            ratio: 0.65,
            refine_fundamental: true,
            epipolar_distance: 3.0,
            confidence: 0.99,
            max_iterations: 2000,
            seed: 0,
        }
    }
}

impl MatcherConfig {
    /// Settings the live recognizer runs with. A ratio above 1 lets nearly
    /// every two-neighbour match through the ratio test.
    pub fn deployment() -> Self {
        Self {
            ratio: 1.5,
            confidence: 0.85,
            ..Default::default()
        }
    }

    pub fn ransac(&self) -> Ransac {
        Ransac {
            threshold: self.epipolar_distance,
            confidence: self.confidence,
            max_iterations: self.max_iterations,
            seed: self.seed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    /// Validated matches needed, as a fraction of the reference keypoints.
    pub min_match_ratio: f64,
    pub reprojection_threshold: f64,
    pub confidence: f64,
    pub max_iterations: usize,
    pub seed: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            min_match_ratio: 0.05,
            reprojection_threshold: 3.0,
            confidence: 0.995,
            max_iterations: 2000,
            seed: 0,
        }
    }
}

impl PresenceConfig {
    pub fn ransac(&self) -> Ransac {
        Ransac {
            threshold: self.reprojection_threshold,
            confidence: self.confidence,
            max_iterations: self.max_iterations,
            seed: self.seed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub max_features: usize,
    pub blur_sigma: f32,
    pub harris_k: f32,
    /// Keep corners whose response is at least this fraction of the strongest.
    pub quality: f32,
    /// Half size of the descriptor patch; keypoints closer to the border are dropped.
    pub patch_radius: u32,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_features: 500,
            blur_sigma: 1.0,
            harris_k: 0.04,
            quality: 0.01,
            patch_radius: 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    pub matcher: MatcherConfig,
    pub presence: PresenceConfig,
    pub extractor: ExtractorConfig,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            matcher: MatcherConfig::deployment(),
            presence: PresenceConfig::default(),
            extractor: ExtractorConfig::default(),
        }
    }
}
