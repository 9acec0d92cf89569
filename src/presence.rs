use glam::{DVec2, IVec2};
use log::debug;
use nalgebra as na;

use crate::config::PresenceConfig;
use crate::features::FeatureSet;
use crate::geometry::{PointPair, fit_homography, project};
use crate::library::ReferenceObject;
use crate::types::{Correspondence, Outline};

#[derive(Debug, Clone, Default)]
pub struct PresenceDecision {
    config: PresenceConfig,
}

impl PresenceDecision {
    pub fn new(config: PresenceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PresenceConfig {
        &self.config
    }

    /// `validated.len() >= min_match_ratio * reference keypoints`.
    pub fn is_present(&self, num_validated: usize, num_reference_keypoints: usize) -> bool {
        let needed = self.config.min_match_ratio * num_reference_keypoints as f64;
        // 0.05 * 60 is 3.0000000000000004 in f64
        num_validated as f64 >= needed - 1e-9 * needed.max(1.0)
    }

    /// Homography from reference keypoints (query side) to frame keypoints
    /// (target side).
    pub fn locate(
        &self,
        reference: &FeatureSet,
        frame: &FeatureSet,
        validated: &[Correspondence],
    ) -> Option<na::Matrix3<f64>> {
        let pairs: Vec<PointPair> = validated
            .iter()
            .map(|m| {
                (
                    reference.point(m.query).as_dvec2(),
                    frame.point(m.target).as_dvec2(),
                )
            })
            .collect();
        fit_homography(&pairs, &self.config.ransac())
    }

    /// Outline of the reference object in the frame, or `None` when the object
    /// is absent or its homography is degenerate.
    pub fn decide(
        &self,
        reference: &ReferenceObject,
        frame: &FeatureSet,
        validated: &[Correspondence],
    ) -> Option<Outline> {
        if !self.is_present(validated.len(), reference.features.len()) {
            debug!(
                "{}: {} validated of {} keypoints, absent",
                reference.name,
                validated.len(),
                reference.features.len()
            );
            return None;
        }
        let h = self.locate(&reference.features, frame, validated)?;
        let (w, h_img) = reference.image.dimensions();
        project_outline(&h, w, h_img)
    }
}

/// Projects the corners of a `width` × `height` image through `h`, rounded to
/// pixels and shifted right by `width` for a side-by-side composite.
pub fn project_outline(h: &na::Matrix3<f64>, width: u32, height: u32) -> Option<Outline> {
    let (w, ht) = (width as f64, height as f64);
    let src = [
        DVec2::new(0.0, 0.0),
        DVec2::new(w, 0.0),
        DVec2::new(w, ht),
        DVec2::new(0.0, ht),
    ];
    let x_offset = width as i32;
    let mut corners = [IVec2::ZERO; 4];
    for (corner, p) in corners.iter_mut().zip(src) {
        let q = project(h, p)?;
        if q.x.abs() > i32::MAX as f64 / 2.0 || q.y.abs() > i32::MAX as f64 / 2.0 {
            return None;
        }
        *corner = IVec2::new(q.x.round() as i32 + x_offset, q.y.round() as i32);
    }
    Some(Outline { corners, x_offset })
}
