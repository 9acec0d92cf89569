use glam::DVec2;
use image::GrayImage;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::RecognitionConfig;
use crate::extractor::FeatureExtractor;
use crate::library::ReferenceLibrary;
use crate::matcher::{CorrespondenceMatcher, MatchStats, match_lines};
use crate::presence::PresenceDecision;
use crate::timer::FrameTimer;
use crate::types::Outline;

/// Everything needed to draw one frame: match lines and, when the object is
/// present, its outline in a side-by-side composite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub frame_index: usize,
    pub object: String,
    pub reference_keypoints: usize,
    pub frame_keypoints: usize,
    pub stats: MatchStats,
    pub match_lines: Vec<(DVec2, DVec2)>,
    pub present: bool,
    pub outline: Option<Outline>,
    pub fps: f64,
}

/// Tests one reference object per frame, cycling through the library.
pub struct ObjectRecognizer {
    library: ReferenceLibrary,
    matcher: CorrespondenceMatcher,
    presence: PresenceDecision,
    extractor: Box<dyn FeatureExtractor>,
    timer: FrameTimer,
    frame_index: usize,
}

impl ObjectRecognizer {
    pub fn new(
        library: ReferenceLibrary,
        config: &RecognitionConfig,
        extractor: Box<dyn FeatureExtractor>,
    ) -> ObjectRecognizer {
        ObjectRecognizer {
            library,
            matcher: CorrespondenceMatcher::new(config.matcher),
            presence: PresenceDecision::new(config.presence),
            extractor,
            timer: FrameTimer::default(),
            frame_index: 0,
        }
    }

    pub fn library(&self) -> &ReferenceLibrary {
        &self.library
    }

    pub fn matcher_mut(&mut self) -> &mut CorrespondenceMatcher {
        &mut self.matcher
    }

    pub fn run(&mut self, frame: &GrayImage) -> FrameReport {
        self.timer.start();
        let frame_features = self.extractor.extract(frame);
        let reference = self.library.next();

        let result = self
            .matcher
            .match_features(&reference.features, &frame_features);
        let outline = self
            .presence
            .decide(reference, &frame_features, &result.validated);
        let lines = match_lines(&result.validated, &reference.features, &frame_features);
        self.timer.stop();

        let report = FrameReport {
            frame_index: self.frame_index,
            object: reference.name.clone(),
            reference_keypoints: reference.features.len(),
            frame_keypoints: frame_features.len(),
            stats: result.stats,
            match_lines: lines,
            present: outline.is_some(),
            outline,
            fps: self.timer.fps(),
        };
        if report.present {
            info!(
                "frame {}: {} found with {} matches",
                report.frame_index, report.object, report.stats.validated
            );
        } else {
            debug!("frame {}: {} not found", report.frame_index, report.object);
        }
        self.frame_index += 1;
        report
    }
}
