mod common;

use glam::IVec2;
use image::GrayImage;
use nalgebra as na;
use object_recognition::config::PresenceConfig;
use object_recognition::library::ReferenceObject;
use object_recognition::matcher::CorrespondenceMatcher;
use object_recognition::presence::{PresenceDecision, project_outline};
use object_recognition::types::Correspondence;

use common::*;

#[test]
fn test_presence_boundary() {
    let presence = PresenceDecision::default();
    assert!(!presence.is_present(4, 100));
    assert!(presence.is_present(5, 100));
    assert!(presence.is_present(0, 0));
}

#[test]
fn test_presence_boundary_is_exact() {
    let presence = PresenceDecision::default();
    assert!(presence.is_present(3, 60));
    assert!(!presence.is_present(2, 60));
    assert!(presence.is_present(7, 140));
    assert!(!presence.is_present(6, 140));
}

#[test]
fn test_tunable_threshold() {
    let presence = PresenceDecision::new(PresenceConfig {
        min_match_ratio: 0.5,
        ..Default::default()
    });
    assert!(!presence.is_present(49, 100));
    assert!(presence.is_present(50, 100));
}

#[test]
fn test_end_to_end_outline() {
    let pts = scattered_points(40, 100.0, 80.0, 21);
    let features = feature_set(&pts, random_descriptors(pts.len(), 32, 22));
    let frame = warp(&features, scale_translate);
    let reference = ReferenceObject::with_features("box", GrayImage::new(100, 80), features);

    let result = CorrespondenceMatcher::default().match_features(&reference.features, &frame);
    assert_eq!(result.validated.len(), pts.len());

    let outline = PresenceDecision::default()
        .decide(&reference, &frame, &result.validated)
        .expect("object should be present");
    assert_eq!(outline.x_offset, 100);

    let expected = [
        IVec2::new(50, 30),
        IVec2::new(250, 30),
        IVec2::new(250, 190),
        IVec2::new(50, 190),
    ];
    for (got, want) in outline.in_frame().iter().zip(expected) {
        assert!((got.x - want.x).abs() <= 1, "{:?} vs {:?}", got, want);
        assert!((got.y - want.y).abs() <= 1, "{:?} vs {:?}", got, want);
    }
    assert_eq!(outline.corners[0], IVec2::new(150, 30));
}

#[test]
fn test_below_threshold_is_absent() {
    let pts = scattered_points(100, 100.0, 80.0, 23);
    let features = feature_set(&pts, random_descriptors(pts.len(), 8, 24));
    let frame = warp(&features, scale_translate);
    let reference = ReferenceObject::with_features("box", GrayImage::new(100, 80), features);
    let validated: Vec<_> = (0..4).map(|i| Correspondence::new(i, i, 0.0)).collect();
    assert!(
        PresenceDecision::default()
            .decide(&reference, &frame, &validated)
            .is_none()
    );
}

#[test]
fn test_too_few_pairs_for_homography() {
    // 3 matches pass the ratio threshold of a tiny reference but cannot fit H
    let pts = scattered_points(4, 100.0, 80.0, 25);
    let features = feature_set(&pts, random_descriptors(pts.len(), 8, 26));
    let frame = warp(&features, scale_translate);
    let reference = ReferenceObject::with_features("tiny", GrayImage::new(100, 80), features);
    let validated: Vec<_> = (0..3).map(|i| Correspondence::new(i, i, 0.0)).collect();
    assert!(
        PresenceDecision::default()
            .decide(&reference, &frame, &validated)
            .is_none()
    );
}

#[test]
fn test_degenerate_homography_is_absent() {
    // the top edge maps to the line at infinity
    let h = na::Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0);
    assert!(project_outline(&h, 100, 80).is_none());
    assert!(project_outline(&na::Matrix3::from_element(f64::NAN), 100, 80).is_none());
}

#[test]
fn test_identity_outline() {
    let outline = project_outline(&na::Matrix3::identity(), 64, 48).unwrap();
    assert_eq!(
        outline.in_frame(),
        [
            IVec2::new(0, 0),
            IVec2::new(64, 0),
            IVec2::new(64, 48),
            IVec2::new(0, 48)
        ]
    );
}
