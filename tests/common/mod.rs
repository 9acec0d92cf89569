#![allow(dead_code)]

use glam::Vec2;
use object_recognition::features::{Descriptors, FeatureSet, Keypoint};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Points spread over a `w` × `h` image, the four corners of a 10 px square first.
pub fn scattered_points(n: usize, w: f32, h: f32, seed: u64) -> Vec<Vec2> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut pts = vec![
        Vec2::new(0.0, 0.0),
        Vec2::new(10.0, 0.0),
        Vec2::new(10.0, 10.0),
        Vec2::new(0.0, 10.0),
    ];
    while pts.len() < n {
        pts.push(Vec2::new(
            rng.random_range(0.0..w),
            rng.random_range(0.0..h),
        ));
    }
    pts.truncate(n);
    pts
}

pub fn random_descriptors(n: usize, dim: usize, seed: u64) -> Descriptors {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let data = (0..n * dim).map(|_| rng.random_range(0.0..1.0)).collect();
    Descriptors::new(dim, data)
}

pub fn feature_set(points: &[Vec2], descriptors: Descriptors) -> FeatureSet {
    let keypoints = points.iter().map(|p| Keypoint::new(p.x, p.y)).collect();
    FeatureSet::new(keypoints, descriptors)
}

/// Same descriptors with every keypoint moved by `f`.
pub fn warp(features: &FeatureSet, f: impl Fn(Vec2) -> Vec2) -> FeatureSet {
    let keypoints = features
        .keypoints()
        .iter()
        .map(|kp| {
            let p = f(kp.pt);
            Keypoint::new(p.x, p.y)
        })
        .collect();
    FeatureSet::new(keypoints, features.descriptors().clone())
}

pub fn scale_translate(p: Vec2) -> Vec2 {
    p * 2.0 + Vec2::new(50.0, 30.0)
}
