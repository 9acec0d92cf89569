use criterion::{Criterion, black_box, criterion_group, criterion_main};
use glam::DVec2;
use nalgebra as na;
use object_recognition::features::{Descriptors, FeatureSet, Keypoint};
use object_recognition::geometry::{PointPair, Ransac, fit_homography};
use object_recognition::matcher::{CorrespondenceMatcher, knn_match};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn random_features(n: usize, dim: usize, rng: &mut ChaCha8Rng) -> FeatureSet {
    let keypoints = (0..n)
        .map(|_| Keypoint::new(rng.random_range(0.0..640.0), rng.random_range(0.0..480.0)))
        .collect();
    let data = (0..n * dim).map(|_| rng.random_range(0.0..1.0)).collect();
    FeatureSet::new(keypoints, Descriptors::new(dim, data))
}

fn bench_knn(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let a = random_features(500, 64, &mut rng);
    let b = random_features(500, 64, &mut rng);

    c.bench_function("knn_match_500x500", |bench| {
        bench.iter(|| knn_match(black_box(a.descriptors()), black_box(b.descriptors()), 2))
    });
}

fn bench_match_features(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let reference = random_features(300, 64, &mut rng);
    let keypoints = reference
        .keypoints()
        .iter()
        .map(|kp| Keypoint::new(kp.pt.x * 1.5 + 20.0, kp.pt.y * 1.5 - 10.0))
        .collect();
    let frame = FeatureSet::new(keypoints, reference.descriptors().clone());
    let matcher = CorrespondenceMatcher::default();

    c.bench_function("match_features_300", |bench| {
        bench.iter(|| matcher.match_features(black_box(&reference), black_box(&frame)))
    });
}

fn bench_fit_homography(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let h = na::Matrix3::new(1.1, 0.05, 20.0, -0.02, 0.95, 8.0, 1e-4, 0.0, 1.0);
    let pairs: Vec<PointPair> = (0..200)
        .map(|i| {
            let p = DVec2::new(rng.random_range(0.0..640.0), rng.random_range(0.0..480.0));
            let q = h * na::Vector3::new(p.x, p.y, 1.0);
            let mut q = DVec2::new(q.x / q.z, q.y / q.z);
            if i % 5 == 0 {
                q += DVec2::new(rng.random_range(-80.0..80.0), rng.random_range(-80.0..80.0));
            }
            (p, q)
        })
        .collect();
    let ransac = Ransac::default();

    c.bench_function("fit_homography_200", |bench| {
        bench.iter(|| fit_homography(black_box(&pairs), &ransac))
    });
}

criterion_group!(benches, bench_knn, bench_match_features, bench_fit_homography);
criterion_main!(benches);
