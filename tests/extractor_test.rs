use image::{GrayImage, Luma};
use object_recognition::config::ExtractorConfig;
use object_recognition::extractor::{FeatureExtractor, HarrisExtractor};
use object_recognition::features::euclidean_distance;

fn checkerboard(w: u32, h: u32, cell: u32) -> GrayImage {
    GrayImage::from_fn(w, h, |x, y| {
        if ((x / cell) + (y / cell)) % 2 == 0 {
            Luma([30])
        } else {
            Luma([220])
        }
    })
}

#[test]
fn test_blank_image_has_no_features() {
    let extractor = HarrisExtractor::default();
    let features = extractor.extract(&GrayImage::from_pixel(64, 64, Luma([128])));
    assert!(features.is_empty());
}

#[test]
fn test_checkerboard_features() {
    let extractor = HarrisExtractor::default();
    let img = checkerboard(96, 80, 12);
    let features = extractor.extract(&img);

    assert!(!features.is_empty());
    assert_eq!(features.keypoints().len(), features.descriptors().len());
    assert_eq!(features.descriptors().dim(), 64);

    let r = extractor.config().patch_radius as f32;
    for kp in features.keypoints() {
        assert!(kp.pt.x >= r && kp.pt.x <= 96.0 - r);
        assert!(kp.pt.y >= r && kp.pt.y <= 80.0 - r);
        assert_eq!(kp.size, 2.0 * r);
    }
    for row in features.descriptors().rows() {
        let norm = row.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4, "norm {}", norm);
        let mean = row.iter().sum::<f32>() / row.len() as f32;
        assert!(mean.abs() < 1e-4);
    }
}

#[test]
fn test_max_features() {
    let extractor = HarrisExtractor::new(ExtractorConfig {
        max_features: 5,
        ..Default::default()
    });
    let keypoints = extractor.detect(&checkerboard(128, 128, 10));
    assert_eq!(keypoints.len(), 5);
    for pair in keypoints.windows(2) {
        assert!(pair[0].response >= pair[1].response);
    }
}

#[test]
fn test_shifted_image_gives_matching_descriptors() {
    let extractor = HarrisExtractor::default();
    let img = checkerboard(96, 96, 16);
    let shifted = GrayImage::from_fn(96, 96, |x, y| {
        if x >= 4 && y >= 2 {
            *img.get_pixel(x - 4, y - 2)
        } else {
            Luma([30])
        }
    });
    let a = extractor.extract(&img);
    let b = extractor.extract(&shifted);
    // away from the border the blur sees the same pixels in both images
    let i = a
        .keypoints()
        .iter()
        .position(|k| (24.0..=64.0).contains(&k.pt.x) && (24.0..=64.0).contains(&k.pt.y))
        .expect("interior corner");
    let kp = a.keypoints()[i];
    let desc = a.descriptors().row(i);

    let moved = b
        .keypoints()
        .iter()
        .position(|k| k.pt.x == kp.pt.x + 4.0 && k.pt.y == kp.pt.y + 2.0);
    let j = moved.expect("shifted corner");
    let d = euclidean_distance(desc, b.descriptors().row(j));
    assert!(d < 1e-3, "distance {}", d);
}
