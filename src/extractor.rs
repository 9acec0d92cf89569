use image::GrayImage;
use log::trace;

use crate::config::ExtractorConfig;
use crate::features::{Descriptors, FeatureSet, Keypoint};

/// Detects keypoints and computes one fixed-length, Euclidean-comparable
/// descriptor per keypoint.
pub trait FeatureExtractor: Send + Sync {
    fn detect(&self, image: &GrayImage) -> Vec<Keypoint>;

    /// May drop keypoints it cannot describe; the returned set always has one
    /// descriptor per keypoint.
    fn describe(&self, image: &GrayImage, keypoints: Vec<Keypoint>) -> FeatureSet;

    /// Length of every descriptor this extractor produces, when fixed.
    fn descriptor_dim(&self) -> Option<usize> {
        None
    }

    fn extract(&self, image: &GrayImage) -> FeatureSet {
        let keypoints = self.detect(image);
        self.describe(image, keypoints)
    }
}

/// Harris corners described by mean-free, unit-norm intensity patches.
#[derive(Debug, Clone, Default)]
pub struct HarrisExtractor {
    config: ExtractorConfig,
}

impl HarrisExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    fn radius(&self) -> u32 {
        self.config.patch_radius.max(2)
    }

    fn smoothed(&self, image: &GrayImage) -> GrayImage {
        if self.config.blur_sigma > 0.0 {
            image::imageops::blur(image, self.config.blur_sigma)
        } else {
            image.clone()
        }
    }

    /// Harris response det(M) - k trace(M)² with M summed over a 5×5 window.
    fn harris_response(&self, img: &GrayImage) -> Vec<f32> {
        let (w, h) = (img.width() as usize, img.height() as usize);
        let px = |x: usize, y: usize| img.as_raw()[y * w + x] as f32 / 255.0;

        let mut ixx = vec![0.0f32; w * h];
        let mut iyy = vec![0.0f32; w * h];
        let mut ixy = vec![0.0f32; w * h];
        for y in 1..h - 1 {
            for x in 1..w - 1 {
                let gx = px(x + 1, y - 1) + 2.0 * px(x + 1, y) + px(x + 1, y + 1)
                    - px(x - 1, y - 1)
                    - 2.0 * px(x - 1, y)
                    - px(x - 1, y + 1);
                let gy = px(x - 1, y + 1) + 2.0 * px(x, y + 1) + px(x + 1, y + 1)
                    - px(x - 1, y - 1)
                    - 2.0 * px(x, y - 1)
                    - px(x + 1, y - 1);
                let idx = y * w + x;
                ixx[idx] = gx * gx;
                iyy[idx] = gy * gy;
                ixy[idx] = gx * gy;
            }
        }

        let half = 2;
        let mut response = vec![0.0f32; w * h];
        for y in half + 1..h - half - 1 {
            for x in half + 1..w - half - 1 {
                let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
                for by in y - half..=y + half {
                    for bx in x - half..=x + half {
                        let idx = by * w + bx;
                        sxx += ixx[idx];
                        syy += iyy[idx];
                        sxy += ixy[idx];
                    }
                }
                let det = sxx * syy - sxy * sxy;
                let trace = sxx + syy;
                response[y * w + x] = det - self.config.harris_k * trace * trace;
            }
        }
        response
    }
}

impl FeatureExtractor for HarrisExtractor {
    fn detect(&self, image: &GrayImage) -> Vec<Keypoint> {
        let r = self.radius() as usize;
        let (w, h) = (image.width() as usize, image.height() as usize);
        if w < 2 * r + 3 || h < 2 * r + 3 {
            return Vec::new();
        }
        let img = self.smoothed(image);
        let response = self.harris_response(&img);

        let max_response = response.iter().copied().fold(0.0f32, f32::max);
        if max_response <= 0.0 {
            trace!("no corner response");
            return Vec::new();
        }
        let threshold = self.config.quality * max_response;

        let mut keypoints = Vec::new();
        for y in r..h - r {
            for x in r..w - r {
                let v = response[y * w + x];
                if v <= threshold {
                    continue;
                }
                let is_max = (y - 1..=y + 1).all(|ny| {
                    (x - 1..=x + 1).all(|nx| (nx == x && ny == y) || response[ny * w + nx] <= v)
                });
                if is_max {
                    keypoints.push(
                        Keypoint::new(x as f32, y as f32)
                            .with_size(2.0 * r as f32)
                            .with_response(v),
                    );
                }
            }
        }
        keypoints.sort_by(|a, b| b.response.total_cmp(&a.response));
        keypoints.truncate(self.config.max_features);
        trace!("detected {} corners", keypoints.len());
        keypoints
    }

    fn describe(&self, image: &GrayImage, keypoints: Vec<Keypoint>) -> FeatureSet {
        let r = self.radius() as i64;
        let cells = r as usize;
        let dim = cells * cells;
        let img = self.smoothed(image);
        let (w, h) = (img.width() as i64, img.height() as i64);
        let px = |x: i64, y: i64| img.as_raw()[(y * w + x) as usize] as f32;

        let mut kept = Vec::with_capacity(keypoints.len());
        let mut data = Vec::with_capacity(keypoints.len() * dim);
        for kp in keypoints {
            let cx = kp.pt.x.round() as i64;
            let cy = kp.pt.y.round() as i64;
            if cx - r < 0 || cy - r < 0 || cx + r > w || cy + r > h {
                continue;
            }
            // 2×2 block averages over the 2r × 2r patch
            let mut desc = Vec::with_capacity(dim);
            for gy in 0..cells as i64 {
                for gx in 0..cells as i64 {
                    let x = cx - r + 2 * gx;
                    let y = cy - r + 2 * gy;
                    let v = px(x, y) + px(x + 1, y) + px(x, y + 1) + px(x + 1, y + 1);
                    desc.push(v / 4.0);
                }
            }
            let mean = desc.iter().sum::<f32>() / dim as f32;
            desc.iter_mut().for_each(|v| *v -= mean);
            let norm = desc.iter().map(|v| v * v).sum::<f32>().sqrt();
            if norm > 1e-6 {
                desc.iter_mut().for_each(|v| *v /= norm);
            }
            data.extend(desc);
            kept.push(kp);
        }
        FeatureSet::new(kept, Descriptors::new(dim, data))
    }

    fn descriptor_dim(&self) -> Option<usize> {
        let r = self.radius() as usize;
        Some(r * r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiny_image_has_no_corners() {
        let extractor = HarrisExtractor::default();
        assert!(extractor.detect(&GrayImage::new(5, 5)).is_empty());
    }

    #[test]
    fn border_keypoints_are_not_described() {
        let extractor = HarrisExtractor::default();
        let img = GrayImage::new(40, 40);
        let set = extractor.describe(
            &img,
            vec![Keypoint::new(1.0, 1.0), Keypoint::new(20.0, 20.0)],
        );
        assert_eq!(set.len(), 1);
        assert_eq!(set.descriptors().dim(), 64);
        assert_eq!(extractor.descriptor_dim(), Some(64));
    }
}
