use std::path::{Path, PathBuf};

use glob::glob;
use image::{GrayImage, ImageReader};
use indicatif::ParallelProgressIterator;
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::error::{RecognitionError, Result};
use crate::extractor::FeatureExtractor;
use crate::features::FeatureSet;
use crate::io::{load_feature_set, save_feature_set};
use crate::library::{ReferenceLibrary, ReferenceObject};

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "tiff"];

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

fn img_filter(rp: glob::GlobResult) -> Option<PathBuf> {
    match rp {
        Ok(p) if p.is_file() && is_image(&p) => Some(p),
        Ok(_) => None,
        Err(e) => {
            warn!("{}", e);
            None
        }
    }
}

/// Sorted image paths matched by `pattern`.
pub fn image_paths(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = glob(pattern)?.filter_map(img_filter).collect();
    paths.sort();
    Ok(paths)
}

fn dir_pattern(dir: &Path) -> String {
    format!("{}/*", glob::Pattern::escape(&dir.to_string_lossy()))
}

pub fn load_gray(path: &Path) -> Result<GrayImage> {
    Ok(ImageReader::open(path)?.decode()?.into_luma8())
}

/// Loads every image in `dir` as a reference object named after its file stem.
///
/// Images that fail to decode are skipped. When `cache_dir` is given the
/// features are read from it if cached, and written to it otherwise.
pub fn load_library(
    dir: &Path,
    extractor: &dyn FeatureExtractor,
    cache_dir: Option<&Path>,
) -> Result<ReferenceLibrary> {
    if !dir.is_dir() {
        return Err(RecognitionError::LibraryNotFound(dir.to_path_buf()));
    }
    let paths = image_paths(&dir_pattern(dir))?;
    info!("loading {} reference images from {}", paths.len(), dir.display());

    let objects: Vec<ReferenceObject> = paths
        .par_iter()
        .progress_count(paths.len() as u64)
        .filter_map(|path| load_object(path, extractor, cache_dir))
        .collect();

    for obj in &objects {
        debug!("{}: {} keypoints", obj.name, obj.features.len());
    }
    ReferenceLibrary::new(objects)
}

/// Cached descriptors whose length differs from what `extractor` produces.
fn is_stale(features: &FeatureSet, extractor: &dyn FeatureExtractor) -> bool {
    match extractor.descriptor_dim() {
        Some(dim) => !features.is_empty() && features.descriptors().dim() != dim,
        None => false,
    }
}

fn load_object(
    path: &Path,
    extractor: &dyn FeatureExtractor,
    cache_dir: Option<&Path>,
) -> Option<ReferenceObject> {
    let name = path.file_stem()?.to_string_lossy().to_string();
    let image = match load_gray(path) {
        Ok(img) => img,
        Err(e) => {
            warn!("skipping {}: {}", path.display(), e);
            return None;
        }
    };
    let Some(cache) = cache_dir else {
        return Some(ReferenceObject::new(&name, image, extractor));
    };
    match load_feature_set(cache, &name) {
        Ok(Some(features)) if is_stale(&features, extractor) => {
            warn!(
                "cache of {} has {}-long descriptors, extracting again",
                name,
                features.descriptors().dim()
            );
        }
        Ok(Some(features)) => return Some(ReferenceObject::with_features(&name, image, features)),
        Ok(None) => {}
        Err(e) => warn!("ignoring cache of {}: {}", name, e),
    }
    let obj = ReferenceObject::new(&name, image, extractor);
    if let Err(e) = save_feature_set(cache, &name, &obj.features) {
        warn!("cannot cache {}: {}", name, e);
    }
    Some(obj)
}

/// Frames read one at a time in sorted path order. Frames that fail to decode
/// are logged and skipped.
pub struct FrameSequence {
    paths: std::vec::IntoIter<PathBuf>,
}

impl FrameSequence {
    pub fn from_glob(pattern: &str) -> Result<FrameSequence> {
        Ok(FrameSequence::from_paths(image_paths(pattern)?))
    }

    pub fn from_dir(dir: &Path) -> Result<FrameSequence> {
        if !dir.is_dir() {
            return Err(RecognitionError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("frame directory not found: {}", dir.display()),
            )));
        }
        FrameSequence::from_glob(&dir_pattern(dir))
    }

    pub fn from_paths(paths: Vec<PathBuf>) -> FrameSequence {
        FrameSequence {
            paths: paths.into_iter(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.paths.len()
    }
}

impl Iterator for FrameSequence {
    type Item = (PathBuf, GrayImage);

    fn next(&mut self) -> Option<Self::Item> {
        for path in self.paths.by_ref() {
            match load_gray(&path) {
                Ok(img) => return Some((path, img)),
                Err(e) => warn!("skipping frame {}: {}", path.display(), e),
            }
        }
        None
    }
}
