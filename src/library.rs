use image::GrayImage;

use crate::error::{RecognitionError, Result};
use crate::extractor::FeatureExtractor;
use crate::features::FeatureSet;

/// A named reference image with its features precomputed at load time.
#[derive(Debug, Clone)]
pub struct ReferenceObject {
    pub name: String,
    pub image: GrayImage,
    pub features: FeatureSet,
}

impl ReferenceObject {
    pub fn new(name: &str, image: GrayImage, extractor: &dyn FeatureExtractor) -> ReferenceObject {
        let features = extractor.extract(&image);
        ReferenceObject::with_features(name, image, features)
    }

    pub fn with_features(name: &str, image: GrayImage, features: FeatureSet) -> ReferenceObject {
        ReferenceObject {
            name: name.to_string(),
            image,
            features,
        }
    }
}

/// Reference objects visited round-robin, one per frame.
#[derive(Debug, Clone)]
pub struct ReferenceLibrary {
    objects: Vec<ReferenceObject>,
    cursor: usize,
}

impl ReferenceLibrary {
    pub fn new(objects: Vec<ReferenceObject>) -> Result<ReferenceLibrary> {
        if objects.is_empty() {
            return Err(RecognitionError::EmptyLibrary);
        }
        Ok(ReferenceLibrary { objects, cursor: 0 })
    }

    pub fn first(&self) -> &ReferenceObject {
        &self.objects[0]
    }

    /// Returns the object under the cursor, then advances the cursor,
    /// wrapping to the first object after the last.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> &ReferenceObject {
        let current = self.cursor;
        self.cursor = (self.cursor + 1) % self.objects.len();
        &self.objects[current]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn get(&self, index: usize) -> Option<&ReferenceObject> {
        self.objects.get(index)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferenceObject> {
        self.objects.iter()
    }
}
