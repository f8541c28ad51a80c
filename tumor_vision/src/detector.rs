// THEORY:
// The detector is the one collaborator the analysis layers do not own. Whatever
// produces the boxes (a trained network running elsewhere, the built-in
// intensity heuristic, or a fixed list in a test) only has to offer one
// capability: given an image, return `(label, confidence, box)` triples. The
// metrics and heatmap layers never see anything but those triples.

use crate::core_modules::bounding_box::BoundingBox;
use crate::error::VisionError;
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// One labelled, scored region reported by a detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    /// Detector confidence in `0.0..=1.0`.
    pub confidence: f32,
    pub bounding_box: BoundingBox,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32, bounding_box: BoundingBox) -> Self {
        Self {
            label: label.into(),
            confidence,
            bounding_box,
        }
    }
}

/// Anything that can find regions of interest in an image.
pub trait Detector: Send + Sync {
    fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>, VisionError>;
}

impl<D: Detector + ?Sized> Detector for Box<D> {
    fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>, VisionError> {
        (**self).detect(image)
    }
}

/// Reports the same detections for every image.
#[derive(Debug, Clone, Default)]
pub struct StaticDetector {
    detections: Vec<Detection>,
}

impl StaticDetector {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }
}

impl Detector for StaticDetector {
    fn detect(&self, _image: &RgbImage) -> Result<Vec<Detection>, VisionError> {
        Ok(self.detections.clone())
    }
}
