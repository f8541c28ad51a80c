// THEORY:
// `IntensityDetector` is a classical, model-free detector for bright regions in
// a scan. It lets the whole analysis pipeline run without an external network:
//
// 1.  **Intensity**: RGB → luma.
// 2.  **Tiling**: the `GridManager` pools the scan into tiles and scores each
//     tile against the scene (see `SmartChunk`).
// 3.  **Grouping**: the blob detector joins elevated tiles into regions.
// 4.  **Reporting**: every region large enough becomes a `Detection` whose box
//     is the region's tile extent in pixel space and whose confidence grows
//     with how strongly the region stands out: `s / (s + 3)` for mean score `s`.

use crate::core_modules::blob_detector::blob_detector;
use crate::core_modules::grid_manager::GridManager;
use crate::core_modules::pixel::pixel::to_luma_image;
use crate::detector::{Detection, Detector};
use crate::error::VisionError;
use image::RgbImage;
use log::debug;

/// Mean score at which a region's confidence reaches one half.
const HALF_CONFIDENCE_SCORE: f64 = 3.0;

/// Tunable behaviour of the intensity detector.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    /// Side of a square tile in pixels.
    pub chunk_size: u32,
    /// Minimum significance score (Z-score against the scene) for a tile to be
    /// considered part of a region.
    pub significance_threshold: f64,
    /// Regions with fewer tiles than this are ignored.
    pub min_blob_chunks: usize,
    /// Label attached to every detection.
    pub label: String,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            chunk_size: 16,
            significance_threshold: 2.0,
            min_blob_chunks: 1,
            label: "Tumor".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IntensityDetector {
    config: DetectorConfig,
}

impl IntensityDetector {
    pub fn new(config: DetectorConfig) -> Result<Self, VisionError> {
        if config.chunk_size == 0 {
            return Err(VisionError::InvalidConfig("chunk_size must be at least 1".to_string()));
        }
        if !(config.significance_threshold > 0.0) {
            return Err(VisionError::InvalidConfig(format!(
                "significance_threshold must be positive, got {}",
                config.significance_threshold
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }
}

fn confidence_from_score(score: f64) -> f32 {
    (score / (score + HALF_CONFIDENCE_SCORE)).clamp(0.0, 1.0) as f32
}

impl Detector for IntensityDetector {
    fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>, VisionError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(VisionError::invalid_image(format!(
                "image must be non-empty, got {width}x{height}"
            )));
        }

        let gray = to_luma_image(image);
        let grid = GridManager::new(width, height, self.config.chunk_size);
        let status_map = grid.process_image(&gray, self.config.significance_threshold);
        let blobs = blob_detector::find_blobs(&status_map, grid.grid_width(), grid.grid_height());
        debug!("Intensity detector found {} candidate region(s)", blobs.len());
        for blob in &blobs {
            let (center_x, center_y) = blob.center_of_mass;
            debug!(
                "Region {}: {} tile(s), mean score {:.2}, centre ({:.1}, {:.1})",
                blob.id, blob.size_in_chunks, blob.average_score, center_x, center_y
            );
        }

        let detections = blobs
            .into_iter()
            .filter(|blob| blob.size_in_chunks >= self.config.min_blob_chunks)
            .map(|blob| {
                let (top_left, bottom_right) = blob.bounding_box;
                Detection::new(
                    self.config.label.clone(),
                    confidence_from_score(blob.average_score),
                    grid.cells_to_pixels(top_left, bottom_right),
                )
            })
            .collect();
        Ok(detections)
    }
}
