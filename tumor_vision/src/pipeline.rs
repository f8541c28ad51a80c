// THEORY:
// The `pipeline` module is the top-level, single-image API. It wires the
// detector, the metrics layer and the heatmap layer into one call and packages
// the outcome as a `Report`.
//
// Flow for one scan:
// 1.  decode (bytes or file) into RGB,
// 2.  run the detector and drop detections below the confidence threshold,
// 3.  compute `TumorMetrics` for every remaining box (independently),
// 4.  build one heatmap overlay from the image and all remaining boxes,
// 5.  outline the remaining boxes on a copy of the image for the detection view.
//
// "Nothing found" and "could not analyse" are different outcomes:
// the first is `Ok(Report::NoTumorDetected { .. })`, the second is an `Err`.

use crate::core_modules::annotate::draw_findings;
use crate::core_modules::heatmap::build_heatmap;
use crate::core_modules::tumor_metrics::{TumorMetrics, compute_metrics};
use crate::core_modules::utils::image_helper::image_helper::{decode_rgb, encode_jpeg, load_rgb};
use crate::detector::{Detection, Detector};
use crate::error::VisionError;
use image::RgbImage;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;

// Re-export key data structures for the public API.
pub use crate::core_modules::bounding_box::BoundingBox;
pub use crate::core_modules::tumor_metrics::Severity;

/// Configuration for the AnalysisPipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Detections scoring below this are discarded before any analysis.
    pub conf_threshold: f32,
    /// Quality used when the overlay is encoded as JPEG (1..=100).
    pub jpeg_quality: u8,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            conf_threshold: 0.25,
            jpeg_quality: 90,
        }
    }
}

/// A kept detection and the measurements derived from its box.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub detection: Detection,
    pub metrics: TumorMetrics,
}

/// The detailed data package for a scan with at least one finding.
#[derive(Debug, Clone)]
pub struct FindingsData {
    pub findings: Vec<Finding>,
    pub overlay: RgbImage,
    /// The scan with every finding's box outlined.
    pub annotated: RgbImage,
}

/// The primary output of the pipeline for a single scan.
#[derive(Debug, Clone)]
pub enum Report {
    NoTumorDetected { overlay: RgbImage, annotated: RgbImage },
    TumorDetected(FindingsData),
}

/// Serialised form of one finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "class")]
    pub label: String,
    /// Rounded to 4 decimal places.
    pub confidence: f32,
    /// `[x1, y1, x2, y2]`, rounded to 2 decimal places.
    #[serde(rename = "box")]
    pub bounding_box: [f64; 4],
    pub metrics: TumorMetrics,
}

/// Serialised form of a whole report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSummary {
    pub predictions: Vec<Prediction>,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

impl From<&Finding> for Prediction {
    fn from(finding: &Finding) -> Self {
        let bbox = finding.detection.bounding_box.to_array().map(|v| round_to(v, 2));
        Self {
            label: finding.detection.label.clone(),
            confidence: round_to(finding.detection.confidence as f64, 4) as f32,
            bounding_box: bbox,
            metrics: finding.metrics,
        }
    }
}

impl Report {
    pub fn overlay(&self) -> &RgbImage {
        match self {
            Report::NoTumorDetected { overlay, .. } => overlay,
            Report::TumorDetected(data) => &data.overlay,
        }
    }

    /// The detection view: the scan with outlined boxes, or the plain scan
    /// when nothing was found.
    pub fn annotated(&self) -> &RgbImage {
        match self {
            Report::NoTumorDetected { annotated, .. } => annotated,
            Report::TumorDetected(data) => &data.annotated,
        }
    }

    pub fn findings(&self) -> &[Finding] {
        match self {
            Report::NoTumorDetected { .. } => &[],
            Report::TumorDetected(data) => &data.findings,
        }
    }

    pub fn tumor_detected(&self) -> bool {
        matches!(self, Report::TumorDetected(_))
    }

    pub fn predictions(&self) -> Vec<Prediction> {
        self.findings().iter().map(Prediction::from).collect()
    }

    pub fn summary(&self) -> PredictionSummary {
        PredictionSummary {
            predictions: self.predictions(),
        }
    }

    /// The overlay re-encoded as JPEG, ready to be written or downloaded.
    pub fn overlay_jpeg(&self, quality: u8) -> Result<Vec<u8>, VisionError> {
        encode_jpeg(self.overlay(), quality)
    }
}

/// Single-scan analysis: detection, metrics and heatmap.
pub struct AnalysisPipeline<D: Detector> {
    detector: D,
    config: PipelineConfig,
}

impl<D: Detector> AnalysisPipeline<D> {
    pub fn new(detector: D, config: PipelineConfig) -> Result<Self, VisionError> {
        if !(0.0..=1.0).contains(&config.conf_threshold) {
            return Err(VisionError::InvalidConfig(format!(
                "conf_threshold must be within 0..=1, got {}",
                config.conf_threshold
            )));
        }
        if !(1..=100).contains(&config.jpeg_quality) {
            return Err(VisionError::InvalidConfig(format!(
                "jpeg_quality must be within 1..=100, got {}",
                config.jpeg_quality
            )));
        }
        Ok(Self { detector, config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn analyze(&self, image: &RgbImage) -> Result<Report, VisionError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(VisionError::invalid_image(format!(
                "image must be non-empty, got {width}x{height}"
            )));
        }

        // Stage 1: Detection
        let detections = self.detector.detect(image)?;
        let total = detections.len();
        let kept: Vec<Detection> = detections
            .into_iter()
            .filter(|d| d.confidence >= self.config.conf_threshold)
            .collect();
        debug!(
            "Kept {} of {} detection(s) at confidence >= {}",
            kept.len(),
            total,
            self.config.conf_threshold
        );

        // Stage 2: Metrics, one box at a time
        let findings: Vec<Finding> = kept
            .into_iter()
            .map(|detection| {
                let metrics = compute_metrics(&detection.bounding_box);
                Finding { detection, metrics }
            })
            .collect();

        // Stage 3: Heatmap over all boxes
        let boxes: Vec<BoundingBox> = findings.iter().map(|f| f.detection.bounding_box).collect();
        let overlay = build_heatmap(image, &boxes)?;
        let annotated = draw_findings(image, &findings);

        if findings.is_empty() {
            Ok(Report::NoTumorDetected { overlay, annotated })
        } else {
            Ok(Report::TumorDetected(FindingsData {
                findings,
                overlay,
                annotated,
            }))
        }
    }

    /// The report's overlay as JPEG at the configured quality.
    pub fn encode_overlay(&self, report: &Report) -> Result<Vec<u8>, VisionError> {
        report.overlay_jpeg(self.config.jpeg_quality)
    }

    /// The report's detection view as JPEG at the configured quality.
    pub fn encode_annotated(&self, report: &Report) -> Result<Vec<u8>, VisionError> {
        encode_jpeg(report.annotated(), self.config.jpeg_quality)
    }

    /// Analyses an encoded image (JPEG, PNG, ...).
    pub fn analyze_bytes(&self, bytes: &[u8]) -> Result<Report, VisionError> {
        let image = decode_rgb(bytes)?;
        self.analyze(&image)
    }

    pub fn analyze_path(&self, path: &Path) -> Result<Report, VisionError> {
        let image = load_rgb(path)?;
        let report = self.analyze(&image)?;
        info!(
            "Analyzed {}: {} finding(s)",
            path.display(),
            report.findings().len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::utils::image_helper::image_helper::encode_png;
    use crate::detector::StaticDetector;
    use image::Rgb;

    fn scan() -> RgbImage {
        RgbImage::from_fn(64, 48, |x, y| Rgb([(x * 4) as u8, (y * 5) as u8, 90]))
    }

    fn pipeline(detections: Vec<Detection>) -> AnalysisPipeline<StaticDetector> {
        AnalysisPipeline::new(StaticDetector::new(detections), PipelineConfig::default()).unwrap()
    }

    #[test]
    fn low_confidence_detections_are_dropped() {
        let pipeline = pipeline(vec![
            Detection::new("Glioma", 0.9, BoundingBox::new(10.0, 20.0, 110.0, 120.0)),
            Detection::new("Pituitary", 0.1, BoundingBox::new(0.0, 0.0, 5.0, 5.0)),
            Detection::new("Meningioma", 0.25, BoundingBox::new(0.0, 0.0, 40.0, 50.0)),
        ]);
        let report = pipeline.analyze(&scan()).unwrap();

        assert!(report.tumor_detected());
        let labels: Vec<&str> = report
            .findings()
            .iter()
            .map(|f| f.detection.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Glioma", "Meningioma"]);
        assert_eq!(report.findings()[0].metrics.severity, Severity::Large);
        assert_eq!(report.findings()[1].metrics.severity, Severity::Medium);
    }

    #[test]
    fn nothing_found_is_not_an_error() {
        let pipeline = pipeline(vec![Detection::new(
            "Glioma",
            0.05,
            BoundingBox::new(1.0, 1.0, 9.0, 9.0),
        )]);
        let image = scan();
        let report = pipeline.analyze(&image).unwrap();

        assert!(!report.tumor_detected());
        assert!(report.findings().is_empty());
        assert!(report.predictions().is_empty());
        // No boxes survived, so the heatmap is unmasked.
        assert_eq!(*report.overlay(), build_heatmap(&image, &[]).unwrap());
    }

    #[test]
    fn overlay_focuses_on_kept_boxes() {
        let kept = BoundingBox::new(8.0, 8.0, 24.0, 24.0);
        let pipeline = pipeline(vec![Detection::new("Glioma", 0.8, kept)]);
        let image = scan();
        let report = pipeline.analyze(&image).unwrap();
        assert_eq!(*report.overlay(), build_heatmap(&image, &[kept]).unwrap());
    }

    #[test]
    fn annotated_view_outlines_kept_boxes() {
        let kept = BoundingBox::new(8.0, 8.0, 24.0, 24.0);
        let populated = pipeline(vec![
            Detection::new("Glioma", 0.8, kept),
            Detection::new("Pituitary", 0.1, BoundingBox::new(30.0, 30.0, 40.0, 40.0)),
        ]);
        let image = scan();
        let report = populated.analyze(&image).unwrap();
        assert_eq!(*report.annotated(), draw_findings(&image, report.findings()));
        assert_ne!(report.annotated().get_pixel(8, 8), image.get_pixel(8, 8));
        assert_eq!(report.annotated().get_pixel(30, 30), image.get_pixel(30, 30));

        let empty = pipeline(Vec::new()).analyze(&image).unwrap();
        assert_eq!(*empty.annotated(), image);
    }

    #[test]
    fn predictions_are_rounded() {
        let pipeline = pipeline(vec![Detection::new(
            "Glioma",
            0.876_54,
            BoundingBox::new(10.123, 20.456, 30.789, 40.001),
        )]);
        let summary = pipeline.analyze(&scan()).unwrap().summary();
        let prediction = &summary.predictions[0];
        assert_eq!(prediction.confidence, 0.8765);
        assert_eq!(prediction.bounding_box, [10.12, 20.46, 30.79, 40.0]);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["predictions"][0]["class"], "Glioma");
        assert_eq!(json["predictions"][0]["box"][1], 20.46);
        assert_eq!(json["predictions"][0]["metrics"]["severity"], "Small");
    }

    #[test]
    fn encoded_images_are_decoded() {
        let pipeline = pipeline(Vec::new());
        let bytes = encode_png(&scan()).unwrap();
        let report = pipeline.analyze_bytes(&bytes).unwrap();
        assert_eq!(report.overlay().dimensions(), (64, 48));
        assert!(!report.overlay_jpeg(80).unwrap().is_empty());
    }

    #[test]
    fn undecodable_input_is_an_error_not_an_empty_result() {
        let pipeline = pipeline(Vec::new());
        assert!(matches!(
            pipeline.analyze_bytes(b"not an image"),
            Err(VisionError::Decode(_))
        ));
    }

    #[test]
    fn detector_failures_propagate() {
        struct Broken;
        impl Detector for Broken {
            fn detect(&self, _image: &RgbImage) -> Result<Vec<Detection>, VisionError> {
                Err(VisionError::Detector("inference failed".into()))
            }
        }
        let pipeline = AnalysisPipeline::new(Broken, PipelineConfig::default()).unwrap();
        assert!(matches!(
            pipeline.analyze(&scan()),
            Err(VisionError::Detector(_))
        ));
    }

    #[test]
    fn threshold_outside_unit_range_is_rejected() {
        let config = PipelineConfig {
            conf_threshold: 1.5,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            AnalysisPipeline::new(StaticDetector::default(), config),
            Err(VisionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn overlay_uses_configured_jpeg_quality() {
        let image = RgbImage::from_fn(64, 64, |x, y| {
            Rgb([((x * 31) ^ (y * 17)) as u8, ((x * y) % 251) as u8, ((x + 3 * y) * 5) as u8])
        });
        let encode_at = |jpeg_quality: u8| {
            let config = PipelineConfig {
                jpeg_quality,
                ..PipelineConfig::default()
            };
            let pipeline = AnalysisPipeline::new(StaticDetector::default(), config).unwrap();
            let report = pipeline.analyze(&image).unwrap();
            (
                pipeline.encode_overlay(&report).unwrap(),
                pipeline.encode_annotated(&report).unwrap(),
            )
        };
        let (coarse, _) = encode_at(10);
        let (fine, fine_annotated) = encode_at(95);
        assert!(coarse.len() < fine.len());
        assert_eq!(fine, encode_at(95).0);
        assert_eq!(decode_rgb(&fine_annotated).unwrap().dimensions(), (64, 64));
    }

    #[test]
    fn jpeg_quality_outside_range_is_rejected() {
        let config = PipelineConfig {
            jpeg_quality: 0,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            AnalysisPipeline::new(StaticDetector::default(), config),
            Err(VisionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn files_are_analyzed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        std::fs::write(&path, encode_png(&scan()).unwrap()).unwrap();
        let report = pipeline(Vec::new()).analyze_path(&path).unwrap();
        assert_eq!(report.overlay().dimensions(), (64, 48));
    }
}
