use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use std::path::{Path, PathBuf};
use tumor_vision::Detector;
use tumor_vision::core_modules::utils::image_helper::image_helper::{discover_images, encode_png, is_image_path};
use tumor_vision::pipeline::{AnalysisPipeline, Report};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OverlayFormat {
    Jpeg,
    Png,
}

impl OverlayFormat {
    fn extension(self) -> &'static str {
        match self {
            OverlayFormat::Jpeg => "jpg",
            OverlayFormat::Png => "png",
        }
    }
}

/// Files written for one analysed scan.
#[derive(Debug)]
pub struct WrittenOutputs {
    pub overlay: PathBuf,
    pub annotated: PathBuf,
    pub report: PathBuf,
}

/// A single image file, or every image directly inside a folder.
pub fn collect_inputs(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_dir() {
        return discover_images(input).with_context(|| format!("scanning {}", input.display()));
    }
    if !input.is_file() {
        bail!("input {} does not exist", input.display());
    }
    if !is_image_path(input) {
        bail!("input {} is not a .jpg, .jpeg or .png file", input.display());
    }
    Ok(vec![input.to_path_buf()])
}

/// Writes `<stem>_heatmap.<ext>`, `<stem>_detections.<ext>` and `<stem>.json`
/// into `output_dir`. JPEG output uses the pipeline's configured quality.
pub fn write_outputs<D: Detector>(
    output_dir: &Path,
    source: &Path,
    report: &Report,
    format: OverlayFormat,
    pipeline: &AnalysisPipeline<D>,
) -> Result<WrittenOutputs> {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scan".to_string());

    let (overlay_bytes, annotated_bytes) = match format {
        OverlayFormat::Jpeg => (pipeline.encode_overlay(report)?, pipeline.encode_annotated(report)?),
        OverlayFormat::Png => (encode_png(report.overlay())?, encode_png(report.annotated())?),
    };
    let overlay = output_dir.join(format!("{stem}_heatmap.{}", format.extension()));
    std::fs::write(&overlay, overlay_bytes).with_context(|| format!("writing {}", overlay.display()))?;
    let annotated = output_dir.join(format!("{stem}_detections.{}", format.extension()));
    std::fs::write(&annotated, annotated_bytes).with_context(|| format!("writing {}", annotated.display()))?;

    let report_path = output_dir.join(format!("{stem}.json"));
    let json = serde_json::to_vec_pretty(&report.summary())?;
    std::fs::write(&report_path, json).with_context(|| format!("writing {}", report_path.display()))?;

    Ok(WrittenOutputs {
        overlay,
        annotated,
        report: report_path,
    })
}

/// Human-readable lines describing a report.
pub fn describe(report: &Report) -> Vec<String> {
    if !report.tumor_detected() {
        return vec!["No tumor detected".to_string()];
    }
    let mut lines = Vec::new();
    for finding in report.findings() {
        let metrics = &finding.metrics;
        lines.push(format!(
            "✔ {} - Confidence: {:.2}",
            finding.detection.label, finding.detection.confidence
        ));
        lines.push(format!("   Width: {:.1}px  Height: {:.1}px", metrics.width, metrics.height));
        lines.push(format!("   Area: {:.1}px²  Severity: {}", metrics.area, metrics.severity));
    }
    lines
}
