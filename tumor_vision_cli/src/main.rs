// THEORY:
// Command-line front end for batch analysis. It resolves the input (one scan or
// a folder of scans), runs them through a `BatchAnalyzer`, and writes a heatmap
// overlay, an outlined detection image and a JSON prediction report per scan.
// Every option can also be set through a `TV_*` environment variable; log
// verbosity follows `RUST_LOG`.

mod report_writer;

use anyhow::{Context, Result, bail};
use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};
use report_writer::{OverlayFormat, collect_inputs, describe, write_outputs};
use std::path::PathBuf;
use std::sync::Arc;
use tumor_vision::parallel_pipeline::BatchAnalyzer;
use tumor_vision::pipeline::{AnalysisPipeline, PipelineConfig};
use tumor_vision::{DetectorConfig, IntensityDetector};

#[derive(Debug, Parser)]
#[command(name = "tumor_vision_cli", version, about = "Brain-scan tumour analysis: detections, size metrics and heatmap overlays")]
struct Args {
    /// A .jpg/.jpeg/.png scan, or a folder of them.
    input: PathBuf,

    /// Folder that receives `<stem>_heatmap.<ext>`, `<stem>_detections.<ext>` and
    /// `<stem>.json` per scan.
    output_dir: PathBuf,

    /// Detections below this confidence are discarded.
    #[arg(long, env = "TV_CONF_THRESHOLD", default_value_t = 0.25)]
    conf_threshold: f32,

    /// Edge length of the square tiles the detector scores, in pixels.
    #[arg(long, env = "TV_CHUNK_SIZE", default_value_t = 16)]
    chunk_size: u32,

    /// Z-score a tile needs before it counts as elevated.
    #[arg(long, env = "TV_SIGNIFICANCE_THRESHOLD", default_value_t = 2.0)]
    significance_threshold: f64,

    /// Smallest region, in tiles, reported as a detection.
    #[arg(long, env = "TV_MIN_BLOB_CHUNKS", default_value_t = 1)]
    min_blob_chunks: usize,

    /// Class name attached to every detection.
    #[arg(long, env = "TV_LABEL", default_value = "Tumor")]
    label: String,

    /// Worker count; defaults to the number of logical CPUs.
    #[arg(long, env = "TV_WORKERS")]
    workers: Option<usize>,

    #[arg(long, env = "TV_JPEG_QUALITY", default_value_t = 90, value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,

    #[arg(long, env = "TV_OVERLAY_FORMAT", value_enum, default_value_t = OverlayFormat::Jpeg)]
    overlay_format: OverlayFormat,
}

impl Args {
    fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            chunk_size: self.chunk_size,
            significance_threshold: self.significance_threshold,
            min_blob_chunks: self.min_blob_chunks,
            label: self.label.clone(),
        }
    }

    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            conf_threshold: self.conf_threshold,
            jpeg_quality: self.jpeg_quality,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    run(args).await
}

async fn run(args: Args) -> Result<()> {
    let inputs = collect_inputs(&args.input)?;
    if inputs.is_empty() {
        warn!("No images found in {}", args.input.display());
        return Ok(());
    }

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("creating {}", args.output_dir.display()))?;

    let detector = IntensityDetector::new(args.detector_config())?;
    let pipeline = Arc::new(AnalysisPipeline::new(detector, args.pipeline_config())?);
    let batch = BatchAnalyzer::new(Arc::clone(&pipeline), args.workers);
    info!(
        "Analysing {} image(s) with {} worker(s)",
        inputs.len(),
        batch.worker_count()
    );

    let total = inputs.len();
    let items = batch.analyze_all(inputs).await;
    batch.shutdown().await;

    let mut failures = 0;
    for item in items {
        let name = item.source.display();
        match item.result {
            Ok(report) => {
                info!("{name}:");
                for line in describe(&report) {
                    info!("  {line}");
                }
                match write_outputs(
                    &args.output_dir,
                    &item.source,
                    &report,
                    args.overlay_format,
                    pipeline.as_ref(),
                ) {
                    Ok(written) => info!(
                        "  Saved {}, {} and {}",
                        written.overlay.display(),
                        written.annotated.display(),
                        written.report.display()
                    ),
                    Err(err) => {
                        error!("{name}: {err:#}");
                        failures += 1;
                    }
                }
            }
            Err(err) => {
                error!("{name}: {err}");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {total} image(s) failed");
    }
    info!("Outputs saved to {}", args.output_dir.display());
    Ok(())
}
