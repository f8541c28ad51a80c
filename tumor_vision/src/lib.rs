// THEORY:
// This file is the entry point for the `tumor_vision` library crate.
//
// The two pure building blocks are the metrics layer (one detector box in,
// width/height/area/severity out) and the heatmap layer (one scan plus all its
// boxes in, a colourised attention overlay out). The `pipeline` module composes
// them behind a `Detector`, and `parallel_pipeline` runs that composition over
// many scans at once. The supporting modules (tiling, blob finding, colour
// tables, image I/O) live under `core_modules`.

pub mod core_modules;
pub mod detector;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use core_modules::bounding_box::BoundingBox;
pub use core_modules::heatmap::{build_heatmap, build_heatmap_from_raw};
pub use core_modules::intensity_detector::{DetectorConfig, IntensityDetector};
pub use core_modules::tumor_metrics::{Severity, TumorMetrics, compute_metrics};
pub use detector::{Detection, Detector, StaticDetector};
pub use error::VisionError;
