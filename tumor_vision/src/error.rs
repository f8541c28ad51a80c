use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the analysis layers. "No tumor detected" is never an
/// error: it is a successful `Report::NoTumorDetected`.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Invalid image: {reason}")]
    InvalidImage { reason: String },

    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Detector failed: {0}")]
    Detector(String),

    #[error("Worker pool error: {0}")]
    WorkerPool(&'static str),
}

impl VisionError {
    pub fn invalid_image(reason: impl Into<String>) -> Self {
        Self::InvalidImage {
            reason: reason.into(),
        }
    }
}
