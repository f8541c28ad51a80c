// THEORY:
// The metrics layer turns a single detector box into a small, human-readable
// summary: how wide, how tall, how large, and a coarse severity bucket. It is a
// stateless utility with no failure path; every finite box yields a result.
//
// Area is measured in pixel² and is purely a relative size proxy. No DPI or
// physical scale is applied. The severity cut points are fixed policy and use
// strict `<` at each boundary, so an area of exactly 2000 is `Medium` and an
// area of exactly 8000 is `Large`.

use crate::core_modules::bounding_box::BoundingBox;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Areas strictly below this are `Small`.
pub const SMALL_AREA_LIMIT: f64 = 2000.0;
/// Areas strictly below this (and not `Small`) are `Medium`.
pub const MEDIUM_AREA_LIMIT: f64 = 8000.0;

/// Coarse size classification derived from bounding-box area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Small,
    Medium,
    Large,
}

impl Severity {
    pub fn from_area(area: f64) -> Self {
        if area < SMALL_AREA_LIMIT {
            Severity::Small
        } else if area < MEDIUM_AREA_LIMIT {
            Severity::Medium
        } else {
            Severity::Large
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Small => "Small",
            Severity::Medium => "Medium",
            Severity::Large => "Large",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geometric summary of one detected region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TumorMetrics {
    /// Horizontal extent in pixels.
    pub width: f64,
    /// Vertical extent in pixels.
    pub height: f64,
    /// `width * height`, in pixel².
    pub area: f64,
    pub severity: Severity,
}

pub fn compute_metrics(bbox: &BoundingBox) -> TumorMetrics {
    let width = bbox.width();
    let height = bbox.height();
    let area = width * height;

    TumorMetrics {
        width,
        height,
        area,
        severity: Severity::from_area(area),
    }
}
