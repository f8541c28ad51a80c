// THEORY:
// A `BoundingBox` is the unit of exchange between the detector and everything
// downstream of it. It is a "dumb" data container: four pixel-space coordinates,
// exactly as the detector reported them. Corner order is never normalized; the
// two consumers read the raw numbers differently:
//
// 1.  **Measurement**: the metrics layer only needs extents, so it takes absolute
//     differences and is indifferent to which corner came first.
// 2.  **Rasterization**: the heatmap mask treats the coordinates as half-open
//     slice bounds `[y1:y2, x1:x2]`. Coordinates are truncated toward zero and
//     clamped into the image; a reversed range selects nothing.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Axis-aligned rectangle `(x1, y1, x2, y2)` in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Horizontal extent, independent of corner order.
    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).abs()
    }

    /// Vertical extent, independent of corner order.
    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).abs()
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Coordinates as `[x1, y1, x2, y2]`.
    pub fn to_array(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    /// The pixel region this box covers in an image of the given size, as
    /// `(columns, rows)`. Returns `None` when the region is empty.
    pub fn pixel_span(&self, image_width: u32, image_height: u32) -> Option<(Range<u32>, Range<u32>)> {
        let columns = slice_bounds(self.x1, self.x2, image_width)?;
        let rows = slice_bounds(self.y1, self.y2, image_height)?;
        Some((columns, rows))
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from(coords: [f64; 4]) -> Self {
        Self::new(coords[0], coords[1], coords[2], coords[3])
    }
}

fn slice_bounds(start: f64, end: f64, limit: u32) -> Option<Range<u32>> {
    let clamp = |v: f64| -> u32 {
        // `as` saturates and maps NaN to 0; truncation is toward zero.
        let truncated = v.trunc();
        if truncated <= 0.0 {
            0
        } else {
            (truncated as u64).min(limit as u64) as u32
        }
    };
    let (start, end) = (clamp(start), clamp(end));
    if start < end { Some(start..end) } else { None }
}
