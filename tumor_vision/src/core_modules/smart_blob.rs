// THEORY:
// A `SmartBlob` is one spatially coherent bright region of a scan: a group of
// adjacent elevated tiles found by the blob detector. It is a stateless data
// container summarising the region (its extent on the grid, how many tiles it
// spans, how strongly it stands out, and where its weighted centre lies). The
// intensity detector turns each blob into one detection.

/// A 2D coordinate on the tile grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

/// A single bright region detected in a scan.
#[derive(Debug, Clone)]
pub struct SmartBlob {
    /// Identifier within the current scan only, in detection order.
    pub id: u64,
    /// Top-left and bottom-right grid cells enclosing every tile of the blob.
    pub bounding_box: (Point, Point),
    /// Number of tiles in the blob.
    pub size_in_chunks: usize,
    /// Mean significance score of the blob's tiles.
    pub average_score: f64,
    /// Score-weighted centre, in grid coordinates.
    pub center_of_mass: (f64, f64),
}
