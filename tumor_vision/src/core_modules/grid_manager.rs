// THEORY:
// The `GridManager` owns the tiling of one scan. It slices the grayscale image
// into a grid of `Chunk`s, pools each into a `SmartChunk`, measures the scene
// statistics across all tiles, and classifies every tile against them. The
// result is a flat, row-major "status map" that the blob detector consumes.
//
// The grid always covers the whole image: the column and row counts round up,
// so right and bottom edge tiles may be partial. It also knows how to map a
// rectangle of grid cells back into pixel space for the final bounding boxes.

use crate::core_modules::bounding_box::BoundingBox;
use crate::core_modules::chunk::chunk::Chunk;
use crate::core_modules::smart_blob::Point;
use crate::core_modules::smart_chunk::{ChunkStatus, SceneStatistics, SmartChunk};
use image::GrayImage;

/// Tiling geometry for one image size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridManager {
    /// The width of the full image in pixels.
    image_width: u32,
    /// The height of the full image in pixels.
    image_height: u32,
    /// The side of a (full) tile in pixels.
    chunk_size: u32,
    /// Number of tile columns.
    grid_width: u32,
    /// Number of tile rows.
    grid_height: u32,
}

impl GridManager {
    /// `chunk_size` must be non-zero.
    pub fn new(image_width: u32, image_height: u32, chunk_size: u32) -> Self {
        debug_assert!(chunk_size > 0);
        Self {
            image_width,
            image_height,
            chunk_size,
            grid_width: image_width.div_ceil(chunk_size),
            grid_height: image_height.div_ceil(chunk_size),
        }
    }

    pub fn grid_width(&self) -> u32 {
        self.grid_width
    }

    pub fn grid_height(&self) -> u32 {
        self.grid_height
    }

    /// Tiles the image and classifies every tile. Returns the status map in
    /// row-major order, `grid_width * grid_height` entries.
    pub fn process_image(&self, gray: &GrayImage, threshold: f64) -> Vec<ChunkStatus> {
        let num_chunks = (self.grid_width * self.grid_height) as usize;
        let mut smart_chunks = Vec::with_capacity(num_chunks);

        for chunk_index in 0..num_chunks {
            let chunk_y = chunk_index as u32 / self.grid_width;
            let chunk_x = chunk_index as u32 % self.grid_width;
            let chunk = Chunk::from_region(
                gray,
                chunk_x * self.chunk_size,
                chunk_y * self.chunk_size,
                self.chunk_size,
                self.chunk_size,
            );
            smart_chunks.push(SmartChunk::new(chunk_x, chunk_y, &chunk));
        }

        let means: Vec<f64> = smart_chunks.iter().map(|c| c.mean_luminance).collect();
        let scene = SceneStatistics::from_values(&means);

        smart_chunks
            .into_iter()
            .map(|mut smart_chunk| {
                smart_chunk.classify(&scene, threshold);
                smart_chunk.status
            })
            .collect()
    }

    /// Pixel-space box covering the grid cells from `top_left` to
    /// `bottom_right` inclusive, cropped to the image.
    pub fn cells_to_pixels(&self, top_left: Point, bottom_right: Point) -> BoundingBox {
        let x1 = (top_left.x * self.chunk_size).min(self.image_width);
        let y1 = (top_left.y * self.chunk_size).min(self.image_height);
        let x2 = ((bottom_right.x + 1) * self.chunk_size).min(self.image_width);
        let y2 = ((bottom_right.y + 1) * self.chunk_size).min(self.image_height);
        BoundingBox::new(x1 as f64, y1 as f64, x2 as f64, y2 as f64)
    }
}
