// THEORY:
// A `SmartChunk` judges one tile of the scan against the scene it belongs to.
// Where a tile's mean luma sits relative to every other tile is expressed as a
// significance score (a Z-score against the scene's mean and standard
// deviation). Lesions on MRI typically show up as compact regions that are much
// brighter than the surrounding tissue, so a high positive score marks the tile
// as `Elevated`; everything else is `Background`.
//
// The analysis is purely spatial and single-image. A flat scene (no spread in
// tile means) has nothing elevated.

use crate::core_modules::chunk::chunk::Chunk;

/// Spread below which the scene is treated as flat.
const FLAT_SCENE_STD_DEV: f64 = 1e-6;

/// The classification of one tile.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkStatus {
    /// The tile is not unusually bright for this scan.
    Background,
    /// The tile is brighter than the scene by the given significance score.
    Elevated(f64),
}

impl ChunkStatus {
    /// The score used as "heat" by the blob detector; `0.0` for background.
    pub fn heat(&self) -> f64 {
        match self {
            ChunkStatus::Background => 0.0,
            ChunkStatus::Elevated(score) => *score,
        }
    }
}

/// Mean and population standard deviation of the tile means.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneStatistics {
    pub mean: f64,
    pub std_dev: f64,
}

impl SceneStatistics {
    pub fn from_values(values: &[f64]) -> Self {
        let count = values.len() as f64;
        if count < 1.0 {
            return Self {
                mean: 0.0,
                std_dev: 0.0,
            };
        }
        let mean = values.iter().sum::<f64>() / count;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;
        Self {
            mean,
            std_dev: variance.sqrt(),
        }
    }

    pub fn is_flat(&self) -> bool {
        self.std_dev < FLAT_SCENE_STD_DEV
    }

    /// Z-score of `value` against the scene, `0.0` when the scene is flat.
    pub fn significance_score(&self, value: f64) -> f64 {
        if self.is_flat() {
            return 0.0;
        }
        (value - self.mean) / self.std_dev
    }
}

/// A tile of the grid with its pooled intensity and classification.
#[derive(Debug, Clone)]
pub struct SmartChunk {
    /// Column of this tile in the grid.
    pub chunk_x: u32,
    /// Row of this tile in the grid.
    pub chunk_y: u32,
    /// Mean luma of the tile's pixels.
    pub mean_luminance: f64,
    pub status: ChunkStatus,
}

impl SmartChunk {
    pub fn new(chunk_x: u32, chunk_y: u32, chunk: &Chunk) -> Self {
        Self {
            chunk_x,
            chunk_y,
            mean_luminance: chunk.average_luminance(),
            status: ChunkStatus::Background,
        }
    }

    /// Classifies the tile against the scene. Scores at or above `threshold`
    /// are elevated.
    pub fn classify(&mut self, scene: &SceneStatistics, threshold: f64) {
        let score = scene.significance_score(self.mean_luminance);
        self.status = if !scene.is_flat() && score >= threshold {
            ChunkStatus::Elevated(score)
        } else {
            ChunkStatus::Background
        };
    }
}
