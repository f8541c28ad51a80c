// THEORY:
// The `BlobDetector` groups elevated tiles into regions with a "peak-finding and
// region-growing" pass over the score grid, rather than plain connected
// components. Starting from the brightest point of each region gives stable,
// strongest-first ordering of the results.
//
// Algorithm:
// 1.  **Heat grid**: every tile's significance score, `0.0` for background.
// 2.  **Peak finding (seeding)**: a tile is a peak when no tile in its
//     8-neighbourhood is hotter. Peaks are visited hottest first.
// 3.  **Region growing**: from each unvisited seed, a breadth-first sweep adds
//     4-connected neighbours that are themselves elevated.
// 4.  **Sweep**: any elevated tile still unvisited (possible when a region's top
//     is overshadowed diagonally by a hotter neighbouring region) seeds a blob
//     too, so no elevated tile is lost.
// 5.  **Aggregation**: extents, tile count, mean score and weighted centre are
//     packaged into a `SmartBlob`.
//
// Stateless: one status map in, the blobs of that same scan out.

use crate::core_modules::smart_blob::{Point, SmartBlob};
use crate::core_modules::smart_chunk::ChunkStatus;

pub mod blob_detector {
    use super::*;
    use std::collections::VecDeque;

    /// Identifies all coherent regions of elevated tiles in a status map.
    pub fn find_blobs(status_map: &[ChunkStatus], grid_width: u32, grid_height: u32) -> Vec<SmartBlob> {
        let width = grid_width as usize;
        let height = grid_height as usize;
        if width == 0 || height == 0 || status_map.len() < width * height {
            return Vec::new();
        }

        // --- 1. Heat grid ---
        let mut heatmap = vec![vec![0.0; width]; height];
        for (i, status) in status_map.iter().take(width * height).enumerate() {
            heatmap[i / width][i % width] = status.heat();
        }

        // --- 2. Peak finding ---
        let mut peaks: Vec<Point> = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let heat = heatmap[y][x];
                if heat <= 0.0 {
                    continue;
                }

                let mut is_peak = true;
                'neighbours: for dy in -1i64..=1 {
                    for dx in -1i64..=1 {
                        if dy == 0 && dx == 0 {
                            continue;
                        }
                        let ny = y as i64 + dy;
                        let nx = x as i64 + dx;
                        if ny >= 0
                            && ny < height as i64
                            && nx >= 0
                            && nx < width as i64
                            && heatmap[ny as usize][nx as usize] > heat
                        {
                            is_peak = false;
                            break 'neighbours;
                        }
                    }
                }

                if is_peak {
                    peaks.push(Point {
                        x: x as u32,
                        y: y as u32,
                    });
                }
            }
        }
        peaks.sort_by(|a, b| {
            heatmap[b.y as usize][b.x as usize].total_cmp(&heatmap[a.y as usize][a.x as usize])
        });

        // --- 3 & 4. Region growing from peaks, then from leftovers ---
        let leftovers = (0..height)
            .flat_map(|y| (0..width).map(move |x| Point { x: x as u32, y: y as u32 }));
        let mut visited = vec![vec![false; width]; height];
        let mut blobs: Vec<SmartBlob> = Vec::new();

        for seed in peaks.into_iter().chain(leftovers) {
            let (sx, sy) = (seed.x as usize, seed.y as usize);
            if visited[sy][sx] || heatmap[sy][sx] <= 0.0 {
                continue;
            }
            let blob = grow_blob_from_seed(seed, &heatmap, &mut visited, blobs.len() as u64);
            blobs.push(blob);
        }

        blobs
    }

    /// Breadth-first search over 4-connected elevated tiles.
    fn grow_blob_from_seed(seed: Point, heatmap: &[Vec<f64>], visited: &mut [Vec<bool>], blob_id: u64) -> SmartBlob {
        let grid_height = heatmap.len() as i64;
        let grid_width = heatmap[0].len() as i64;

        let mut blob_chunks: Vec<Point> = Vec::new();
        let mut queue: VecDeque<Point> = VecDeque::from([seed]);
        visited[seed.y as usize][seed.x as usize] = true;

        while let Some(current) = queue.pop_front() {
            blob_chunks.push(current);

            for (dx, dy) in [(0i64, 1i64), (0, -1), (1, 0), (-1, 0)] {
                let nx = current.x as i64 + dx;
                let ny = current.y as i64 + dy;
                if nx < 0 || nx >= grid_width || ny < 0 || ny >= grid_height {
                    continue;
                }
                let (nx, ny) = (nx as usize, ny as usize);
                if !visited[ny][nx] && heatmap[ny][nx] > 0.0 {
                    visited[ny][nx] = true;
                    queue.push_back(Point {
                        x: nx as u32,
                        y: ny as u32,
                    });
                }
            }
        }

        // --- 5. Aggregation ---
        let mut min_x = u32::MAX;
        let mut min_y = u32::MAX;
        let mut max_x = 0;
        let mut max_y = 0;
        let mut total_heat = 0.0;
        let mut center_x = 0.0;
        let mut center_y = 0.0;

        for point in &blob_chunks {
            min_x = min_x.min(point.x);
            min_y = min_y.min(point.y);
            max_x = max_x.max(point.x);
            max_y = max_y.max(point.y);

            let heat = heatmap[point.y as usize][point.x as usize];
            total_heat += heat;
            center_x += point.x as f64 * heat;
            center_y += point.y as f64 * heat;
        }

        let num_chunks = blob_chunks.len();
        SmartBlob {
            id: blob_id,
            bounding_box: (Point { x: min_x, y: min_y }, Point { x: max_x, y: max_y }),
            size_in_chunks: num_chunks,
            average_score: total_heat / num_chunks as f64,
            center_of_mass: (center_x / total_heat, center_y / total_heat),
        }
    }
}
