pub mod annotate;
pub mod blob_detector;
pub mod bounding_box;
pub mod chunk;
pub mod colormap;
pub mod grid_manager;
pub mod heatmap;
pub mod intensity_detector;
pub mod pixel;
pub mod smart_blob;
pub mod smart_chunk;
pub mod tumor_metrics;
pub mod utils;
