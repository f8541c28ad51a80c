pub mod image_helper {
    use crate::error::VisionError;
    use image::codecs::jpeg::JpegEncoder;
    use image::codecs::png::PngEncoder;
    use image::{ExtendedColorType, ImageEncoder, RgbImage};
    use std::path::{Path, PathBuf};

    /// File extensions picked up when scanning a folder, compared case-insensitively.
    pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

    /// Decodes any supported format into an RGB8 image.
    pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage, VisionError> {
        let decoded = image::load_from_memory(bytes).map_err(VisionError::Decode)?;
        Ok(decoded.to_rgb8())
    }

    /// Reads and decodes an image file into RGB8.
    pub fn load_rgb(path: &Path) -> Result<RgbImage, VisionError> {
        let bytes = std::fs::read(path).map_err(|source| VisionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        decode_rgb(&bytes)
    }

    pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, VisionError> {
        let mut buffer = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        encoder
            .write_image(image.as_raw(), image.width(), image.height(), ExtendedColorType::Rgb8)
            .map_err(VisionError::Encode)?;
        Ok(buffer)
    }

    pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, VisionError> {
        let mut buffer = Vec::new();
        let encoder = PngEncoder::new(&mut buffer);
        encoder
            .write_image(image.as_raw(), image.width(), image.height(), ExtendedColorType::Rgb8)
            .map_err(VisionError::Encode)?;
        Ok(buffer)
    }

    pub fn is_image_path(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
            .unwrap_or(false)
    }

    /// All image files directly inside `dir`, sorted by path.
    pub fn discover_images(dir: &Path) -> Result<Vec<PathBuf>, VisionError> {
        let io_error = |source: std::io::Error| VisionError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut images = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            if path.is_file() && is_image_path(&path) {
                images.push(path);
            }
        }
        images.sort();
        Ok(images)
    }
}
