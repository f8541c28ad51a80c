// THEORY:
// A `Chunk` is a rectangular tile of the grayscale scan. The intensity detector
// never reasons about single pixels: it pools each tile into one mean luma
// value. Chunks on the right and bottom edges may be smaller than
// the nominal size when the image does not divide evenly; they still count.
//
// Like the other data containers here, a `Chunk` knows how to summarise itself
// and nothing else. Comparing chunks is the job of `SmartChunk`.

pub mod chunk {
    use image::GrayImage;

    /// A "dumb" data container for a block of luma samples.
    pub struct Chunk {
        /// The width of the chunk in pixels.
        pub width: u32,
        /// The height of the chunk in pixels.
        pub height: u32,
        /// Row-major luma samples, `width * height` of them.
        pub samples: Vec<u8>,
    }

    impl Chunk {
        pub fn new(width: u32, height: u32, samples: Vec<u8>) -> Self {
            Self {
                width,
                height,
                samples,
            }
        }

        /// Copies the `width x height` block whose top-left pixel is `(x0, y0)`.
        /// The block is cropped to the image.
        pub fn from_region(gray: &GrayImage, x0: u32, y0: u32, width: u32, height: u32) -> Self {
            let (image_width, image_height) = gray.dimensions();
            let x1 = x0.saturating_add(width).min(image_width);
            let y1 = y0.saturating_add(height).min(image_height);
            let width = x1.saturating_sub(x0);
            let height = y1.saturating_sub(y0);

            let mut samples = Vec::with_capacity((width * height) as usize);
            for y in y0..y1 {
                for x in x0..x1 {
                    samples.push(gray.get_pixel(x, y)[0]);
                }
            }
            Self::new(width, height, samples)
        }

        /// Mean luma of the block, `0.0` for an empty block.
        pub fn average_luminance(&self) -> f64 {
            if self.samples.is_empty() {
                return 0.0;
            }
            let sum: u64 = self.samples.iter().map(|&s| s as u64).sum();
            sum as f64 / self.samples.len() as f64
        }
    }
}
