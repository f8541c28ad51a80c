// THEORY (single-pixel heuristics):
// The heatmap and the intensity detector both start by collapsing a colour image
// into a single intensity channel. That collapse is a per-pixel, neighbour-free
// heuristic, so it lives here and nowhere else.
//
// Luminance uses the Rec. 601 luma weights on the raw 0..255 channel values,
// which is the conventional grayscale conversion for display-referred images.

pub mod pixel {
    use image::{GrayImage, Luma, Rgb, RgbImage};

    pub type Luminance = f64;

    const RED_WEIGHT: f64 = 0.299;
    const GREEN_WEIGHT: f64 = 0.587;
    const BLUE_WEIGHT: f64 = 0.114;

    /// Luminance estimate (Rec. 601 luma) of one RGB pixel, in 0.0..=255.0.
    pub fn luminance(pixel: &Rgb<u8>) -> Luminance {
        let [red, green, blue] = pixel.0;
        RED_WEIGHT * red as f64 + GREEN_WEIGHT * green as f64 + BLUE_WEIGHT * blue as f64
    }

    /// Luminance rounded back into a byte.
    pub fn luma_byte(pixel: &Rgb<u8>) -> u8 {
        luminance(pixel).round().clamp(0.0, 255.0) as u8
    }

    /// Converts an RGB image into an 8-bit grayscale image of the same size.
    pub fn to_luma_image(image: &RgbImage) -> GrayImage {
        let (width, height) = image.dimensions();
        let mut gray = GrayImage::new(width, height);
        for (source, target) in image.pixels().zip(gray.pixels_mut()) {
            *target = Luma([luma_byte(source)]);
        }
        gray
    }
}
