// THEORY:
// The heatmap layer produces the "attention" overlay shown next to a detection
// result. It is a fixed sequence of total, side-effect-free image operations:
//
// 1.  **Intensity**: collapse the RGB input to 8-bit luma.
// 2.  **Diffusion**: a large (25x25) Gaussian pass for a soft glow, computed in
//     `f32` over a reflect-101 padded copy and rounded back to 8 bits once.
// 3.  **Contrast**: min-max stretch to the full 0..=255 range, so dim and bright
//     scans get the same visual contrast. A flat image stretches to all zeros.
// 4.  **Colour**: map intensity through the jet palette.
// 5.  **Focus**: only when boxes are supplied, zero the colour outside the union
//     of the boxes so the glow sits on the detected regions.
// 6.  **Blend**: `0.6 * original + 0.4 * heatmap`, rounded and clamped.
//
// The input image is only borrowed; every stage allocates its own output.

use crate::core_modules::bounding_box::BoundingBox;
use crate::core_modules::colormap::apply_jet;
use crate::core_modules::pixel::pixel::to_luma_image;
use crate::error::VisionError;
use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use imageproc::filter::separable_filter_equal;
use log::debug;

/// Side length of the square Gaussian kernel.
pub const BLUR_KERNEL_SIZE: usize = 25;
/// Weight of the source image in the final blend.
pub const ORIGINAL_WEIGHT: f64 = 0.6;
/// Weight of the colourised heatmap in the final blend.
pub const HEATMAP_WEIGHT: f64 = 0.4;

const MASK_PASS: u8 = 255;
const MASK_BLOCK: u8 = 0;
const RGB_CHANNELS: usize = 3;

type FloatImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Builds the attention overlay for `image`, focused on `boxes` when any are given.
pub fn build_heatmap(image: &RgbImage, boxes: &[BoundingBox]) -> Result<RgbImage, VisionError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(VisionError::invalid_image(format!(
            "image must be non-empty, got {width}x{height}"
        )));
    }
    debug!("Building heatmap for {}x{} image with {} box(es)", width, height, boxes.len());

    let gray = to_luma_image(image);
    let blurred = smooth(&gray);
    let normalized = normalize_min_max(&blurred);
    let mut heatmap = apply_jet(&normalized);

    if !boxes.is_empty() {
        let mask = region_mask(width, height, boxes);
        apply_mask(&mut heatmap, &mask);
    }

    Ok(blend(image, &heatmap))
}

/// Same as [`build_heatmap`] for a packed RGB8 buffer.
pub fn build_heatmap_from_raw(
    width: u32,
    height: u32,
    data: &[u8],
    boxes: &[BoundingBox],
) -> Result<RgbImage, VisionError> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(RGB_CHANNELS))
        .ok_or_else(|| VisionError::invalid_image(format!("{width}x{height} is too large")))?;
    if data.len() != expected {
        return Err(VisionError::invalid_image(format!(
            "expected {expected} bytes for a {width}x{height} RGB image, got {}",
            data.len()
        )));
    }
    let image = RgbImage::from_raw(width, height, data.to_vec())
        .ok_or_else(|| VisionError::invalid_image("buffer does not match dimensions"))?;
    build_heatmap(&image, boxes)
}

/// Sigma used for a kernel of `size` taps when no sigma is given explicitly.
fn default_sigma(size: usize) -> f64 {
    0.3 * ((size as f64 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalised 1D Gaussian weights of odd length `size`.
pub fn gaussian_kernel(size: usize) -> Vec<f32> {
    let sigma = default_sigma(size);
    let center = (size as f64 - 1.0) / 2.0;
    let weights: Vec<f64> = (0..size)
        .map(|i| {
            let offset = i as f64 - center;
            (-(offset * offset) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f64 = weights.iter().sum();
    weights.iter().map(|w| (w / total) as f32).collect()
}

/// Index into `0..len` for a position past either end, mirroring about the edge
/// pixel without repeating it (`...2 1 | 0 1 2 ... n-1 | n-2 n-3...`).
fn reflect_101(position: i64, len: i64) -> u32 {
    if len == 1 {
        return 0;
    }
    let mut p = position;
    while p < 0 || p >= len {
        p = if p < 0 { -p } else { 2 * (len - 1) - p };
    }
    p as u32
}

/// Separable 25x25 Gaussian smoothing. Borders reflect without repeating the
/// edge pixel; the sums stay in `f32` and are rounded once at the end.
pub fn smooth(gray: &GrayImage) -> GrayImage {
    let kernel = gaussian_kernel(BLUR_KERNEL_SIZE);
    let pad = (BLUR_KERNEL_SIZE / 2) as u32;
    let (width, height) = gray.dimensions();

    let padded: FloatImage = ImageBuffer::from_fn(width + 2 * pad, height + 2 * pad, |x, y| {
        let source_x = reflect_101(x as i64 - pad as i64, width as i64);
        let source_y = reflect_101(y as i64 - pad as i64, height as i64);
        Luma([gray.get_pixel(source_x, source_y)[0] as f32])
    });
    let filtered = separable_filter_equal(&padded, kernel.as_slice());

    GrayImage::from_fn(width, height, |x, y| {
        let value = filtered.get_pixel(x + pad, y + pad)[0];
        Luma([value.round().clamp(0.0, 255.0) as u8])
    })
}

/// Linearly stretches intensities so the darkest pixel is 0 and the brightest 255.
pub fn normalize_min_max(gray: &GrayImage) -> GrayImage {
    let (min, max) = gray
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));

    let (width, height) = gray.dimensions();
    let mut out = GrayImage::new(width, height);
    if max <= min {
        return out;
    }

    let scale = 255.0 / (max - min) as f64;
    for (source, target) in gray.pixels().zip(out.pixels_mut()) {
        let stretched = (source[0] - min) as f64 * scale;
        *target = Luma([stretched.round().clamp(0.0, 255.0) as u8]);
    }
    out
}

/// Binary mask: `255` inside any box, `0` elsewhere.
pub fn region_mask(width: u32, height: u32, boxes: &[BoundingBox]) -> GrayImage {
    let mut mask = GrayImage::from_pixel(width, height, Luma([MASK_BLOCK]));
    for bbox in boxes {
        let Some((columns, rows)) = bbox.pixel_span(width, height) else {
            continue;
        };
        for y in rows {
            for x in columns.clone() {
                mask.put_pixel(x, y, Luma([MASK_PASS]));
            }
        }
    }
    mask
}

/// Zeroes every pixel of `heatmap` whose mask value is blocked.
pub fn apply_mask(heatmap: &mut RgbImage, mask: &GrayImage) {
    for (pixel, gate) in heatmap.pixels_mut().zip(mask.pixels()) {
        if gate[0] == MASK_BLOCK {
            *pixel = Rgb([0, 0, 0]);
        }
    }
}

/// One blended channel value.
pub fn blend_channel(original: u8, heat: u8) -> u8 {
    let mixed = ORIGINAL_WEIGHT * original as f64 + HEATMAP_WEIGHT * heat as f64;
    mixed.round().clamp(0.0, 255.0) as u8
}

/// Weighted per-channel blend of the source and the colourised heatmap.
pub fn blend(original: &RgbImage, heatmap: &RgbImage) -> RgbImage {
    let (width, height) = original.dimensions();
    let mut out = RgbImage::new(width, height);
    for ((source, heat), target) in original.pixels().zip(heatmap.pixels()).zip(out.pixels_mut()) {
        *target = Rgb([
            blend_channel(source[0], heat[0]),
            blend_channel(source[1], heat[1]),
            blend_channel(source[2], heat[2]),
        ]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_image(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([
                ((x * 255) / width.max(1)) as u8,
                ((y * 255) / height.max(1)) as u8,
                ((x + y) % 256) as u8,
            ])
        })
    }

    fn attenuated(pixel: &Rgb<u8>) -> Rgb<u8> {
        Rgb([
            (ORIGINAL_WEIGHT * pixel[0] as f64).round() as u8,
            (ORIGINAL_WEIGHT * pixel[1] as f64).round() as u8,
            (ORIGINAL_WEIGHT * pixel[2] as f64).round() as u8,
        ])
    }

    #[test]
    fn kernel_is_normalized_and_symmetric() {
        let kernel = gaussian_kernel(BLUR_KERNEL_SIZE);
        assert_eq!(kernel.len(), 25);
        let sum: f32 = kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        for i in 0..kernel.len() / 2 {
            assert!((kernel[i] - kernel[kernel.len() - 1 - i]).abs() < 1e-7);
        }
        assert!(kernel[12] > kernel[11]);
        assert!((default_sigma(25) - 4.1).abs() < 1e-12);
    }

    #[test]
    fn blur_keeps_flat_levels() {
        for level in 0..=255u8 {
            let gray = GrayImage::from_pixel(40, 40, Luma([level]));
            let blurred = smooth(&gray);
            assert_eq!(blurred.get_pixel(20, 20)[0], level, "level {level}");
            assert_eq!(blurred.get_pixel(0, 0)[0], level, "level {level}");
        }
    }

    #[test]
    fn reflection_skips_the_edge_pixel() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-4, 5), 4);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(-12, 3), 0);
        assert_eq!(reflect_101(14, 3), 2);
        assert_eq!(reflect_101(-12, 1), 0);
        for p in -30..30 {
            assert!(reflect_101(p, 4) < 4);
        }
    }

    #[test]
    fn blur_mirrors_across_borders() {
        // A ramp 8x reflected about x = 0 reads 8|k| at offset k.
        let gray = GrayImage::from_fn(30, 5, |x, _| Luma([(x * 8) as u8]));
        let blurred = smooth(&gray);

        let kernel = gaussian_kernel(BLUR_KERNEL_SIZE);
        let expected: f64 = kernel
            .iter()
            .enumerate()
            .map(|(i, w)| *w as f64 * 8.0 * (i as f64 - 12.0).abs())
            .sum();
        let left = blurred.get_pixel(0, 2)[0] as f64;
        assert!((left - expected.round()).abs() <= 1.0, "left edge {left}, expected {expected}");
        assert!(left > 20.0);
        // Rows are identical, so the vertical pass leaves them unchanged.
        assert_eq!(blurred.get_pixel(7, 0), blurred.get_pixel(7, 4));
    }

    #[test]
    fn normalization_stretches_to_full_range() {
        let mut gray = GrayImage::from_pixel(3, 1, Luma([20]));
        gray.put_pixel(1, 0, Luma([70]));
        gray.put_pixel(2, 0, Luma([122]));
        let out = normalize_min_max(&gray);
        assert_eq!(out.get_pixel(0, 0)[0], 0);
        assert_eq!(out.get_pixel(1, 0)[0], 125);
        assert_eq!(out.get_pixel(2, 0)[0], 255);
    }

    #[test]
    fn flat_image_normalizes_to_zero() {
        let gray = GrayImage::from_pixel(4, 4, Luma([93]));
        assert!(normalize_min_max(&gray).pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn without_boxes_heatmap_covers_whole_image() {
        let image = RgbImage::from_pixel(4, 3, Rgb([100, 100, 100]));
        let overlay = build_heatmap(&image, &[]).unwrap();
        assert_eq!(overlay.dimensions(), (4, 3));
        // A flat scan normalises to 0, which the palette maps to dark blue.
        for pixel in overlay.pixels() {
            assert_eq!(*pixel, Rgb([60, 60, 111]));
        }
    }

    #[test]
    fn without_boxes_every_pixel_carries_heat() {
        let image = gradient_image(48, 32);
        let overlay = build_heatmap(&image, &[]).unwrap();
        for (source, out) in image.pixels().zip(overlay.pixels()) {
            assert_ne!(*out, attenuated(source));
        }
    }

    #[test]
    fn outside_boxes_only_the_attenuated_original_remains() {
        let image = gradient_image(60, 40);
        let boxes = [
            BoundingBox::new(5.0, 5.0, 20.0, 15.0),
            BoundingBox::new(30.5, 20.2, 50.9, 39.0),
        ];
        let overlay = build_heatmap(&image, &boxes).unwrap();
        let mask = region_mask(60, 40, &boxes);

        for (x, y, out) in overlay.enumerate_pixels() {
            let source = image.get_pixel(x, y);
            if mask.get_pixel(x, y)[0] == 0 {
                assert_eq!(*out, attenuated(source), "pixel ({x}, {y})");
            } else {
                assert_ne!(*out, attenuated(source), "pixel ({x}, {y})");
            }
        }
        assert_eq!(mask.get_pixel(5, 5)[0], 255);
        assert_eq!(mask.get_pixel(19, 14)[0], 255);
        assert_eq!(mask.get_pixel(20, 14)[0], 0);
        assert_eq!(mask.get_pixel(30, 20)[0], 255);
        assert_eq!(mask.get_pixel(49, 38)[0], 255);
        assert_eq!(mask.get_pixel(50, 38)[0], 0);
    }

    #[test]
    fn reversed_box_selects_no_region() {
        let image = gradient_image(20, 20);
        let overlay = build_heatmap(&image, &[BoundingBox::new(15.0, 15.0, 5.0, 5.0)]).unwrap();
        for (source, out) in image.pixels().zip(overlay.pixels()) {
            assert_eq!(*out, attenuated(source));
        }
    }

    #[test]
    fn heatmap_is_deterministic() {
        let image = gradient_image(33, 27);
        let boxes = [BoundingBox::new(3.0, 4.0, 25.0, 20.0)];
        let first = build_heatmap(&image, &boxes).unwrap();
        let second = build_heatmap(&image, &boxes).unwrap();
        assert_eq!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn single_pixel_image_is_supported() {
        let image = RgbImage::from_pixel(1, 1, Rgb([200, 10, 40]));
        let overlay = build_heatmap(&image, &[]).unwrap();
        assert_eq!(overlay.dimensions(), (1, 1));

        let focused = build_heatmap(&image, &[BoundingBox::new(0.0, 0.0, 1.0, 1.0)]).unwrap();
        assert_eq!(focused.dimensions(), (1, 1));
    }

    #[test]
    fn empty_image_is_rejected() {
        let image = RgbImage::new(0, 0);
        assert!(matches!(
            build_heatmap(&image, &[]),
            Err(VisionError::InvalidImage { .. })
        ));
        let wide = RgbImage::new(10, 0);
        assert!(matches!(
            build_heatmap(&wide, &[]),
            Err(VisionError::InvalidImage { .. })
        ));
    }

    #[test]
    fn raw_buffer_must_match_dimensions() {
        let short = vec![0u8; 2 * 2 * 3 - 1];
        assert!(matches!(
            build_heatmap_from_raw(2, 2, &short, &[]),
            Err(VisionError::InvalidImage { .. })
        ));
        // RGBA data is not an RGB image.
        let rgba = vec![0u8; 2 * 2 * 4];
        assert!(matches!(
            build_heatmap_from_raw(2, 2, &rgba, &[]),
            Err(VisionError::InvalidImage { .. })
        ));

        let image = gradient_image(5, 4);
        let from_raw = build_heatmap_from_raw(5, 4, image.as_raw(), &[]).unwrap();
        assert_eq!(from_raw, build_heatmap(&image, &[]).unwrap());
    }

    #[test]
    fn blend_weights() {
        assert_eq!(blend_channel(100, 0), 60);
        assert_eq!(blend_channel(0, 255), 102);
        assert_eq!(blend_channel(255, 255), 255);
    }
}
