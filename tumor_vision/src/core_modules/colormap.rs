// THEORY:
// The heatmap is colourised with a "jet" palette: dark blue for the lowest
// intensities, through cyan, green and yellow, to dark red for the highest.
// Each channel is a clamped triangular ramp over the normalised intensity `t`:
//
//     red   = clamp(1.5 - |4t - 3|)
//     green = clamp(1.5 - |4t - 2|)
//     blue  = clamp(1.5 - |4t - 1|)
//
// The ramps are evaluated once into a 256-entry `OnceLock` table; colourising a
// pixel is then a single lookup.

use image::{GrayImage, Rgb, RgbImage};
use std::sync::OnceLock;

static JET_LUT: OnceLock<[Rgb<u8>; 256]> = OnceLock::new();

fn ramp(t: f64, center: f64) -> u8 {
    let level = (1.5 - (4.0 * t - center).abs()).clamp(0.0, 1.0);
    (level * 255.0).round() as u8
}

fn jet_table() -> &'static [Rgb<u8>; 256] {
    JET_LUT.get_or_init(|| {
        let mut table = [Rgb([0u8; 3]); 256];
        for (i, entry) in table.iter_mut().enumerate() {
            let t = i as f64 / 255.0;
            *entry = Rgb([ramp(t, 3.0), ramp(t, 2.0), ramp(t, 1.0)]);
        }
        table
    })
}

/// Jet colour for one intensity value.
pub fn jet(intensity: u8) -> Rgb<u8> {
    jet_table()[intensity as usize]
}

/// Maps every intensity of `gray` through the jet palette.
pub fn apply_jet(gray: &GrayImage) -> RgbImage {
    let table = jet_table();
    let (width, height) = gray.dimensions();
    let mut colored = RgbImage::new(width, height);
    for (source, target) in gray.pixels().zip(colored.pixels_mut()) {
        *target = table[source[0] as usize];
    }
    colored
}
