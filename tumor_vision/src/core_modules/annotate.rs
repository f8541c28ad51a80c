// THEORY:
// The annotated view is the plain detection picture that sits next to the
// heatmap: the untouched scan with an outline around every kept box. The
// outline colour follows the finding's severity. Boxes are clipped exactly like
// the heatmap mask clips them.

use crate::core_modules::tumor_metrics::Severity;
use crate::pipeline::Finding;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

/// Outline width in pixels.
pub const OUTLINE_THICKNESS: u32 = 2;

pub fn severity_color(severity: Severity) -> Rgb<u8> {
    match severity {
        Severity::Small => Rgb([0, 220, 0]),
        Severity::Medium => Rgb([255, 200, 0]),
        Severity::Large => Rgb([255, 0, 0]),
    }
}

/// A copy of `image` with every finding's box outlined.
pub fn draw_findings(image: &RgbImage, findings: &[Finding]) -> RgbImage {
    let (width, height) = image.dimensions();
    let mut canvas = image.clone();

    for finding in findings {
        let Some((columns, rows)) = finding.detection.bounding_box.pixel_span(width, height) else {
            continue;
        };
        let color = severity_color(finding.metrics.severity);

        // Concentric outlines, stepping inwards until the box is used up.
        for inset in 0..OUTLINE_THICKNESS {
            let box_width = (columns.end - columns.start).saturating_sub(2 * inset);
            let box_height = (rows.end - rows.start).saturating_sub(2 * inset);
            if box_width == 0 || box_height == 0 {
                break;
            }
            let rect = Rect::at((columns.start + inset) as i32, (rows.start + inset) as i32)
                .of_size(box_width, box_height);
            draw_hollow_rect_mut(&mut canvas, rect, color);
        }
    }

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::bounding_box::BoundingBox;
    use crate::core_modules::tumor_metrics::compute_metrics;
    use crate::detector::Detection;

    fn finding(bbox: BoundingBox) -> Finding {
        Finding {
            detection: Detection::new("Glioma", 0.9, bbox),
            metrics: compute_metrics(&bbox),
        }
    }

    #[test]
    fn outlines_box_edges_only() {
        let image = RgbImage::from_pixel(20, 20, Rgb([10, 10, 10]));
        let out = draw_findings(&image, &[finding(BoundingBox::new(4.0, 5.0, 14.0, 15.0))]);
        let small = severity_color(Severity::Small);

        assert_eq!(*out.get_pixel(4, 5), small);
        assert_eq!(*out.get_pixel(13, 14), small);
        // Second ring
        assert_eq!(*out.get_pixel(5, 6), small);
        assert_eq!(*out.get_pixel(12, 10), small);
        // Interior and outside stay untouched.
        assert_eq!(*out.get_pixel(8, 10), Rgb([10, 10, 10]));
        assert_eq!(*out.get_pixel(3, 5), Rgb([10, 10, 10]));
        assert_eq!(*out.get_pixel(14, 14), Rgb([10, 10, 10]));
    }

    #[test]
    fn colour_follows_severity() {
        let image = RgbImage::new(200, 200);
        let out = draw_findings(&image, &[finding(BoundingBox::new(0.0, 0.0, 150.0, 150.0))]);
        assert_eq!(*out.get_pixel(0, 0), severity_color(Severity::Large));
    }

    #[test]
    fn boxes_are_clipped_and_reversed_boxes_skipped() {
        let image = RgbImage::new(10, 10);
        let out = draw_findings(
            &image,
            &[
                finding(BoundingBox::new(-5.0, -5.0, 30.0, 30.0)),
                finding(BoundingBox::new(8.0, 8.0, 2.0, 2.0)),
            ],
        );
        let small = severity_color(Severity::Small);
        assert_eq!(*out.get_pixel(0, 0), small);
        assert_eq!(*out.get_pixel(9, 9), small);
        assert_eq!(*out.get_pixel(5, 5), Rgb([0, 0, 0]));
    }

    #[test]
    fn no_findings_leaves_image_unchanged() {
        let image = RgbImage::from_fn(6, 6, |x, y| Rgb([x as u8, y as u8, 3]));
        assert_eq!(draw_findings(&image, &[]), image);
    }
}
