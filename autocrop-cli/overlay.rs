use autocrop_core::{CropWindow, Keypoint};
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

const OUTLINE: Rgba<u8> = Rgba([255, 0, 0, 255]);
const WINDOW: Rgba<u8> = Rgba([0, 255, 0, 255]);
const INLIER: Rgba<u8> = Rgba([255, 255, 0, 255]);

/// Source image annotated with the projected template outline (red), the
/// final crop window (green) and the inlier keypoints (yellow)
pub fn render_overlay(
    source: &DynamicImage,
    corners: &[(f64, f64); 4],
    window: &CropWindow,
    inliers: &[Keypoint],
) -> RgbaImage {
    let mut canvas = source.to_rgba8();
    let thickness = (source.width().max(source.height()) / 400).max(1) as i32;

    let (w, h) = canvas.dimensions();
    for i in 0..4 {
        let (ax, ay) = clamp_to_canvas(corners[i], w, h);
        let (bx, by) = clamp_to_canvas(corners[(i + 1) % 4], w, h);
        for t in 0..thickness {
            let o = t as f32;
            draw_line_segment_mut(
                &mut canvas,
                (ax + o, ay + o),
                (bx + o, by + o),
                OUTLINE,
            );
        }
    }

    for t in 0..thickness as u32 {
        let (w, h) = (window.width().saturating_sub(2 * t), window.height().saturating_sub(2 * t));
        if w == 0 || h == 0 {
            break;
        }
        let rect = Rect::at((window.x1 + t) as i32, (window.y1 + t) as i32).of_size(w, h);
        draw_hollow_rect_mut(&mut canvas, rect, WINDOW);
    }

    for kp in inliers {
        draw_hollow_circle_mut(&mut canvas, (kp.x as i32, kp.y as i32), 3 * thickness, INLIER);
    }
    canvas
}

/// Pull a projected point to within one canvas size of the canvas so a
/// near-degenerate outline cannot produce a line millions of pixels long
fn clamp_to_canvas((x, y): (f64, f64), width: u32, height: u32) -> (f32, f32) {
    let margin = width.max(height) as f64;
    (
        x.clamp(-margin, width as f64 + margin) as f32,
        y.clamp(-margin, height as f64 + margin) as f32,
    )
}
