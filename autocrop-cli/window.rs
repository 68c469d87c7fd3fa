use autocrop_core::CropWindow;

use crate::error::{CropError, CropResult};

/// Aspect-locked crop window around a projected template outline.
///
/// The outline's integer bounding box fixes the height and centre; the width
/// follows from `aspect` (width / height). A window that spills over one edge
/// is slid back inside before clamping, so only a window larger than the
/// source loses its aspect.
pub fn derive_crop_window(
    corners: &[(f64, f64); 4],
    source_width: u32,
    source_height: u32,
    aspect: f64,
) -> CropResult<CropWindow> {
    let (xmin, xmax) = truncated_bounds(corners.iter().map(|c| c.0));
    let (ymin, ymax) = truncated_bounds(corners.iter().map(|c| c.1));

    let cx = (xmin + xmax) as f64 / 2.0;
    let cy = (ymin + ymax) as f64 / 2.0;
    let final_h = (ymax - ymin) as f64;
    let final_w = final_h * aspect;

    let x1 = (cx - final_w / 2.0) as i64;
    let y1 = (cy - final_h / 2.0) as i64;
    let x2 = (x1 as f64 + final_w) as i64;
    let y2 = (y1 as f64 + final_h) as i64;

    let (x1, x2) = fit_span(x1, x2, source_width as i64);
    let (y1, y2) = fit_span(y1, y2, source_height as i64);

    let window = CropWindow {
        x1: x1 as u32,
        y1: y1 as u32,
        x2: x2 as u32,
        y2: y2 as u32,
    };
    if window.is_empty() {
        return Err(CropError::EmptyCrop { window });
    }
    Ok(window)
}

/// Min and max, each truncated toward zero
fn truncated_bounds(values: impl Iterator<Item = f64>) -> (i64, i64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    (lo as i64, hi as i64)
}

/// Shift `[a, b)` back inside `[0, limit)`, then clamp what still overhangs
fn fit_span(a: i64, b: i64, limit: i64) -> (i64, i64) {
    let shift = (-a).max(0) - (b - limit).max(0);
    let (a, b) = (a + shift, b + shift);
    let a = a.clamp(0, limit);
    let b = b.clamp(0, limit);
    (a, b.max(a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use autocrop_core::{TARGET_HEIGHT, TARGET_WIDTH};
    use proptest::prelude::*;

    const ASPECT: f64 = TARGET_WIDTH as f64 / TARGET_HEIGHT as f64;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> [(f64, f64); 4] {
        [(x0, y0), (x0, y1), (x1, y1), (x1, y0)]
    }

    #[test]
    fn test_centred_window_keeps_height_and_aspect() {
        let w = derive_crop_window(&rect(140.0, 200.0, 300.0, 400.0), 480, 640, ASPECT).unwrap();
        assert_eq!(w, CropWindow { x1: 139, y1: 200, x2: 300, y2: 400 });
        assert!((w.width() as f64 - w.height() as f64 * ASPECT).abs() <= 1.0);
    }

    #[test]
    fn test_right_overhang_is_shifted_left() {
        // Unclamped window would be x ∈ [950, 1300) on a 1000 px wide source
        let w = derive_crop_window(&rect(1050.0, 100.0, 1201.0, 533.0), 1000, 2000, ASPECT).unwrap();
        assert_eq!((w.x1, w.x2), (650, 1000));
        assert_eq!((w.y1, w.y2), (100, 533));
        assert_eq!(w.width(), 350);
    }

    #[test]
    fn test_left_and_top_overhang_is_shifted_in() {
        let w = derive_crop_window(&rect(-30.0, -20.0, 50.0, 180.0), 800, 800, ASPECT).unwrap();
        assert_eq!(w.x1, 0);
        assert_eq!(w.y1, 0);
        assert_eq!(w.height(), 200);
        assert!((w.width() as f64 - 200.0 * ASPECT).abs() <= 1.0);
    }

    #[test]
    fn test_oversized_window_is_clamped() {
        let w = derive_crop_window(&rect(0.0, 0.0, 479.0, 639.0), 480, 640, ASPECT).unwrap();
        assert_eq!((w.x1, w.x2), (0, 480));
        assert_eq!((w.y1, w.y2), (0, 639));
    }

    #[test]
    fn test_bounds_truncate_toward_zero() {
        assert_eq!(truncated_bounds([-0.9, 10.99, 3.0].into_iter()), (0, 10));
        assert_eq!(truncated_bounds([-1.5, 2.5].into_iter()), (-1, 2));
    }

    #[test]
    fn test_flat_outline_is_empty() {
        let flat = [(10.0, 50.0), (10.0, 50.4), (90.0, 50.2), (90.0, 50.0)];
        let err = derive_crop_window(&flat, 200, 200, ASPECT).unwrap_err();
        assert!(matches!(err, CropError::EmptyCrop { .. }));
    }

    #[test]
    fn test_fit_span() {
        assert_eq!(fit_span(-5, 10, 100), (0, 15));
        assert_eq!(fit_span(95, 110, 100), (85, 100));
        assert_eq!(fit_span(-10, 120, 100), (0, 100));
        assert_eq!(fit_span(20, 40, 100), (20, 40));
    }

    proptest! {
        #[test]
        fn window_always_inside_source(
            x0 in -3000.0f64..3000.0, y0 in -3000.0f64..3000.0,
            dx in 0.0f64..2000.0, dy in 0.0f64..2000.0,
            sw in 1u32..2500, sh in 1u32..2500,
        ) {
            let corners = rect(x0, y0, x0 + dx, y0 + dy);
            if let Ok(w) = derive_crop_window(&corners, sw, sh, ASPECT) {
                prop_assert!(w.fits_within(sw, sh));
                prop_assert!(!w.is_empty());
            }
        }

        #[test]
        fn aspect_held_when_window_fits(
            cx in 300.0f64..1700.0, cy in 300.0f64..1700.0,
            half_h in 10.0f64..250.0, skew in -40.0f64..40.0,
        ) {
            let corners = [
                (cx - 100.0 + skew, cy - half_h),
                (cx - 100.0, cy + half_h),
                (cx + 100.0, cy + half_h - skew),
                (cx + 100.0 - skew, cy - half_h),
            ];
            let w = derive_crop_window(&corners, 2000, 2000, ASPECT).unwrap();
            prop_assert!(w.fits_within(2000, 2000));
            prop_assert!((w.width() as f64 - w.height() as f64 * ASPECT).abs() <= 1.0);
        }
    }
}
