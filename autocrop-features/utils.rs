//! Bit tricks for the FAST segment test.

/// Check for a run of at least `min_count` set bits in the circular mask.
///
/// A run of length n exists iff `mask & rotl(mask, 1) & ... & rotl(mask, n-1)`
/// is non-zero.
#[inline]
pub fn has_consecutive_bits(mask: u16, min_count: usize) -> bool {
    if min_count == 0 || min_count > 16 {
        return false;
    }
    if mask == u16::MAX {
        return true;
    }

    let mut acc = mask;
    for i in 1..min_count {
        acc &= mask.rotate_left(i as u32);
        if acc == 0 {
            return false;
        }
    }
    acc != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bit `i` of the mask = circle pixel `i`
    fn has_consecutive_pixels(pixels: &[bool; 16], min_count: usize) -> bool {
        let mask = pixels
            .iter()
            .enumerate()
            .fold(0u16, |mask, (i, &set)| if set { mask | (1 << i) } else { mask });
        has_consecutive_bits(mask, min_count)
    }

    /// Straightforward scan over two laps of the circle
    fn longest_run(pixels: &[bool; 16]) -> usize {
        let mut best = 0;
        let mut run = 0;
        for i in 0..32 {
            if pixels[i % 16] {
                run += 1;
                best = best.max(run);
            } else {
                run = 0;
            }
        }
        best.min(16)
    }

    #[test]
    fn test_consecutive_pixels_simple() {
        let mut pixels = [false; 16];
        for p in pixels.iter_mut().take(12) {
            *p = true;
        }
        assert!(has_consecutive_pixels(&pixels, 12));
        assert!(!has_consecutive_pixels(&pixels, 13));
    }

    #[test]
    fn test_consecutive_pixels_wrap_around() {
        let mut pixels = [false; 16];
        for i in (10..16).chain(0..6) {
            pixels[i] = true;
        }
        assert!(has_consecutive_pixels(&pixels, 12));
    }

    #[test]
    fn test_alternating_pixels() {
        let mut pixels = [false; 16];
        for i in (0..16).step_by(2) {
            pixels[i] = true;
        }
        assert!(has_consecutive_pixels(&pixels, 1));
        assert!(!has_consecutive_pixels(&pixels, 2));
    }

    #[test]
    fn test_full_and_empty_masks() {
        assert!(has_consecutive_bits(u16::MAX, 16));
        assert!(!has_consecutive_bits(0, 1));
        assert!(!has_consecutive_bits(u16::MAX, 0));
        assert!(!has_consecutive_bits(u16::MAX, 17));
    }

    #[test]
    fn test_bitmask_matches_scan() {
        // Deterministic sweep over a spread of masks
        for seed in 0u32..4096 {
            let mask = (seed.wrapping_mul(40503) ^ (seed << 3)) as u16;
            let mut pixels = [false; 16];
            for (i, p) in pixels.iter_mut().enumerate() {
                *p = mask & (1 << i) != 0;
            }
            let run = longest_run(&pixels);
            for n in 1..=16 {
                assert_eq!(has_consecutive_pixels(&pixels, n), run >= n, "mask={:016b} n={}", mask, n);
            }
        }
    }
}
