use autocrop_core::Image;

/// Image preprocessing ahead of descriptor sampling
pub struct ImagePreprocessing;

impl ImagePreprocessing {
    /// 1-4-6-4-1 binomial kernel, sums to 16
    const KERNEL: [u32; 5] = [1, 4, 6, 4, 1];

    /// Separable 5x5 binomial smoothing with clamped borders.
    ///
    /// BRIEF compares single pixels, so descriptors are sampled from the
    /// smoothed level to keep them stable under noise.
    pub fn smooth(img: &Image, width: usize, height: usize) -> Image {
        let mut horizontal = vec![0u16; width * height];
        for y in 0..height {
            let row = y * width;
            for x in 0..width {
                let mut acc = 0u32;
                for (k, &weight) in Self::KERNEL.iter().enumerate() {
                    let xx = (x as isize + k as isize - 2).clamp(0, width as isize - 1) as usize;
                    acc += weight * img[row + xx] as u32;
                }
                horizontal[row + x] = acc as u16;
            }
        }

        let mut out = vec![0u8; width * height];
        for y in 0..height {
            for x in 0..width {
                let mut acc = 0u32;
                for (k, &weight) in Self::KERNEL.iter().enumerate() {
                    let yy = (y as isize + k as isize - 2).clamp(0, height as isize - 1) as usize;
                    acc += weight * horizontal[yy * width + x] as u32;
                }
                out[y * width + x] = ((acc + 128) >> 8) as u8;
            }
        }
        out
    }
}
