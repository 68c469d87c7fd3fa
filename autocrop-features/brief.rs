use autocrop_core::{Descriptor, Image};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::pyramid::ImagePyramid;
use crate::types::ScoredKeypoint;

const DESCRIPTOR_BITS: usize = 256;
const PATTERN_SEED: u64 = 0x0b81_ef5e_ed00_2024;

/// Point pair (x1, y1, x2, y2) relative to the keypoint, before rotation
pub type TestPair = (i8, i8, i8, i8);

/// Rotated BRIEF descriptor generator
#[derive(Debug, Clone)]
pub struct BriefGenerator {
    pairs: Vec<TestPair>,
}

impl BriefGenerator {
    /// Sample 256 test pairs inside a disc that stays within the patch under any rotation
    pub fn new(patch_size: usize) -> Self {
        let radius = ((patch_size / 2) as i32 - 2).clamp(2, i8::MAX as i32);
        let mut rng = StdRng::seed_from_u64(PATTERN_SEED);
        let mut point = || loop {
            let x = rng.gen_range(-radius..=radius);
            let y = rng.gen_range(-radius..=radius);
            if x * x + y * y <= radius * radius {
                return (x as i8, y as i8);
            }
        };

        let mut pairs = Vec::with_capacity(DESCRIPTOR_BITS);
        while pairs.len() < DESCRIPTOR_BITS {
            let (x1, y1) = point();
            let (x2, y2) = point();
            if (x1, y1) != (x2, y2) {
                pairs.push((x1, y1, x2, y2));
            }
        }
        Self { pairs }
    }

    pub fn pairs(&self) -> &[TestPair] {
        &self.pairs
    }

    /// One descriptor per keypoint, sampled from the (smoothed) level image
    pub fn generate_descriptors(&self, img: &Image, width: usize, height: usize, kps: &[ScoredKeypoint]) -> Vec<Descriptor> {
        kps.par_iter()
            .map(|kp| {
                let (s, c) = kp.angle.sin_cos();
                let (cx, cy) = (kp.x as f32, kp.y as f32);
                let mut d = [0u8; 32];

                for (i, &(dx1, dy1, dx2, dy2)) in self.pairs.iter().enumerate() {
                    let (dx1, dy1, dx2, dy2) = (dx1 as f32, dy1 as f32, dx2 as f32, dy2 as f32);
                    let (rx1, ry1) = (cx + c * dx1 - s * dy1, cy + s * dx1 + c * dy1);
                    let (rx2, ry2) = (cx + c * dx2 - s * dy2, cy + s * dx2 + c * dy2);

                    let val1 = ImagePyramid::bilinear_sample(img, width, height, rx1, ry1);
                    let val2 = ImagePyramid::bilinear_sample(img, width, height, rx2, ry2);

                    let bit = (val1 < val2) as u8;
                    d[i / 8] |= bit << (i % 8);
                }
                d
            })
            .collect()
    }
}
