use autocrop_core::{FeatureConfig, Image};
use rayon::prelude::*;

use crate::error::{FeatureError, FeatureResult};
use crate::types::{CornerType, ScoredKeypoint};
use crate::utils::has_consecutive_bits;

/// Contiguous arc length of the segment test (FAST-9)
pub const ARC_LENGTH: usize = 9;

/// FAST corner detector for a single pyramid level
#[derive(Debug, Clone)]
pub struct FastDetector {
    threshold: u8,
    patch_size: usize,
    nms_distance: f32,
    w: usize,
    h: usize,
}

impl FastDetector {
    /// Bresenham circle of radius 3, clockwise from 12 o'clock
    pub const FAST_OFFSETS: [(i32, i32); 16] = [
        (0, -3), (1, -3), (2, -2), (3, -1),
        (3, 0), (3, 1), (2, 2), (1, 3),
        (0, 3), (-1, 3), (-2, 2), (-3, 1),
        (-3, 0), (-3, -1), (-2, -2), (-1, -3),
    ];

    /// Creates a new FAST detector with validation
    pub fn new(cfg: &FeatureConfig, width: usize, height: usize) -> FeatureResult<Self> {
        if width == 0 || height == 0 {
            return Err(FeatureError::InvalidImageSize { width, height });
        }

        // 0 would detect everything, >127 could overflow the u8 comparisons
        if cfg.threshold == 0 || cfg.threshold > 127 {
            return Err(FeatureError::InvalidThreshold(cfg.threshold));
        }

        if cfg.patch_size % 2 == 0 || cfg.patch_size < 3 {
            return Err(FeatureError::InvalidPatchSize {
                patch_size: cfg.patch_size,
                min_image_dim: width.min(height),
            });
        }

        let min_size = Self::min_image_size(cfg.patch_size);
        if width < min_size || height < min_size {
            return Err(FeatureError::ImageTooSmall { width, height, min_size });
        }

        Ok(Self {
            threshold: cfg.threshold,
            patch_size: cfg.patch_size,
            nms_distance: cfg.nms_distance,
            w: width,
            h: height,
        })
    }

    /// Pixels skipped at each image edge so the orientation patch stays inside
    pub fn border(patch_size: usize) -> usize {
        (patch_size / 2).max(3)
    }

    /// Smallest side length a level needs to produce any keypoint
    pub fn min_image_size(patch_size: usize) -> usize {
        2 * Self::border(patch_size) + 1
    }

    fn validate_image(&self, img: &Image) -> FeatureResult<()> {
        let expected_len = self.w * self.h;
        if img.len() != expected_len {
            return Err(FeatureError::InvalidImageData {
                expected_len,
                actual_len: img.len(),
            });
        }
        Ok(())
    }

    /// Detect corners, suppress non-maxima, strongest response first
    pub fn detect_keypoints(&self, img: &Image) -> FeatureResult<Vec<ScoredKeypoint>> {
        let scored = self.detect_keypoints_with_response(img)?;
        Ok(self.non_maximum_suppression(&scored, self.nms_distance))
    }

    /// Every pixel passing the segment test, in row-major order
    pub fn detect_keypoints_with_response(&self, img: &Image) -> FeatureResult<Vec<ScoredKeypoint>> {
        self.validate_image(img)?;

        let border = Self::border(self.patch_size);
        let rows = border..self.h - border;
        let keypoints = rows
            .into_par_iter()
            .flat_map_iter(|y| {
                let mut v = Vec::new();
                for x in border..self.w - border {
                    if let Some(response) = self.segment_test(img, x, y) {
                        v.push(ScoredKeypoint {
                            x,
                            y,
                            angle: self.compute_orientation(img, x, y),
                            response,
                        });
                    }
                }
                v
            })
            .collect();

        Ok(keypoints)
    }

    #[inline]
    fn classify(&self, p: u8, q: u8) -> CornerType {
        if q >= p.saturating_add(self.threshold) {
            CornerType::Bright
        } else if q.saturating_add(self.threshold) <= p {
            CornerType::Dark
        } else {
            CornerType::None
        }
    }

    /// Returns the corner response when (x, y) has a contiguous bright or dark arc
    fn segment_test(&self, img: &Image, x: usize, y: usize) -> Option<f32> {
        let p = img[y * self.w + x];
        let at = |i: usize| {
            let (dx, dy) = Self::FAST_OFFSETS[i];
            let xx = (x as i32 + dx) as usize;
            let yy = (y as i32 + dy) as usize;
            img[yy * self.w + xx]
        };

        // Any 9-arc covers at least two of the four compass points
        let mut bright_compass = 0;
        let mut dark_compass = 0;
        for i in [0, 4, 8, 12] {
            match self.classify(p, at(i)) {
                CornerType::Bright => bright_compass += 1,
                CornerType::Dark => dark_compass += 1,
                CornerType::None => {}
            }
        }
        if bright_compass < 2 && dark_compass < 2 {
            return None;
        }

        let mut bright_mask = 0u16;
        let mut dark_mask = 0u16;
        let mut bright_sum = 0i32;
        let mut dark_sum = 0i32;
        for i in 0..16 {
            let q = at(i);
            match self.classify(p, q) {
                CornerType::Bright => {
                    bright_mask |= 1 << i;
                    bright_sum += q as i32 - p as i32;
                }
                CornerType::Dark => {
                    dark_mask |= 1 << i;
                    dark_sum += p as i32 - q as i32;
                }
                CornerType::None => {}
            }
        }

        if has_consecutive_bits(bright_mask, ARC_LENGTH) {
            Some(bright_sum as f32 / bright_mask.count_ones() as f32)
        } else if has_consecutive_bits(dark_mask, ARC_LENGTH) {
            Some(dark_sum as f32 / dark_mask.count_ones() as f32)
        } else {
            None
        }
    }

    /// Greedy suppression in response order, bucketed on a grid of `min_distance` cells
    fn non_maximum_suppression(&self, keypoints: &[ScoredKeypoint], min_distance: f32) -> Vec<ScoredKeypoint> {
        let mut sorted = keypoints.to_vec();
        // Stable sort keeps row-major order among equal responses
        sorted.sort_by(|a, b| b.response.partial_cmp(&a.response).unwrap_or(std::cmp::Ordering::Equal));

        if min_distance <= 0.0 || sorted.is_empty() {
            return sorted;
        }

        let cell = (min_distance.ceil() as usize).max(1);
        let gw = self.w / cell + 1;
        let gh = self.h / cell + 1;
        let mut grid: Vec<Vec<usize>> = vec![Vec::new(); gw * gh];
        let mut accepted: Vec<ScoredKeypoint> = Vec::new();
        let min_distance_sq = min_distance * min_distance;

        for candidate in sorted {
            let (cx, cy) = (candidate.x / cell, candidate.y / cell);
            let mut is_local_maximum = true;

            'neighbours: for gy in cy.saturating_sub(1)..=(cy + 1).min(gh - 1) {
                for gx in cx.saturating_sub(1)..=(cx + 1).min(gw - 1) {
                    for &idx in &grid[gy * gw + gx] {
                        let other: &ScoredKeypoint = &accepted[idx];
                        let dx = candidate.x as f32 - other.x as f32;
                        let dy = candidate.y as f32 - other.y as f32;
                        if dx * dx + dy * dy < min_distance_sq {
                            is_local_maximum = false;
                            break 'neighbours;
                        }
                    }
                }
            }

            if is_local_maximum {
                grid[cy * gw + cx].push(accepted.len());
                accepted.push(candidate);
            }
        }

        accepted
    }

    /// Intensity-centroid orientation over the square patch around (x, y)
    fn compute_orientation(&self, img: &Image, x: usize, y: usize) -> f32 {
        let half = (self.patch_size / 2) as i32;
        let (cx, cy) = (x as i32, y as i32);

        if cx - half < 0 || cy - half < 0 || cx + half >= self.w as i32 || cy + half >= self.h as i32 {
            return 0.0;
        }

        let mut m10 = 0i64;
        let mut m01 = 0i64;
        for dy in -half..=half {
            let row = (cy + dy) as usize * self.w;
            for dx in -half..=half {
                let val = img[row + (cx + dx) as usize] as i64;
                m10 += dx as i64 * val;
                m01 += dy as i64 * val;
            }
        }

        if m10 == 0 && m01 == 0 {
            0.0
        } else {
            (m01 as f32).atan2(m10 as f32)
        }
    }

    /// Get image dimensions
    pub fn dimensions(&self) -> (usize, usize) {
        (self.w, self.h)
    }
}
