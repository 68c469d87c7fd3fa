use autocrop_core::{FeatureConfig, Image};

use crate::detector::FastDetector;
use crate::types::ScaleLevel;

/// Levels narrower or shorter than this are not worth describing
pub const MIN_LEVEL_SIZE: usize = 32;

/// Image pyramid operations for multi-scale feature detection
pub struct ImagePyramid;

impl ImagePyramid {
    /// Generate scale levels for image pyramid
    pub fn generate_scale_levels(width: usize, height: usize, cfg: &FeatureConfig) -> Vec<ScaleLevel> {
        let min_size = MIN_LEVEL_SIZE.max(FastDetector::min_image_size(cfg.patch_size));
        let mut levels = Vec::with_capacity(cfg.n_levels);
        let mut current_scale = 1.0f32;

        for level in 0..cfg.n_levels {
            let scaled_width = ((width as f32) / current_scale).round() as usize;
            let scaled_height = ((height as f32) / current_scale).round() as usize;

            if scaled_width < min_size || scaled_height < min_size {
                break;
            }

            levels.push(ScaleLevel {
                level,
                scale: current_scale,
                width: scaled_width,
                height: scaled_height,
            });

            current_scale *= cfg.scale_factor;
        }

        levels
    }

    /// Fraction of `max_features` assigned to each level, geometric in the inverse scale
    pub fn feature_budget(levels: &[ScaleLevel], max_features: usize, scale_factor: f32) -> Vec<usize> {
        if levels.is_empty() {
            return Vec::new();
        }
        let factor = 1.0 / scale_factor;
        let weights: Vec<f32> = (0..levels.len()).map(|i| factor.powi(i as i32)).collect();
        let total: f32 = weights.iter().sum();

        let mut budget: Vec<usize> = weights
            .iter()
            .map(|w| ((max_features as f32) * w / total).round() as usize)
            .collect();

        // Rounding leftovers go to the finest level
        let assigned: usize = budget.iter().sum();
        if assigned < max_features {
            budget[0] += max_features - assigned;
        }
        budget
    }

    /// Pixels of one level, resampled from the base image
    pub fn level_image(img: &Image, width: usize, height: usize, scale_level: &ScaleLevel) -> Image {
        if scale_level.level == 0 {
            img.clone()
        } else {
            Self::downsample_image(img, width, height, scale_level.width, scale_level.height)
        }
    }

    /// Downsample image using bilinear interpolation
    fn downsample_image(img: &Image, src_width: usize, src_height: usize, target_width: usize, target_height: usize) -> Image {
        let mut downsampled = vec![0u8; target_width * target_height];

        let x_ratio = src_width as f32 / target_width as f32;
        let y_ratio = src_height as f32 / target_height as f32;

        for y in 0..target_height {
            for x in 0..target_width {
                // Sample at the centre of the destination pixel
                let src_x = ((x as f32 + 0.5) * x_ratio - 0.5).max(0.0);
                let src_y = ((y as f32 + 0.5) * y_ratio - 0.5).max(0.0);

                let value = Self::bilinear_sample(img, src_width, src_height, src_x, src_y);
                downsampled[y * target_width + x] = value.round().clamp(0.0, 255.0) as u8;
            }
        }

        downsampled
    }

    /// Sample image at fractional coordinates using bilinear interpolation
    pub fn bilinear_sample(img: &Image, width: usize, height: usize, x: f32, y: f32) -> f32 {
        let x = x.clamp(0.0, (width - 1) as f32);
        let y = y.clamp(0.0, (height - 1) as f32);
        let x1 = x.floor() as usize;
        let y1 = y.floor() as usize;
        let x2 = (x1 + 1).min(width - 1);
        let y2 = (y1 + 1).min(height - 1);

        let fx = x - x1 as f32;
        let fy = y - y1 as f32;

        let p11 = img[y1 * width + x1] as f32;
        let p12 = img[y1 * width + x2] as f32;
        let p21 = img[y2 * width + x1] as f32;
        let p22 = img[y2 * width + x2] as f32;

        let interpolated_top = p11 * (1.0 - fx) + p12 * fx;
        let interpolated_bottom = p21 * (1.0 - fx) + p22 * fx;

        interpolated_top * (1.0 - fy) + interpolated_bottom * fy
    }
}
