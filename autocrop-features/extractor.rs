use autocrop_core::{FeatureConfig, FeatureSet, Image, Keypoint};
use log::debug;
use rayon::prelude::*;

use crate::brief::BriefGenerator;
use crate::config::validate;
use crate::detector::FastDetector;
use crate::error::{FeatureError, FeatureResult};
use crate::preprocessing::ImagePreprocessing;
use crate::pyramid::ImagePyramid;
use crate::types::ScaleLevel;

/// Anything that turns a grayscale image into keypoints + descriptors
pub trait FeatureExtractor: Send + Sync {
    fn extract(&self, img: &Image, width: usize, height: usize) -> FeatureResult<FeatureSet>;
}

/// Multi-scale oriented FAST + rotated BRIEF
#[derive(Debug, Clone)]
pub struct OrbExtractor {
    cfg: FeatureConfig,
    brief: BriefGenerator,
}

impl OrbExtractor {
    pub fn new(cfg: FeatureConfig) -> FeatureResult<Self> {
        validate(&cfg)?;
        let brief = BriefGenerator::new(cfg.patch_size);
        Ok(Self { cfg, brief })
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.cfg
    }

    fn extract_level(&self, img: &Image, width: usize, height: usize, level: &ScaleLevel, budget: usize) -> FeatureResult<FeatureSet> {
        let pixels = ImagePyramid::level_image(img, width, height, level);
        let detector = FastDetector::new(&self.cfg, level.width, level.height)?;

        let mut corners = detector.detect_keypoints(&pixels)?;
        corners.truncate(budget);

        let smoothed = ImagePreprocessing::smooth(&pixels, level.width, level.height);
        let descriptors = self.brief.generate_descriptors(&smoothed, level.width, level.height, &corners);

        let keypoints = corners
            .iter()
            .map(|c| {
                let (x, y) = level.to_base(c.x as f32, c.y as f32);
                Keypoint {
                    x,
                    y,
                    angle: c.angle,
                    octave: level.level as u8,
                    response: c.response,
                }
            })
            .collect();

        Ok(FeatureSet { keypoints, descriptors })
    }
}

impl FeatureExtractor for OrbExtractor {
    fn extract(&self, img: &Image, width: usize, height: usize) -> FeatureResult<FeatureSet> {
        if width == 0 || height == 0 {
            return Err(FeatureError::InvalidImageSize { width, height });
        }
        if img.len() != width * height {
            return Err(FeatureError::InvalidImageData {
                expected_len: width * height,
                actual_len: img.len(),
            });
        }

        let levels = ImagePyramid::generate_scale_levels(width, height, &self.cfg);
        if levels.is_empty() {
            debug!("{}x{} image is below the detector minimum, no features", width, height);
            return Ok(FeatureSet::default());
        }
        let budget = ImagePyramid::feature_budget(&levels, self.cfg.max_features, self.cfg.scale_factor);

        let per_level: Vec<FeatureSet> = levels
            .par_iter()
            .zip(budget.par_iter())
            .map(|(level, &n)| self.extract_level(img, width, height, level, n))
            .collect::<FeatureResult<_>>()?;

        let mut features = FeatureSet::default();
        for (level, set) in levels.iter().zip(per_level) {
            debug!("level {} ({}x{}): {} keypoints", level.level, level.width, level.height, set.len());
            features.keypoints.extend(set.keypoints);
            features.descriptors.extend(set.descriptors);
        }
        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Overlapping rectangles of pseudo-random intensity
    fn blocks_image(width: usize, height: usize, seed: u32) -> Image {
        let mut img = vec![40u8; width * height];
        let mut state = seed;
        let mut next = || {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            state >> 8
        };
        for _ in 0..60 {
            let x0 = next() as usize % width;
            let y0 = next() as usize % height;
            let w = 6 + next() as usize % 30;
            let h = 6 + next() as usize % 30;
            let v = (next() % 256) as u8;
            for y in y0..(y0 + h).min(height) {
                for x in x0..(x0 + w).min(width) {
                    img[y * width + x] = v;
                }
            }
        }
        img
    }

    #[test]
    fn test_rejects_invalid_config() {
        let cfg = FeatureConfig { threshold: 0, ..FeatureConfig::default() };
        assert!(matches!(OrbExtractor::new(cfg), Err(FeatureError::InvalidThreshold(0))));
    }

    #[test]
    fn test_rejects_mismatched_buffer() {
        let extractor = OrbExtractor::new(FeatureConfig::default()).unwrap();
        let result = extractor.extract(&vec![0u8; 10], 64, 64);
        assert!(matches!(result, Err(FeatureError::InvalidImageData { .. })));
    }

    #[test]
    fn test_tiny_image_yields_empty_set() {
        let extractor = OrbExtractor::new(FeatureConfig::default()).unwrap();
        let features = extractor.extract(&vec![0u8; 16 * 16], 16, 16).unwrap();
        assert!(features.is_empty());
    }

    #[test]
    fn test_flat_image_yields_empty_set() {
        let extractor = OrbExtractor::new(FeatureConfig::default()).unwrap();
        let features = extractor.extract(&vec![128u8; 120 * 90], 120, 90).unwrap();
        assert!(features.is_empty());
    }

    #[test]
    fn test_textured_image_yields_aligned_features() {
        let extractor = OrbExtractor::new(FeatureConfig::default()).unwrap();
        let img = blocks_image(200, 160, 7);
        let features = extractor.extract(&img, 200, 160).unwrap();

        assert!(features.len() > 20, "only {} features", features.len());
        assert_eq!(features.keypoints.len(), features.descriptors.len());
        assert!(features.len() <= extractor.config().max_features + extractor.config().n_levels);
        for kp in &features.keypoints {
            assert!(kp.x >= 0.0 && kp.x < 200.0 && kp.y >= 0.0 && kp.y < 160.0, "{:?}", kp);
        }
        assert!(features.keypoints.iter().any(|kp| kp.octave > 0));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let extractor = OrbExtractor::new(FeatureConfig::default()).unwrap();
        let img = blocks_image(150, 150, 3);
        let a = extractor.extract(&img, 150, 150).unwrap();
        let b = extractor.extract(&img, 150, 150).unwrap();
        assert_eq!(a.keypoints, b.keypoints);
        assert_eq!(a.descriptors, b.descriptors);
    }
}
