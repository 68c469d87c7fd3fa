use autocrop_core::{MIN_MATCH_COUNT, RANSAC_REPROJ_THRESHOLD, RATIO_TEST};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Matching and robust-fit settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MatchConfig {
    /// Lowe ratio; a match survives when best < ratio * second best
    pub ratio: f32,
    /// Fewest ratio-test survivors needed to attempt a fit
    pub min_matches: usize,
    /// RANSAC inlier tolerance in source pixels
    pub reproj_threshold: f64,
    pub max_iters: usize,
    /// Probability that at least one sample is outlier-free
    pub confidence: f64,
    /// Fewest inliers a model must explain to be accepted
    pub min_inliers: usize,
    /// RANSAC sampling seed
    pub seed: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            ratio: RATIO_TEST,
            min_matches: MIN_MATCH_COUNT,
            reproj_threshold: RANSAC_REPROJ_THRESHOLD,
            max_iters: 2000,
            confidence: 0.995,
            min_inliers: 4,
            seed: 0x5eed,
        }
    }
}

impl MatchConfig {
    /// Check ranges; returns a description of the first offending field
    pub fn validate(&self) -> Result<(), String> {
        if !(self.ratio > 0.0 && self.ratio <= 1.0) {
            return Err(format!("ratio must be in (0, 1], got {}", self.ratio));
        }
        if self.min_matches < 4 {
            return Err(format!("min_matches must be at least 4, got {}", self.min_matches));
        }
        if !(self.reproj_threshold > 0.0 && self.reproj_threshold.is_finite()) {
            return Err(format!("reproj_threshold must be positive, got {}", self.reproj_threshold));
        }
        if self.max_iters == 0 {
            return Err("max_iters must be positive".to_string());
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(format!("confidence must be in (0, 1), got {}", self.confidence));
        }
        if self.min_inliers < 4 {
            return Err(format!("min_inliers must be at least 4, got {}", self.min_inliers));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_pipeline_constants() {
        let cfg = MatchConfig::default();
        assert_eq!(cfg.ratio, 0.7);
        assert_eq!(cfg.min_matches, 10);
        assert_eq!(cfg.reproj_threshold, 5.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let bad = [
            MatchConfig { ratio: 0.0, ..MatchConfig::default() },
            MatchConfig { ratio: 1.5, ..MatchConfig::default() },
            MatchConfig { min_matches: 3, ..MatchConfig::default() },
            MatchConfig { reproj_threshold: -1.0, ..MatchConfig::default() },
            MatchConfig { max_iters: 0, ..MatchConfig::default() },
            MatchConfig { confidence: 1.0, ..MatchConfig::default() },
            MatchConfig { min_inliers: 2, ..MatchConfig::default() },
        ];
        for cfg in bad {
            assert!(cfg.validate().is_err(), "{:?}", cfg);
        }
    }
}
