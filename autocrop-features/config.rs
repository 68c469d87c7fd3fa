use autocrop_core::FeatureConfig;

use crate::error::{FeatureError, FeatureResult};

/// Named starting points for `FeatureConfig`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeaturePreset {
    /// Fewer, stronger corners on a shallow pyramid
    Fast,
    /// Library defaults
    Balanced,
    /// Low threshold and a large budget for weakly textured photos
    Quality,
}

impl FeaturePreset {
    pub fn config(self) -> FeatureConfig {
        match self {
            FeaturePreset::Fast => FeatureConfig {
                threshold: 30,
                n_levels: 4,
                max_features: 1000,
                nms_distance: 5.0,
                ..FeatureConfig::default()
            },
            FeaturePreset::Balanced => FeatureConfig::default(),
            FeaturePreset::Quality => FeatureConfig {
                threshold: 12,
                n_levels: 8,
                max_features: 8000,
                nms_distance: 2.0,
                ..FeatureConfig::default()
            },
        }
    }
}

/// Largest odd patch whose BRIEF offsets fit in an `i8`
pub const MAX_PATCH_SIZE: usize = 255;

/// Validate configuration parameters independent of any image size
pub fn validate(cfg: &FeatureConfig) -> FeatureResult<()> {
    if cfg.threshold == 0 || cfg.threshold > 127 {
        return Err(FeatureError::InvalidThreshold(cfg.threshold));
    }
    // Sample offsets are stored as i8, so the patch radius must stay below 128
    if cfg.patch_size % 2 == 0 || cfg.patch_size < 7 || cfg.patch_size > MAX_PATCH_SIZE {
        return Err(FeatureError::InvalidPatchSize {
            patch_size: cfg.patch_size,
            min_image_dim: 0,
        });
    }
    if !(cfg.scale_factor > 1.0 && cfg.scale_factor.is_finite()) {
        return Err(FeatureError::InvalidScaleFactor(cfg.scale_factor));
    }
    if cfg.n_levels == 0 || cfg.n_levels > 16 {
        return Err(FeatureError::InvalidLevelCount(cfg.n_levels));
    }
    Ok(())
}

/// Generate human-readable summary
pub fn summary(cfg: &FeatureConfig) -> String {
    format!(
        "FeatureConfig: threshold={}, patch={}, levels={}x{:.2}, max_features={}, nms={:.1}",
        cfg.threshold, cfg.patch_size, cfg.n_levels, cfg.scale_factor, cfg.max_features, cfg.nms_distance
    )
}

/// Serialize to JSON string
#[cfg(feature = "serde")]
pub fn to_json(cfg: &FeatureConfig) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(cfg)
}

/// Deserialize from JSON string and validate
#[cfg(feature = "serde")]
pub fn from_json(json: &str) -> Result<FeatureConfig, Box<dyn std::error::Error>> {
    let cfg: FeatureConfig = serde_json::from_str(json)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Serialize to TOML string
#[cfg(feature = "serde")]
pub fn to_toml(cfg: &FeatureConfig) -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(cfg)
}

/// Deserialize from TOML string and validate
#[cfg(feature = "serde")]
pub fn from_toml(content: &str) -> Result<FeatureConfig, Box<dyn std::error::Error>> {
    let cfg: FeatureConfig = toml::from_str(content)?;
    validate(&cfg)?;
    Ok(cfg)
}
