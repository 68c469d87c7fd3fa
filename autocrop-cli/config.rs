use std::path::PathBuf;

use autocrop_core::{default_threads, FeatureConfig, TARGET_HEIGHT, TARGET_WIDTH};
use autocrop_features::FeaturePreset;
use autocrop_match::MatchConfig;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "serde")]
use std::path::Path;

use crate::error::BatchError;

/// Config file looked up in the working directory
pub const CONFIG_FILE: &str = "autocrop.toml";
/// Overrides [`CONFIG_FILE`] when set
pub const CONFIG_ENV: &str = "AUTOCROP_CONFIG";

/// Batch layout and tuning
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CropConfig {
    pub template_dir: PathBuf,
    pub source_dir: PathBuf,
    pub high_res_dir: PathBuf,
    pub fixed_dir: PathBuf,
    /// Annotated sources are written here when set
    pub debug_dir: Option<PathBuf>,
    pub target_width: u32,
    pub target_height: u32,
    /// Lower-case file extensions considered images
    pub extensions: Vec<String>,
    /// Process pairs concurrently
    pub parallel: bool,
    pub n_threads: usize,
    pub features: FeatureConfig,
    pub matching: MatchConfig,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            template_dir: PathBuf::from("templates"),
            source_dir: PathBuf::from("input_images"),
            high_res_dir: PathBuf::from("output_high_res"),
            fixed_dir: PathBuf::from(format!("output_fixed_{}x{}", TARGET_WIDTH, TARGET_HEIGHT)),
            debug_dir: None,
            target_width: TARGET_WIDTH,
            target_height: TARGET_HEIGHT,
            extensions: vec!["png".to_string()],
            parallel: false,
            n_threads: default_threads(),
            features: FeatureConfig::default(),
            matching: MatchConfig::default(),
        }
    }
}

impl CropConfig {
    /// All inputs and outputs under `root`, other settings default
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let base = Self::default();
        Self {
            template_dir: root.join(&base.template_dir),
            source_dir: root.join(&base.source_dir),
            high_res_dir: root.join(&base.high_res_dir),
            fixed_dir: root.join(&base.fixed_dir),
            ..base
        }
    }

    /// Replace the feature settings with a named preset
    pub fn with_preset(self, preset: FeaturePreset) -> Self {
        Self {
            features: preset.config(),
            ..self
        }
    }

    pub fn validate(&self) -> Result<(), BatchError> {
        if self.target_width == 0 || self.target_height == 0 {
            return Err(BatchError::Config(format!(
                "target size must be positive, got {}x{}",
                self.target_width, self.target_height
            )));
        }
        if self.extensions.is_empty() {
            return Err(BatchError::Config("extensions must not be empty".to_string()));
        }
        if self.n_threads == 0 {
            return Err(BatchError::Config("n_threads must be positive".to_string()));
        }
        autocrop_features::config::validate(&self.features)?;
        self.matching.validate().map_err(BatchError::Config)?;
        Ok(())
    }

    /// Whether `path` carries one of the configured extensions (case-insensitive)
    pub fn accepts(&self, path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
    }
}

#[cfg(feature = "serde")]
impl CropConfig {
    pub fn from_toml(text: &str) -> Result<Self, BatchError> {
        toml::from_str(text).map_err(|e| BatchError::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String, BatchError> {
        toml::to_string_pretty(self).map_err(|e| BatchError::Config(e.to_string()))
    }

    pub fn from_json(text: &str) -> Result<Self, BatchError> {
        serde_json::from_str(text).map_err(|e| BatchError::Config(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, BatchError> {
        serde_json::to_string_pretty(self).map_err(|e| BatchError::Config(e.to_string()))
    }

    /// Read a TOML or JSON file, chosen by extension
    pub fn load(path: &Path) -> Result<Self, BatchError> {
        let text = std::fs::read_to_string(path).map_err(|source| BatchError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path.extension().is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json { Self::from_json(&text) } else { Self::from_toml(&text) }
    }

    pub fn save(&self, path: &Path) -> Result<(), BatchError> {
        let is_json = path.extension().is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let text = if is_json { self.to_json()? } else { self.to_toml()? };
        std::fs::write(path, text).map_err(|source| BatchError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `$AUTOCROP_CONFIG`, else `./autocrop.toml`, else defaults
    pub fn discover() -> Result<Self, BatchError> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::load(Path::new(&path));
        }
        let local = Path::new(CONFIG_FILE);
        if local.is_file() {
            return Self::load(local);
        }
        Ok(Self::default())
    }
}
