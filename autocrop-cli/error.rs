use std::path::PathBuf;

use autocrop_core::CropWindow;
use autocrop_features::FeatureError;
use autocrop_match::MatchError;

/// Last stage a pair reached before it finished or was abandoned
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Start,
    Normalized,
    Matched,
    Homographed,
    Cropped,
    Emitted,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::Normalized => "normalized",
            Stage::Matched => "matched",
            Stage::Homographed => "homographed",
            Stage::Cropped => "cropped",
            Stage::Emitted => "emitted",
        };
        f.write_str(name)
    }
}

/// Why a single template/source pair produced no output
#[derive(Debug)]
pub enum CropError {
    UnreadableImage { path: PathBuf, source: image::ImageError },
    InsufficientFeatures { template: usize, source: usize },
    InsufficientMatches { found: usize, required: usize },
    HomographyFailed { correspondences: usize },
    EmptyCrop { window: CropWindow },
    NoMatchingSource { key: String },
    OutputWrite { path: PathBuf, source: image::ImageError },
    Feature(FeatureError),
}

impl CropError {
    /// Stage the pair had completed when this error stopped it
    pub fn stage(&self) -> Stage {
        match self {
            CropError::UnreadableImage { .. } | CropError::NoMatchingSource { .. } => Stage::Start,
            CropError::InsufficientFeatures { .. } | CropError::InsufficientMatches { .. } | CropError::Feature(_) => {
                Stage::Normalized
            }
            CropError::HomographyFailed { .. } => Stage::Matched,
            CropError::EmptyCrop { .. } | CropError::OutputWrite { .. } => Stage::Cropped,
        }
    }

    /// Short tag used when tallying failures
    pub fn reason(&self) -> &'static str {
        match self {
            CropError::UnreadableImage { .. } => "unreadable image",
            CropError::InsufficientFeatures { .. } => "insufficient features",
            CropError::InsufficientMatches { .. } => "insufficient matches",
            CropError::HomographyFailed { .. } => "homography failed",
            CropError::EmptyCrop { .. } => "empty crop",
            CropError::NoMatchingSource { .. } => "no matching source",
            CropError::OutputWrite { .. } => "output write",
            CropError::Feature(_) => "feature extraction",
        }
    }
}

impl std::fmt::Display for CropError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CropError::UnreadableImage { path, source } => {
                write!(f, "Cannot read image {}: {}", path.display(), source)
            }
            CropError::InsufficientFeatures { template, source } => {
                write!(f, "Not enough features (template {}, source {})", template, source)
            }
            CropError::InsufficientMatches { found, required } => {
                write!(f, "Not enough good matches ({} < {})", found, required)
            }
            CropError::HomographyFailed { correspondences } => {
                write!(f, "Homography estimation failed on {} correspondences", correspondences)
            }
            CropError::EmptyCrop { window } => write!(f, "Crop window {} is empty", window),
            CropError::NoMatchingSource { key } => write!(f, "No matching high-res image for {}", key),
            CropError::OutputWrite { path, source } => {
                write!(f, "Cannot write {}: {}", path.display(), source)
            }
            CropError::Feature(e) => write!(f, "Feature extraction error: {}", e),
        }
    }
}

impl std::error::Error for CropError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CropError::UnreadableImage { source, .. } | CropError::OutputWrite { source, .. } => Some(source),
            CropError::Feature(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MatchError> for CropError {
    fn from(err: MatchError) -> Self {
        match err {
            MatchError::InsufficientFeatures { template, source } => CropError::InsufficientFeatures { template, source },
            MatchError::InsufficientMatches { found, required } => CropError::InsufficientMatches { found, required },
            MatchError::HomographyFailed { correspondences } => CropError::HomographyFailed { correspondences },
        }
    }
}

impl From<FeatureError> for CropError {
    fn from(err: FeatureError) -> Self {
        CropError::Feature(err)
    }
}

pub type CropResult<T> = Result<T, CropError>;

/// Failures that stop the whole batch before any pair is attempted
#[derive(Debug)]
pub enum BatchError {
    MissingDirectory(PathBuf),
    Io { path: PathBuf, source: std::io::Error },
    Config(String),
    Feature(FeatureError),
    ThreadPool(rayon::ThreadPoolBuildError),
}

impl std::fmt::Display for BatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchError::MissingDirectory(path) => write!(f, "Directory not found: {}", path.display()),
            BatchError::Io { path, source } => write!(f, "I/O error on {}: {}", path.display(), source),
            BatchError::Config(msg) => write!(f, "Invalid configuration: {}", msg),
            BatchError::Feature(e) => write!(f, "Feature extractor error: {}", e),
            BatchError::ThreadPool(e) => write!(f, "Thread pool error: {}", e),
        }
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BatchError::Io { source, .. } => Some(source),
            BatchError::Feature(e) => Some(e),
            BatchError::ThreadPool(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FeatureError> for BatchError {
    fn from(err: FeatureError) -> Self {
        BatchError::Feature(err)
    }
}

impl From<rayon::ThreadPoolBuildError> for BatchError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        BatchError::ThreadPool(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_errors_map_to_stages() {
        let e: CropError = MatchError::InsufficientMatches { found: 3, required: 10 }.into();
        assert!(matches!(e, CropError::InsufficientMatches { found: 3, required: 10 }));
        assert_eq!(e.stage(), Stage::Normalized);

        let e: CropError = MatchError::HomographyFailed { correspondences: 12 }.into();
        assert_eq!(e.stage(), Stage::Matched);
        assert_eq!(e.reason(), "homography failed");
    }

    #[test]
    fn test_display_mentions_key() {
        let e = CropError::NoMatchingSource { key: "card07".into() };
        assert_eq!(e.to_string(), "No matching high-res image for card07");
        assert_eq!(e.stage(), Stage::Start);
    }

    #[test]
    fn test_empty_crop_display() {
        let e = CropError::EmptyCrop { window: CropWindow { x1: 4, y1: 4, x2: 4, y2: 9 } };
        assert!(e.to_string().contains("empty"));
        assert_eq!(e.stage(), Stage::Cropped);
    }

    #[test]
    fn test_stage_order() {
        assert!(Stage::Start < Stage::Normalized);
        assert!(Stage::Cropped < Stage::Emitted);
        assert_eq!(Stage::Homographed.to_string(), "homographed");
    }
}
