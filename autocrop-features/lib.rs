//! Keypoint detection and binary descriptors for template matching.
//!
//! Corners are found with a FAST-9 segment test on every level of an image
//! pyramid, oriented by intensity centroid and described with 256 rotated
//! BRIEF comparisons. Keypoints are reported in level-0 coordinates.

pub mod brief;
pub mod config;
pub mod detector;
pub mod error;
pub mod extractor;
pub mod preprocessing;
pub mod pyramid;
pub mod types;
pub mod utils;

pub use autocrop_core::{Descriptor, FeatureConfig, FeatureSet, Image, Keypoint};
pub use brief::BriefGenerator;
pub use config::FeaturePreset;
pub use detector::FastDetector;
pub use error::{FeatureError, FeatureResult};
pub use extractor::{FeatureExtractor, OrbExtractor};
pub use pyramid::ImagePyramid;
pub use types::{ScaleLevel, ScoredKeypoint};
