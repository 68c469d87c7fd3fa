//! Batch auto-cropping by template matching.
//!
//! Each template image is located inside the high-resolution source whose
//! file name contains the template's name. ORB-style features are matched
//! with a ratio test, a homography is fitted with RANSAC and the projected
//! outline becomes an aspect-locked crop window. Every pair yields a
//! full-resolution crop and a Lanczos resample to the target size.

pub mod batch;
pub mod codec;
pub mod config;
pub mod error;
pub mod grayscale;
pub mod logger;
pub mod overlay;
pub mod pipeline;
pub mod window;

pub use autocrop_core::{self, CropWindow, FeatureConfig, TARGET_HEIGHT, TARGET_WIDTH};
pub use autocrop_features::{self, FeatureExtractor, FeaturePreset, OrbExtractor};
pub use autocrop_match::{self, Homography, MatchConfig};
pub use batch::{BatchReport, BatchRunner, Cropped, PairOutcome};
pub use config::CropConfig;
pub use error::{BatchError, CropError, CropResult, Stage};
pub use pipeline::{AutoCropper, Located, PairJob};
pub use window::derive_crop_window;
