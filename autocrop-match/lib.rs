//! Template → source correspondence and projective fitting.
//!
//! `BruteForceMatcher` pairs binary descriptors with a k=2 Hamming search
//! and Lowe's ratio test; `estimate_homography` fits the template → source
//! transform with seeded RANSAC so repeated runs agree bit for bit.

pub mod config;
pub mod error;
pub mod homography;
pub mod matcher;
pub mod ransac;

pub use config::MatchConfig;
pub use error::{MatchError, MatchResult};
pub use homography::Homography;
pub use matcher::{knn_match, ratio_test, BruteForceMatcher, Neighbour};
pub use ransac::{estimate_homography, HomographyEstimate, RansacEstimator};
