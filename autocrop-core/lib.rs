#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Row-major 8-bit grayscale image
pub type Image = Vec<u8>;

/// Width of the fixed-size output crop
pub const TARGET_WIDTH: u32 = 456;
/// Height of the fixed-size output crop
pub const TARGET_HEIGHT: u32 = 564;
/// Lowe ratio: best distance must be strictly below this fraction of the second best
pub const RATIO_TEST: f32 = 0.7;
/// Fewest ratio-test survivors that still constrain a homography fit
pub const MIN_MATCH_COUNT: usize = 10;
/// RANSAC inlier tolerance in source pixels
pub const RANSAC_REPROJ_THRESHOLD: f64 = 5.0;

/// Key-point ≙ FAST corner + orientation (radians), in level-0 pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    /// Pyramid level the corner was found on
    pub octave: u8,
    pub response: f32,
}

/// 256-bit binary descriptor = 32 bytes
pub type Descriptor = [u8; 32];

/// Number of differing bits between two descriptors
#[inline]
pub fn hamming_distance(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x ^ y).count_ones()).sum()
}

/// Keypoints and their descriptors, index-aligned
#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Vec<Descriptor>,
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// A template keypoint paired with a source keypoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Correspondence {
    pub template_idx: usize,
    pub source_idx: usize,
    pub distance: u32,
}

/// Crop bounds in source pixels, half-open on the right and bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CropWindow {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl CropWindow {
    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }

    /// Width over height, 0.0 for a window with no height
    pub fn aspect(&self) -> f64 {
        match self.height() {
            0 => 0.0,
            h => self.width() as f64 / h as f64,
        }
    }

    /// Whether the window lies inside an image of the given size
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x1 <= self.x2 && self.y1 <= self.y2 && self.x2 <= width && self.y2 <= height
    }
}

impl std::fmt::Display for CropWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}) x [{}, {})", self.x1, self.x2, self.y1, self.y2)
    }
}

/// Feature extraction settings shared by template and source
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FeatureConfig {
    /// FAST intensity threshold (1-127)
    pub threshold: u8,
    /// Orientation / descriptor patch, odd
    pub patch_size: usize,
    pub n_levels: usize,
    pub scale_factor: f32,
    /// Keypoint budget across all pyramid levels
    pub max_features: usize,
    pub nms_distance: f32,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            threshold: 20,
            patch_size: 31,
            n_levels: 8,
            scale_factor: 1.2,
            max_features: 3000,
            nms_distance: 3.0,
        }
    }
}

/// Default worker count for the global pool
pub fn default_threads() -> usize {
    num_cpus::get().max(1)
}

/// Initialize Rayon thread pool with the specified number of threads
pub fn init_thread_pool(n_threads: usize) -> Result<(), rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build_global()
}
