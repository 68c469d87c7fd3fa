#[derive(Debug, Clone, PartialEq)]
pub enum FeatureError {
    InvalidImageSize { width: usize, height: usize },
    InvalidImageData { expected_len: usize, actual_len: usize },
    InvalidThreshold(u8),
    InvalidPatchSize { patch_size: usize, min_image_dim: usize },
    ImageTooSmall { width: usize, height: usize, min_size: usize },
    InvalidScaleFactor(f32),
    InvalidLevelCount(usize),
}

impl std::fmt::Display for FeatureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureError::InvalidImageSize { width, height } => {
                write!(f, "Invalid image dimensions: {}x{} (must be > 0)", width, height)
            }
            FeatureError::InvalidImageData { expected_len, actual_len } => {
                write!(f, "Image data length mismatch: expected {}, got {}", expected_len, actual_len)
            }
            FeatureError::InvalidThreshold(t) => {
                write!(f, "Invalid threshold: {} (must be 1-127)", t)
            }
            FeatureError::InvalidPatchSize { patch_size, min_image_dim } => {
                write!(f, "Patch size {} invalid for minimum image dimension {} (must be odd and smaller)", patch_size, min_image_dim)
            }
            FeatureError::ImageTooSmall { width, height, min_size } => {
                write!(f, "Image {}x{} too small (minimum {}x{})", width, height, min_size, min_size)
            }
            FeatureError::InvalidScaleFactor(s) => {
                write!(f, "Invalid pyramid scale factor: {} (must be > 1.0)", s)
            }
            FeatureError::InvalidLevelCount(n) => {
                write!(f, "Invalid pyramid level count: {} (must be 1-16)", n)
            }
        }
    }
}

impl std::error::Error for FeatureError {}

pub type FeatureResult<T> = Result<T, FeatureError>;
