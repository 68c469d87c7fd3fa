#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// One side produced no descriptors at all
    InsufficientFeatures { template: usize, source: usize },
    /// Too few correspondences survived the ratio test
    InsufficientMatches { found: usize, required: usize },
    /// No model reached the minimum inlier count
    HomographyFailed { correspondences: usize },
}

impl std::fmt::Display for MatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchError::InsufficientFeatures { template, source } => {
                write!(f, "Insufficient features: template has {}, source has {} descriptors", template, source)
            }
            MatchError::InsufficientMatches { found, required } => {
                write!(f, "Insufficient matches: {} passed the ratio test, need {}", found, required)
            }
            MatchError::HomographyFailed { correspondences } => {
                write!(f, "Homography estimation failed on {} correspondences", correspondences)
            }
        }
    }
}

impl std::error::Error for MatchError {}

pub type MatchResult<T> = Result<T, MatchError>;
