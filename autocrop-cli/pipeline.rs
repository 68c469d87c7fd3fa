use std::path::{Path, PathBuf};

use autocrop_core::{CropWindow, FeatureSet, Keypoint};
use autocrop_features::{FeatureExtractor, OrbExtractor};
use autocrop_match::{estimate_homography, BruteForceMatcher, Homography, MatchConfig};
use image::imageops::FilterType;
use image::DynamicImage;
use log::{debug, trace};

use crate::codec::{load_image, save_image};
use crate::config::CropConfig;
use crate::error::{CropError, CropResult, Stage};
use crate::grayscale::to_luma;
use crate::overlay::render_overlay;
use crate::window::derive_crop_window;

/// Where a template was found inside its source
#[derive(Debug, Clone)]
pub struct Located {
    pub homography: Homography,
    /// Template corners (0,0), (0,h), (w,h), (w,0) in source pixels
    pub corners: [(f64, f64); 4],
    pub window: CropWindow,
    pub template_features: usize,
    pub source_features: usize,
    pub matches: usize,
    /// Source keypoints of the RANSAC consensus set
    pub inliers: Vec<Keypoint>,
}

/// Input and output locations for one template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairJob {
    pub key: String,
    pub template: PathBuf,
    pub source: PathBuf,
    pub high_res: PathBuf,
    pub fixed: PathBuf,
    pub debug: Option<PathBuf>,
}

/// Locates templates in sources and cuts aspect-locked crops out of them
pub struct AutoCropper<E: FeatureExtractor = OrbExtractor> {
    extractor: E,
    matcher: BruteForceMatcher,
    matching: MatchConfig,
    target_width: u32,
    target_height: u32,
}

impl AutoCropper<OrbExtractor> {
    pub fn new(cfg: &CropConfig) -> CropResult<Self> {
        let extractor = OrbExtractor::new(cfg.features.clone())?;
        Ok(Self::with_extractor(extractor, cfg.matching.clone(), cfg.target_width, cfg.target_height))
    }
}

impl<E: FeatureExtractor> AutoCropper<E> {
    pub fn with_extractor(extractor: E, matching: MatchConfig, target_width: u32, target_height: u32) -> Self {
        Self {
            extractor,
            matcher: BruteForceMatcher::new(&matching),
            matching,
            target_width,
            target_height,
        }
    }

    /// Width / height of the fixed-size output
    pub fn aspect(&self) -> f64 {
        self.target_width as f64 / self.target_height as f64
    }

    fn features(&self, img: &DynamicImage) -> CropResult<FeatureSet> {
        let gray = to_luma(img);
        let (w, h) = gray.dimensions();
        Ok(self.extractor.extract(&gray.into_raw(), w as usize, h as usize)?)
    }

    /// Find `template` inside `source` and derive the crop window
    pub fn locate(&self, source: &DynamicImage, template: &DynamicImage) -> CropResult<Located> {
        let template_set = self.features(template)?;
        let source_set = self.features(source)?;
        trace!("stage {}: {} template / {} source features", Stage::Normalized, template_set.len(), source_set.len());

        let good = self.matcher.match_features(&template_set, &source_set)?;
        trace!("stage {}: {} correspondences", Stage::Matched, good.len());

        let estimate = estimate_homography(&template_set.keypoints, &source_set.keypoints, &good, &self.matching)?;
        let corners = estimate
            .homography
            .project_corners(template.width(), template.height())
            .ok_or(CropError::HomographyFailed {
                correspondences: good.len(),
            })?;
        trace!("stage {}: {} inliers, corners {:?}", Stage::Homographed, estimate.inlier_count, corners);

        let window = derive_crop_window(&corners, source.width(), source.height(), self.aspect())?;
        let inliers = good
            .iter()
            .zip(&estimate.inliers)
            .filter(|&(_, &inlier)| inlier)
            .map(|(c, _)| source_set.keypoints[c.source_idx])
            .collect();

        Ok(Located {
            homography: estimate.homography,
            corners,
            window,
            template_features: template_set.len(),
            source_features: source_set.len(),
            matches: good.len(),
            inliers,
        })
    }

    /// Full-resolution crop and its resample to the target size
    pub fn crop(&self, source: &DynamicImage, window: &CropWindow) -> (DynamicImage, DynamicImage) {
        let high_res = source.crop_imm(window.x1, window.y1, window.width(), window.height());
        let fixed = high_res.resize_exact(self.target_width, self.target_height, FilterType::Lanczos3);
        (high_res, fixed)
    }

    /// Load, locate, crop and write both outputs for one pair
    pub fn process_pair(&self, job: &PairJob) -> CropResult<Located> {
        let template = load_image(&job.template)?;
        let source = load_image(&job.source)?;

        let located = self.locate(&source, &template)?;
        let (high_res, fixed) = self.crop(&source, &located.window);
        trace!("stage {}: {} from {}", Stage::Cropped, located.window, job.source.display());

        save_image(&high_res, &job.high_res)?;
        save_image(&fixed, &job.fixed)?;
        if let Some(path) = &job.debug {
            write_overlay(&source, &located, path)?;
        }
        debug!("stage {}: {} -> {}", Stage::Emitted, job.key, job.high_res.display());
        Ok(located)
    }
}

fn write_overlay(source: &DynamicImage, located: &Located, path: &Path) -> CropResult<()> {
    let canvas = render_overlay(source, &located.corners, &located.window, &located.inliers);
    save_image(&DynamicImage::ImageRgba8(canvas), path)
}
