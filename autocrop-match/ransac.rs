use autocrop_core::{Correspondence, Keypoint};
use log::debug;
use nalgebra::Point2;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

use crate::config::MatchConfig;
use crate::error::{MatchError, MatchResult};
use crate::homography::Homography;

/// Points in a minimal homography sample
const SAMPLE_SIZE: usize = 4;
/// Triangles smaller than this (px²) make a sample degenerate
const MIN_TRIANGLE_AREA: f64 = 1e-3;

/// Winning model and the correspondences it explains
#[derive(Debug, Clone)]
pub struct HomographyEstimate {
    pub homography: Homography,
    /// Index-aligned with the input correspondences
    pub inliers: Vec<bool>,
    pub inlier_count: usize,
}

/// Seeded RANSAC over 4-point DLT hypotheses
#[derive(Debug, Clone)]
pub struct RansacEstimator {
    threshold: f64,
    max_iters: usize,
    confidence: f64,
    min_inliers: usize,
    seed: u64,
}

impl RansacEstimator {
    pub fn new(cfg: &MatchConfig) -> Self {
        Self {
            threshold: cfg.reproj_threshold,
            max_iters: cfg.max_iters,
            confidence: cfg.confidence,
            min_inliers: cfg.min_inliers.max(SAMPLE_SIZE),
            seed: cfg.seed,
        }
    }

    /// Robust fit of `dst ≈ H(src)`; `None` when no hypothesis gathers enough inliers
    pub fn estimate(&self, src: &[Point2<f64>], dst: &[Point2<f64>]) -> Option<HomographyEstimate> {
        let n = src.len();
        if n != dst.len() || n < SAMPLE_SIZE {
            return None;
        }

        let thresh_sq = self.threshold * self.threshold;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut best: Option<(Homography, Vec<bool>, usize)> = None;
        let mut iters_needed = self.max_iters;
        let mut iter = 0;

        while iter < iters_needed {
            iter += 1;
            let idx = index::sample(&mut rng, n, SAMPLE_SIZE).into_vec();
            let s: Vec<Point2<f64>> = idx.iter().map(|&j| src[j]).collect();
            let d: Vec<Point2<f64>> = idx.iter().map(|&j| dst[j]).collect();
            if is_degenerate(&s) || is_degenerate(&d) {
                continue;
            }

            let h = match Homography::from_correspondences(&s, &d) {
                Some(h) => h,
                None => continue,
            };

            let (mask, count) = inlier_mask(&h, src, dst, thresh_sq);
            if count > best.as_ref().map_or(0, |b| b.2) {
                iters_needed = update_num_iters(self.confidence, count as f64 / n as f64, self.max_iters);
                best = Some((h, mask, count));
            }
        }

        let (model, mask, count) = best?;
        debug!("RANSAC: {} of {} inliers after {} iterations", count, n, iter);
        if count < self.min_inliers {
            return None;
        }

        // Refit on the consensus set, keep it only if it explains at least as much
        let in_src: Vec<Point2<f64>> = src.iter().zip(&mask).filter(|&(_, &m)| m).map(|(p, _)| *p).collect();
        let in_dst: Vec<Point2<f64>> = dst.iter().zip(&mask).filter(|&(_, &m)| m).map(|(p, _)| *p).collect();
        let (homography, inliers, inlier_count) = match Homography::from_correspondences(&in_src, &in_dst) {
            Some(refined) => {
                let (refined_mask, refined_count) = inlier_mask(&refined, src, dst, thresh_sq);
                if refined_count >= count {
                    (refined, refined_mask, refined_count)
                } else {
                    (model, mask, count)
                }
            }
            None => (model, mask, count),
        };

        Some(HomographyEstimate {
            homography,
            inliers,
            inlier_count,
        })
    }
}

/// Fit the template → source transform for ratio-test survivors
pub fn estimate_homography(
    template: &[Keypoint],
    source: &[Keypoint],
    correspondences: &[Correspondence],
    cfg: &MatchConfig,
) -> MatchResult<HomographyEstimate> {
    let src: Vec<Point2<f64>> = correspondences
        .iter()
        .map(|c| {
            let kp = &template[c.template_idx];
            Point2::new(kp.x as f64, kp.y as f64)
        })
        .collect();
    let dst: Vec<Point2<f64>> = correspondences
        .iter()
        .map(|c| {
            let kp = &source[c.source_idx];
            Point2::new(kp.x as f64, kp.y as f64)
        })
        .collect();

    RansacEstimator::new(cfg)
        .estimate(&src, &dst)
        .ok_or(MatchError::HomographyFailed {
            correspondences: correspondences.len(),
        })
}

fn inlier_mask(h: &Homography, src: &[Point2<f64>], dst: &[Point2<f64>], thresh_sq: f64) -> (Vec<bool>, usize) {
    let mask: Vec<bool> = src
        .iter()
        .zip(dst)
        .map(|(s, d)| h.reprojection_error_sq(s, d) <= thresh_sq)
        .collect();
    let count = mask.iter().filter(|&&m| m).count();
    (mask, count)
}

/// Any three of the four points (nearly) collinear
fn is_degenerate(pts: &[Point2<f64>]) -> bool {
    let area = |a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>| {
        ((b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)).abs() * 0.5
    };
    [(0, 1, 2), (0, 1, 3), (0, 2, 3), (1, 2, 3)]
        .iter()
        .any(|&(i, j, k)| area(&pts[i], &pts[j], &pts[k]) < MIN_TRIANGLE_AREA)
}

/// Iterations needed to draw one all-inlier sample with probability `confidence`
fn update_num_iters(confidence: f64, inlier_ratio: f64, max_iters: usize) -> usize {
    let num = (1.0 - confidence).max(f64::MIN_POSITIVE).ln();
    let denom = (1.0 - inlier_ratio.powi(SAMPLE_SIZE as i32)).ln();
    if denom >= 0.0 || -num >= max_iters as f64 * -denom {
        return max_iters;
    }
    ((num / denom).round() as usize).clamp(1, max_iters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Matrix3;
    use proptest::prelude::*;

    fn truth() -> Homography {
        Homography::from_matrix(Matrix3::new(
            0.9, 0.1, 300.0,
            -0.08, 1.05, 150.0,
            2e-5, 1e-5, 1.0,
        ))
        .unwrap()
    }

    /// Scattered template points (not a grid, so samples are rarely collinear)
    fn scattered(n: usize) -> Vec<Point2<f64>> {
        (0..n)
            .map(|i| {
                let t = i as f64;
                Point2::new((t * 37.3) % 400.0, (t * 91.7 + 13.0) % 300.0)
            })
            .collect()
    }

    fn project_all(h: &Homography, pts: &[Point2<f64>]) -> Vec<Point2<f64>> {
        pts.iter()
            .map(|p| {
                let (u, v) = h.project(p.x, p.y).unwrap();
                Point2::new(u, v)
            })
            .collect()
    }

    #[test]
    fn test_recovers_transform_with_outliers() {
        let src = scattered(60);
        let mut dst = project_all(&truth(), &src);
        // Every third correspondence is garbage
        for (i, p) in dst.iter_mut().enumerate() {
            if i % 3 == 0 {
                *p = Point2::new(((i * 53) % 900) as f64, ((i * 29) % 700) as f64);
            }
        }

        let est = RansacEstimator::new(&MatchConfig::default()).estimate(&src, &dst).unwrap();
        assert!(est.inlier_count >= 40);
        for (i, &inlier) in est.inliers.iter().enumerate() {
            if i % 3 != 0 {
                assert!(inlier, "clean correspondence {} rejected", i);
            }
        }
        for (x, y) in [(0.0, 0.0), (400.0, 300.0), (200.0, 10.0)] {
            let (eu, ev) = truth().project(x, y).unwrap();
            let (u, v) = est.homography.project(x, y).unwrap();
            assert!((eu - u).abs() < 0.5 && (ev - v).abs() < 0.5);
        }
    }

    #[test]
    fn test_is_deterministic() {
        let src = scattered(40);
        let mut dst = project_all(&truth(), &src);
        for p in dst.iter_mut().step_by(4) {
            p.x += 40.0;
        }
        let estimator = RansacEstimator::new(&MatchConfig::default());
        let a = estimator.estimate(&src, &dst).unwrap();
        let b = estimator.estimate(&src, &dst).unwrap();
        assert_eq!(a.homography, b.homography);
        assert_eq!(a.inliers, b.inliers);
    }

    #[test]
    fn test_collinear_points_fail() {
        let src: Vec<_> = (0..20).map(|i| Point2::new(i as f64 * 10.0, 5.0)).collect();
        let dst = src.clone();
        assert!(RansacEstimator::new(&MatchConfig::default()).estimate(&src, &dst).is_none());
    }

    #[test]
    fn test_too_few_points() {
        let src = scattered(3);
        assert!(RansacEstimator::new(&MatchConfig::default()).estimate(&src, &src).is_none());
    }

    #[test]
    fn test_min_inliers_enforced() {
        let src = scattered(30);
        let dst = project_all(&truth(), &src);
        let cfg = MatchConfig { min_inliers: 31, ..MatchConfig::default() };
        assert!(RansacEstimator::new(&cfg).estimate(&src, &dst).is_none());
    }

    #[test]
    fn test_estimate_from_keypoints() {
        let src = scattered(25);
        let dst = project_all(&truth(), &src);
        let kp = |p: &Point2<f64>| Keypoint { x: p.x as f32, y: p.y as f32, angle: 0.0, octave: 0, response: 1.0 };
        let template: Vec<Keypoint> = src.iter().map(kp).collect();
        // Source keypoints stored in reverse order
        let source: Vec<Keypoint> = dst.iter().rev().map(kp).collect();
        let correspondences: Vec<Correspondence> = (0..25)
            .map(|i| Correspondence { template_idx: i, source_idx: 24 - i, distance: 0 })
            .collect();

        let est = estimate_homography(&template, &source, &correspondences, &MatchConfig::default()).unwrap();
        assert_eq!(est.inlier_count, 25);

        let err = estimate_homography(&template, &source, &correspondences[..3], &MatchConfig::default());
        assert_eq!(err.unwrap_err(), MatchError::HomographyFailed { correspondences: 3 });
    }

    #[test]
    fn test_update_num_iters() {
        assert_eq!(update_num_iters(0.995, 1.0, 2000), 1);
        assert_eq!(update_num_iters(0.995, 0.0, 2000), 2000);
        let half = update_num_iters(0.995, 0.5, 2000);
        // ln(0.005) / ln(1 - 0.5^4) ≈ 82
        assert!((80..=84).contains(&half), "{}", half);
    }

    proptest! {
        #[test]
        fn pure_translation_is_recovered(tx in -500.0f64..500.0, ty in -500.0f64..500.0) {
            let src = scattered(20);
            let dst: Vec<_> = src.iter().map(|p| Point2::new(p.x + tx, p.y + ty)).collect();
            let est = RansacEstimator::new(&MatchConfig::default()).estimate(&src, &dst).unwrap();
            prop_assert_eq!(est.inlier_count, 20);
            let (u, v) = est.homography.project(0.0, 0.0).unwrap();
            prop_assert!((u - tx).abs() < 1e-3 && (v - ty).abs() < 1e-3);
        }
    }
}
