use autocrop_core::{hamming_distance, Correspondence, Descriptor, FeatureSet};
use log::debug;
use rayon::prelude::*;

use crate::config::MatchConfig;
use crate::error::{MatchError, MatchResult};

/// A candidate train descriptor for one query descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbour {
    pub idx: usize,
    pub distance: u32,
}

/// Brute-force k nearest neighbours by Hamming distance.
///
/// Output is index-aligned with `query`; each list holds at most `k`
/// neighbours, closest first, ties broken by lower train index.
pub fn knn_match(query: &[Descriptor], train: &[Descriptor], k: usize) -> Vec<Vec<Neighbour>> {
    query
        .par_iter()
        .map(|q| {
            let mut best: Vec<Neighbour> = Vec::with_capacity(k + 1);
            for (idx, t) in train.iter().enumerate() {
                let distance = hamming_distance(q, t);
                if best.len() == k && best.last().is_some_and(|worst| distance >= worst.distance) {
                    continue;
                }
                let pos = best.partition_point(|n| n.distance <= distance);
                best.insert(pos, Neighbour { idx, distance });
                best.truncate(k);
            }
            best
        })
        .collect()
}

/// Keep query `i` only when its best neighbour is strictly closer than `ratio` times the second
pub fn ratio_test(knn: &[Vec<Neighbour>], ratio: f32) -> Vec<Correspondence> {
    knn.iter()
        .enumerate()
        .filter_map(|(template_idx, neighbours)| match neighbours.as_slice() {
            [best, second, ..] if (best.distance as f32) < ratio * second.distance as f32 => Some(Correspondence {
                template_idx,
                source_idx: best.idx,
                distance: best.distance,
            }),
            _ => None,
        })
        .collect()
}

/// k=2 brute-force matcher with Lowe's ratio test
#[derive(Debug, Clone)]
pub struct BruteForceMatcher {
    ratio: f32,
    min_matches: usize,
}

impl BruteForceMatcher {
    pub fn new(cfg: &MatchConfig) -> Self {
        Self {
            ratio: cfg.ratio,
            min_matches: cfg.min_matches,
        }
    }

    /// Correspondences template → source that pass the ratio test
    pub fn match_features(&self, template: &FeatureSet, source: &FeatureSet) -> MatchResult<Vec<Correspondence>> {
        if template.is_empty() || source.is_empty() {
            return Err(MatchError::InsufficientFeatures {
                template: template.len(),
                source: source.len(),
            });
        }

        let knn = knn_match(&template.descriptors, &source.descriptors, 2);
        let good = ratio_test(&knn, self.ratio);
        debug!(
            "{} of {} template descriptors passed the ratio test against {} source descriptors",
            good.len(),
            template.len(),
            source.len()
        );

        if good.len() < self.min_matches {
            return Err(MatchError::InsufficientMatches {
                found: good.len(),
                required: self.min_matches,
            });
        }
        Ok(good)
    }
}
