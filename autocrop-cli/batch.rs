use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use autocrop_core::CropWindow;
use autocrop_features::OrbExtractor;
use log::{info, warn};
use rayon::prelude::*;

use crate::config::CropConfig;
use crate::error::{BatchError, CropError, CropResult};
use crate::pipeline::{AutoCropper, PairJob};

/// Successful pair summary
#[derive(Debug, Clone, PartialEq)]
pub struct Cropped {
    pub window: CropWindow,
    pub matches: usize,
    pub inliers: usize,
}

/// What happened to one template
#[derive(Debug)]
pub struct PairOutcome {
    pub key: String,
    pub template: PathBuf,
    pub source: Option<PathBuf>,
    pub result: CropResult<Cropped>,
}

impl PairOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// One console line: key, then the window or the failure
    pub fn status_line(&self) -> String {
        match &self.result {
            Ok(c) => format!(
                "[ok]   {}: {} ({} matches, {} inliers)",
                self.key, c.window, c.matches, c.inliers
            ),
            Err(e) => format!("[fail] {}: {}", self.key, e),
        }
    }
}

/// Outcomes in template order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<PairOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Failure counts keyed by reason
    pub fn failures_by_reason(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for outcome in &self.outcomes {
            if let Err(e) = &outcome.result {
                *counts.entry(e.reason()).or_insert(0) += 1;
            }
        }
        counts
    }

    pub fn get(&self, key: &str) -> Option<&PairOutcome> {
        self.outcomes.iter().find(|o| o.key == key)
    }

    pub fn summary(&self) -> String {
        let mut text = format!(
            "{} templates: {} cropped, {} failed",
            self.outcomes.len(),
            self.succeeded(),
            self.failed()
        );
        for (reason, n) in self.failures_by_reason() {
            text.push_str(&format!("\n  {}: {}", reason, n));
        }
        text
    }
}

/// Regular files in `dir` accepted by the extension filter, sorted by name
pub fn list_images(dir: &Path, cfg: &CropConfig) -> Result<Vec<PathBuf>, BatchError> {
    if !dir.is_dir() {
        return Err(BatchError::MissingDirectory(dir.to_path_buf()));
    }
    let io_err = |source| BatchError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && cfg.accepts(&path) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Pairing key: the template's file name without its extension
pub fn template_key(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Every source whose file name contains `key`, in listing order
pub fn matching_sources<'a>(key: &str, sources: &'a [PathBuf]) -> Vec<&'a PathBuf> {
    sources
        .iter()
        .filter(|s| s.file_name().is_some_and(|n| n.to_string_lossy().contains(key)))
        .collect()
}

enum Planned {
    Ready(PairJob),
    Orphan { key: String, template: PathBuf },
}

/// Runs every template in the configured layout through an [`AutoCropper`]
pub struct BatchRunner {
    cfg: CropConfig,
    cropper: AutoCropper<OrbExtractor>,
}

impl BatchRunner {
    pub fn new(cfg: CropConfig) -> Result<Self, BatchError> {
        cfg.validate()?;
        info!("{}", autocrop_features::config::summary(&cfg.features));
        let extractor = OrbExtractor::new(cfg.features.clone())?;
        let cropper = AutoCropper::with_extractor(extractor, cfg.matching.clone(), cfg.target_width, cfg.target_height);
        Ok(Self { cfg, cropper })
    }

    pub fn config(&self) -> &CropConfig {
        &self.cfg
    }

    fn create_dir(path: &Path) -> Result<(), BatchError> {
        std::fs::create_dir_all(path).map_err(|source| BatchError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn plan(&self) -> Result<Vec<Planned>, BatchError> {
        let templates = list_images(&self.cfg.template_dir, &self.cfg)?;
        let sources = if self.cfg.source_dir.is_dir() {
            list_images(&self.cfg.source_dir, &self.cfg)?
        } else {
            warn!("source directory {} not found, no template can be paired", self.cfg.source_dir.display());
            Vec::new()
        };
        info!(
            "{} templates in {}, {} sources in {}",
            templates.len(),
            self.cfg.template_dir.display(),
            sources.len(),
            self.cfg.source_dir.display()
        );

        let plans = templates
            .into_iter()
            .map(|template| {
                let key = template_key(&template);
                let candidates = matching_sources(&key, &sources);
                let Some(&source) = candidates.first() else {
                    return Planned::Orphan { key, template };
                };
                if candidates.len() > 1 {
                    let names: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
                    warn!("{}: {} sources match, using the first of [{}]", key, candidates.len(), names.join(", "));
                }
                let file_name = template.file_name().map(PathBuf::from).unwrap_or_else(|| PathBuf::from(&key));
                Planned::Ready(PairJob {
                    high_res: self.cfg.high_res_dir.join(&file_name),
                    fixed: self.cfg.fixed_dir.join(&file_name),
                    debug: self.cfg.debug_dir.as_ref().map(|d| d.join(format!("{}.png", key))),
                    source: source.clone(),
                    template,
                    key,
                })
            })
            .collect();
        Ok(plans)
    }

    fn run_one(&self, plan: Planned) -> PairOutcome {
        let outcome = match plan {
            Planned::Orphan { key, template } => {
                warn!("no source image name contains {}", key);
                PairOutcome {
                    result: Err(CropError::NoMatchingSource { key: key.clone() }),
                    key,
                    template,
                    source: None,
                }
            }
            Planned::Ready(job) => {
                let result = self.cropper.process_pair(&job).map(|located| Cropped {
                    window: located.window,
                    matches: located.matches,
                    inliers: located.inliers.len(),
                });
                if let Err(e) = &result {
                    warn!("{} abandoned after stage {}: {}", job.key, e.stage(), e);
                }
                PairOutcome {
                    key: job.key,
                    template: job.template,
                    source: Some(job.source),
                    result,
                }
            }
        };
        println!("{}", outcome.status_line());
        outcome
    }

    /// Process every template; only setup problems abort the batch
    pub fn run(&self) -> Result<BatchReport, BatchError> {
        let start = Instant::now();
        let plans = self.plan()?;
        Self::create_dir(&self.cfg.high_res_dir)?;
        Self::create_dir(&self.cfg.fixed_dir)?;
        if let Some(debug_dir) = &self.cfg.debug_dir {
            Self::create_dir(debug_dir)?;
        }

        let outcomes: Vec<PairOutcome> = if self.cfg.parallel {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(self.cfg.n_threads).build()?;
            pool.install(|| plans.into_par_iter().map(|p| self.run_one(p)).collect())
        } else {
            plans.into_iter().map(|p| self.run_one(p)).collect()
        };

        let report = BatchReport { outcomes };
        info!(
            "batch finished in {:.2?}: {} cropped, {} failed",
            start.elapsed(),
            report.succeeded(),
            report.failed()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|n| PathBuf::from("input_images").join(n)).collect()
    }

    #[test]
    fn test_template_key() {
        assert_eq!(template_key(Path::new("templates/card01.png")), "card01");
        assert_eq!(template_key(Path::new("templates/a.b.png")), "a.b");
    }

    #[test]
    fn test_substring_pairing() {
        let sources = paths(&["scan_card01_front.png", "scan_card011.png", "card02.png"]);
        let hits = matching_sources("card01", &sources);
        assert_eq!(hits.len(), 2);
        assert!(hits[0].ends_with("scan_card01_front.png"));
        assert!(matching_sources("card03", &sources).is_empty());
    }

    #[test]
    fn test_pairing_ignores_directory_part() {
        let sources = vec![PathBuf::from("card01_dir/other.png")];
        assert!(matching_sources("card01", &sources).is_empty());
    }

    #[test]
    fn test_list_images_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.png", "c.txt", "d.PNG"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.png")).unwrap();

        let files = list_images(dir.path(), &CropConfig::default()).unwrap();
        let names: Vec<_> = files.iter().map(|p| p.file_name().unwrap().to_str().unwrap()).collect();
        assert_eq!(names, vec!["a.png", "b.png", "d.PNG"]);
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("templates");
        assert!(matches!(
            list_images(&missing, &CropConfig::default()),
            Err(BatchError::MissingDirectory(_))
        ));
    }

    #[test]
    fn test_debug_overlay_is_always_png() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = CropConfig {
            extensions: vec!["jpg".into()],
            debug_dir: Some(dir.path().join("debug")),
            ..CropConfig::rooted_at(dir.path())
        };
        std::fs::create_dir_all(&cfg.template_dir).unwrap();
        std::fs::create_dir_all(&cfg.source_dir).unwrap();
        std::fs::write(cfg.template_dir.join("card.jpg"), b"x").unwrap();
        std::fs::write(cfg.source_dir.join("scan_card.jpg"), b"x").unwrap();

        let plans = BatchRunner::new(cfg.clone()).unwrap().plan().unwrap();
        let [Planned::Ready(job)] = plans.as_slice() else {
            panic!("expected one ready job");
        };
        assert_eq!(job.high_res, cfg.high_res_dir.join("card.jpg"));
        assert_eq!(job.debug.as_deref(), Some(dir.path().join("debug").join("card.png").as_path()));
    }

    #[test]
    fn test_report_summary() {
        let ok = PairOutcome {
            key: "a".into(),
            template: "a.png".into(),
            source: Some("xa.png".into()),
            result: Ok(Cropped {
                window: CropWindow { x1: 0, y1: 0, x2: 10, y2: 12 },
                matches: 40,
                inliers: 33,
            }),
        };
        let orphan = PairOutcome {
            key: "b".into(),
            template: "b.png".into(),
            source: None,
            result: Err(CropError::NoMatchingSource { key: "b".into() }),
        };
        let report = BatchReport { outcomes: vec![ok, orphan] };
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.failures_by_reason().get("no matching source"), Some(&1));
        assert!(report.summary().starts_with("2 templates: 1 cropped, 1 failed"));
        assert!(report.get("a").unwrap().status_line().starts_with("[ok]"));
        assert!(report.get("b").unwrap().status_line().contains("No matching high-res image for b"));
    }
}
