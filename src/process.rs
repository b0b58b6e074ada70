//! Batch processing of portfolio projects.
//!
//! Walks the projects root, scans each project, and builds the variant set
//! of every image.
//!
//! ## Modes
//!
//! - **Single project** (`project = Some(slug)`): the project directory must
//!   exist, otherwise the run fails with [`ProcessError::DirectoryNotFound`].
//! - **All projects** (`project = None`): every subdirectory of the projects
//!   root, sorted by name. A project that cannot be scanned or whose output
//!   directory cannot be created is reported via
//!   [`ProcessEvent::ProjectSkipped`] and the run moves on.
//!
//! ## Parallel Processing
//!
//! Projects run one after another. Inside a project, images are encoded in
//! parallel with [rayon](https://docs.rs/rayon); each image writes only the
//! output names it claimed during the scan, so no locking is needed. Each
//! image's event is sent as soon as it finishes, tagged with its 1-based
//! position in set order (cover, numbered, others); the returned
//! [`ProjectReport`] lists images in set order.
//!
//! ## Failures
//!
//! A source that cannot be analyzed or decoded, or whose full-resolution pair
//! cannot be written, is reported as [`ProcessEvent::ImageFailed`]. A failed
//! preset inside an otherwise good image shows up as an
//! [`ImageStatus::Partial`] outcome. Neither stops the batch.

use crate::config::{ConfigError, OptimizerConfig};
use crate::imaging::{ImageBackend, RustBackend};
use crate::scan::{ProjectImageSet, ScanError, list_projects, scan_project};
use crate::variants::{VariantSetReport, build_variant_set};
use rayon::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Scan error: {0}")]
    Scan(ScanError),
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),
}

impl From<ScanError> for ProcessError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::DirectoryNotFound(path) => ProcessError::DirectoryNotFound(path),
            other => ProcessError::Scan(other),
        }
    }
}

/// Progress events emitted during a run.
///
/// Sent through an optional channel so the caller can display progress
/// without the driver doing any I/O of its own.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    ProjectStarted {
        slug: String,
        image_count: usize,
    },
    /// A source with an output file name another source already claimed.
    DuplicateSkipped {
        slug: String,
        filename: String,
        canonical: String,
        output: String,
        kept: String,
    },
    ImageProcessed {
        /// 1-based position in the project's processing order.
        index: usize,
        filename: String,
        report: VariantSetReport,
    },
    ImageFailed {
        index: usize,
        filename: String,
        canonical: String,
        error: String,
    },
    ProjectSkipped {
        slug: String,
        reason: String,
    },
    ProjectFinished {
        slug: String,
        complete: usize,
        partial: usize,
        failed: usize,
    },
}

/// How one source image fared.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageStatus {
    /// Every variant written.
    Complete,
    /// Full-resolution pair written, at least one preset failed.
    Partial,
    /// Nothing usable written.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageOutcome {
    pub filename: String,
    pub canonical: String,
    pub status: ImageStatus,
}

/// Per-project counters.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectReport {
    pub slug: String,
    /// In processing order.
    pub images: Vec<ImageOutcome>,
    pub duplicates: usize,
}

impl ProjectReport {
    fn count(&self, pred: impl Fn(&ImageStatus) -> bool) -> usize {
        self.images.iter().filter(|i| pred(&i.status)).count()
    }

    pub fn complete(&self) -> usize {
        self.count(|s| *s == ImageStatus::Complete)
    }

    pub fn partial(&self) -> usize {
        self.count(|s| *s == ImageStatus::Partial)
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, ImageStatus::Failed(_)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedProject {
    pub slug: String,
    pub reason: String,
}

/// Outcome of [`run`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub projects: Vec<ProjectReport>,
    pub skipped: Vec<SkippedProject>,
}

impl RunSummary {
    pub fn images(&self) -> usize {
        self.projects.iter().map(|p| p.images.len()).sum()
    }

    pub fn failed(&self) -> usize {
        self.projects.iter().map(|p| p.failed()).sum()
    }

    pub fn partial(&self) -> usize {
        self.projects.iter().map(|p| p.partial()).sum()
    }

    pub fn duplicates(&self) -> usize {
        self.projects.iter().map(|p| p.duplicates).sum()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} projects, {} images ({} failed, {} partial)",
            self.projects.len(),
            self.images(),
            self.failed(),
            self.partial()
        )?;
        if self.duplicates() > 0 {
            write!(f, ", {} duplicates skipped", self.duplicates())?;
        }
        if !self.skipped.is_empty() {
            write!(f, ", {} projects skipped", self.skipped.len())?;
        }
        Ok(())
    }
}

fn emit(events: Option<&Sender<ProcessEvent>>, event: ProcessEvent) {
    if let Some(tx) = events {
        tx.send(event).ok();
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn preset_names(config: &OptimizerConfig) -> Vec<&str> {
    config.presets.iter().map(|p| p.name.as_str()).collect()
}

/// Process every image of one project into `output_root/{slug}`.
pub fn process_project(
    backend: &impl ImageBackend,
    project_dir: &Path,
    output_root: &Path,
    config: &OptimizerConfig,
    events: Option<&Sender<ProcessEvent>>,
) -> Result<ProjectReport, ProcessError> {
    let set = scan_project(project_dir, &preset_names(config))?;
    let output_dir = output_root.join(&set.slug);
    std::fs::create_dir_all(&output_dir)?;

    emit(
        events,
        ProcessEvent::ProjectStarted {
            slug: set.slug.clone(),
            image_count: set.len(),
        },
    );
    for dup in &set.duplicates {
        emit(
            events,
            ProcessEvent::DuplicateSkipped {
                slug: set.slug.clone(),
                filename: file_name(&dup.path),
                canonical: dup.canonical.clone(),
                output: dup.output.clone(),
                kept: file_name(&dup.kept),
            },
        );
    }

    let ordered = set.ordered();
    let images: Vec<ImageOutcome> = ordered
        .par_iter()
        .enumerate()
        .map(|(i, entry)| {
            let index = i + 1;
            let result =
                build_variant_set(backend, &entry.path, &output_dir, &entry.canonical, config);
            let status = match result {
                Ok(report) => {
                    let status = if report.success {
                        ImageStatus::Complete
                    } else {
                        ImageStatus::Partial
                    };
                    emit(
                        events,
                        ProcessEvent::ImageProcessed {
                            index,
                            filename: entry.filename.clone(),
                            report,
                        },
                    );
                    status
                }
                Err(e) => {
                    let error = e.to_string();
                    emit(
                        events,
                        ProcessEvent::ImageFailed {
                            index,
                            filename: entry.filename.clone(),
                            canonical: entry.canonical.clone(),
                            error: error.clone(),
                        },
                    );
                    ImageStatus::Failed(error)
                }
            };
            ImageOutcome {
                filename: entry.filename.clone(),
                canonical: entry.canonical.clone(),
                status,
            }
        })
        .collect();

    let report = ProjectReport {
        slug: set.slug.clone(),
        images,
        duplicates: set.duplicates.len(),
    };
    emit(
        events,
        ProcessEvent::ProjectFinished {
            slug: report.slug.clone(),
            complete: report.complete(),
            partial: report.partial(),
            failed: report.failed(),
        },
    );
    Ok(report)
}

/// Directory of a named project, which must exist.
fn project_dir(projects_root: &Path, slug: &str) -> Result<PathBuf, ProcessError> {
    let dir = projects_root.join(slug);
    if dir.is_dir() {
        Ok(dir)
    } else {
        Err(ProcessError::DirectoryNotFound(dir))
    }
}

/// Process one project (`Some(slug)`) or all projects under `projects_root`.
///
/// The event channel is closed when this returns, which ends a printer
/// thread draining it.
pub fn run(
    backend: &impl ImageBackend,
    projects_root: &Path,
    output_root: &Path,
    project: Option<&str>,
    config: &OptimizerConfig,
    events: Option<Sender<ProcessEvent>>,
) -> Result<RunSummary, ProcessError> {
    config.validate()?;
    let events = events.as_ref();
    let mut summary = RunSummary::default();

    match project {
        Some(slug) => {
            let dir = project_dir(projects_root, slug)?;
            let report = process_project(backend, &dir, output_root, config, events)?;
            summary.projects.push(report);
        }
        None => {
            for dir in list_projects(projects_root)? {
                match process_project(backend, &dir, output_root, config, events) {
                    Ok(report) => summary.projects.push(report),
                    Err(e) => {
                        let skipped = SkippedProject {
                            slug: file_name(&dir),
                            reason: e.to_string(),
                        };
                        emit(
                            events,
                            ProcessEvent::ProjectSkipped {
                                slug: skipped.slug.clone(),
                                reason: skipped.reason.clone(),
                            },
                        );
                        summary.skipped.push(skipped);
                    }
                }
            }
        }
    }

    Ok(summary)
}

/// [`run`] with the production codec backend.
pub fn process(
    projects_root: &Path,
    output_root: &Path,
    project: Option<&str>,
    config: &OptimizerConfig,
    events: Option<Sender<ProcessEvent>>,
) -> Result<RunSummary, ProcessError> {
    run(
        &RustBackend::new(),
        projects_root,
        output_root,
        project,
        config,
        events,
    )
}

/// Scan without encoding: the image sets `run` would process.
pub fn plan(
    projects_root: &Path,
    project: Option<&str>,
    config: &OptimizerConfig,
) -> Result<Vec<ProjectImageSet>, ProcessError> {
    let presets = preset_names(config);
    match project {
        Some(slug) => Ok(vec![scan_project(
            &project_dir(projects_root, slug)?,
            &presets,
        )?]),
        None => list_projects(projects_root)?
            .iter()
            .map(|dir| scan_project(dir, &presets).map_err(ProcessError::from))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;
    use std::fs;
    use std::sync::mpsc;
    use tempfile::TempDir;

    fn project(root: &Path, slug: &str, files: &[&str]) {
        let dir = root.join(slug);
        fs::create_dir_all(&dir).unwrap();
        for name in files {
            fs::write(dir.join(name), b"source").unwrap();
        }
    }

    fn run_collecting(
        backend: &MockBackend,
        root: &Path,
        out: &Path,
        slug: Option<&str>,
    ) -> (Result<RunSummary, ProcessError>, Vec<ProcessEvent>) {
        let (tx, rx) = mpsc::channel();
        let result = run(backend, root, out, slug, &OptimizerConfig::default(), Some(tx));
        (result, rx.iter().collect())
    }

    #[test]
    fn images_reported_in_set_order() {
        let tmp = TempDir::new().unwrap();
        let (root, out) = (tmp.path().join("src"), tmp.path().join("out"));
        project(&root, "poster", &["extra.png", "2.jpg", "1.jpg", "cover.jpg"]);
        let backend = MockBackend::with_source(2400, 1600).with_encode_sizes(&[10_000]);

        let (result, events) = run_collecting(&backend, &root, &out, Some("poster"));
        let summary = result.unwrap();

        let order: Vec<&str> = summary.projects[0]
            .images
            .iter()
            .map(|i| i.filename.as_str())
            .collect();
        assert_eq!(order, vec!["cover.jpg", "1.jpg", "2.jpg", "extra.png"]);

        // Events arrive as images finish; the index is the set position.
        let mut processed: Vec<(usize, String)> = events
            .iter()
            .filter_map(|e| match e {
                ProcessEvent::ImageProcessed {
                    index, filename, ..
                } => Some((*index, filename.clone())),
                _ => None,
            })
            .collect();
        processed.sort();
        assert_eq!(
            processed,
            vec![
                (1, "cover.jpg".to_string()),
                (2, "1.jpg".to_string()),
                (3, "2.jpg".to_string()),
                (4, "extra.png".to_string()),
            ]
        );
        assert_eq!(summary.projects[0].complete(), 4);
        assert!(out.join("poster/img-extra-desktop.webp").is_file());
        assert!(out.join("poster/cover.jpg").is_file());
    }

    #[test]
    fn events_are_bracketed_by_start_and_finish() {
        let tmp = TempDir::new().unwrap();
        let (root, out) = (tmp.path().join("src"), tmp.path().join("out"));
        project(&root, "poster", &["1.jpg", "2.jpg"]);
        let backend = MockBackend::with_source(2400, 1600).with_encode_sizes(&[10_000]);

        let (_, events) = run_collecting(&backend, &root, &out, Some("poster"));

        assert!(matches!(
            events.first(),
            Some(ProcessEvent::ProjectStarted { slug, image_count: 2 }) if slug == "poster"
        ));
        assert!(matches!(
            events.last(),
            Some(ProcessEvent::ProjectFinished {
                complete: 2,
                partial: 0,
                failed: 0,
                ..
            })
        ));
    }

    #[test]
    fn corrupt_image_does_not_stop_project() {
        let tmp = TempDir::new().unwrap();
        let (root, out) = (tmp.path().join("src"), tmp.path().join("out"));
        project(&root, "poster", &["1.jpg", "2.jpg", "3.jpg"]);
        let backend = MockBackend::with_source(2400, 1600)
            .with_encode_sizes(&[10_000])
            .with_broken("2.jpg");

        let (result, events) = run_collecting(&backend, &root, &out, Some("poster"));
        let report = &result.unwrap().projects[0];

        assert_eq!(report.complete(), 2);
        assert_eq!(report.failed(), 1);
        assert!(matches!(report.images[1].status, ImageStatus::Failed(_)));
        assert!(events.iter().any(|e| matches!(
            e,
            ProcessEvent::ImageFailed { index: 2, canonical, .. } if canonical == "img-02"
        )));
        assert!(out.join("poster/img-03-medium.jpg").is_file());
        assert!(!out.join("poster/img-02.jpg").exists());
    }

    #[test]
    fn all_projects_processed_even_with_corrupt_image() {
        let tmp = TempDir::new().unwrap();
        let (root, out) = (tmp.path().join("src"), tmp.path().join("out"));
        project(&root, "beta", &["cover.jpg", "broken.jpg"]);
        project(&root, "alpha", &["1.jpg"]);
        fs::write(root.join("config.toml"), b"").unwrap();
        let backend = MockBackend::with_source(1000, 800)
            .with_encode_sizes(&[10_000])
            .with_broken("broken.jpg");

        let (result, _) = run_collecting(&backend, &root, &out, None);
        let summary = result.unwrap();

        let slugs: Vec<&str> = summary.projects.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["alpha", "beta"]);
        assert_eq!(summary.images(), 3);
        assert_eq!(summary.failed(), 1);
        assert!(out.join("alpha/img-01.webp").is_file());
        assert!(out.join("beta/cover-large.jpg").is_file());
    }

    #[test]
    fn missing_single_project_is_fatal() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("src")).unwrap();
        let backend = MockBackend::with_source(100, 100);

        let (result, events) =
            run_collecting(&backend, &tmp.path().join("src"), tmp.path(), Some("nope"));

        assert!(matches!(result, Err(ProcessError::DirectoryNotFound(p)) if p.ends_with("nope")));
        assert!(events.is_empty());
    }

    #[test]
    fn missing_projects_root_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_source(100, 100);

        let (result, _) = run_collecting(&backend, &tmp.path().join("absent"), tmp.path(), None);
        assert!(matches!(result, Err(ProcessError::DirectoryNotFound(_))));
    }

    #[test]
    fn unwritable_output_skips_project_in_batch_mode() {
        let tmp = TempDir::new().unwrap();
        let (root, out) = (tmp.path().join("src"), tmp.path().join("out"));
        project(&root, "alpha", &["1.jpg"]);
        project(&root, "beta", &["1.jpg"]);
        fs::create_dir_all(&out).unwrap();
        // A file where the project output directory should go.
        fs::write(out.join("alpha"), b"in the way").unwrap();
        let backend = MockBackend::with_source(300, 200).with_encode_sizes(&[1_000]);

        let (result, events) = run_collecting(&backend, &root, &out, None);
        let summary = result.unwrap();

        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].slug, "alpha");
        assert_eq!(summary.projects.len(), 1);
        assert!(events
            .iter()
            .any(|e| matches!(e, ProcessEvent::ProjectSkipped { slug, .. } if slug == "alpha")));
    }

    #[test]
    fn duplicates_are_reported_not_processed() {
        let tmp = TempDir::new().unwrap();
        let (root, out) = (tmp.path().join("src"), tmp.path().join("out"));
        project(&root, "poster", &["01.png", "1.jpg"]);
        let backend = MockBackend::with_source(300, 200).with_encode_sizes(&[1_000]);

        let (result, events) = run_collecting(&backend, &root, &out, Some("poster"));
        let summary = result.unwrap();

        assert_eq!(summary.images(), 1);
        assert_eq!(summary.duplicates(), 1);
        assert!(events.iter().any(|e| matches!(
            e,
            ProcessEvent::DuplicateSkipped { filename, kept, .. }
                if filename == "1.jpg" && kept == "01.png"
        )));
    }

    #[test]
    fn preset_file_name_collision_is_reported_not_processed() {
        let tmp = TempDir::new().unwrap();
        let (root, out) = (tmp.path().join("src"), tmp.path().join("out"));
        project(&root, "poster", &["hero.jpg", "hero-medium.jpg"]);
        let backend = MockBackend::with_source(300, 200).with_encode_sizes(&[1_000]);

        let (result, events) = run_collecting(&backend, &root, &out, Some("poster"));
        let summary = result.unwrap();

        assert_eq!(summary.images(), 1);
        assert_eq!(summary.projects[0].images[0].filename, "hero-medium.jpg");
        assert!(events.iter().any(|e| matches!(
            e,
            ProcessEvent::DuplicateSkipped { filename, output, kept, .. }
                if filename == "hero.jpg"
                    && output == "img-hero-medium.jpg"
                    && kept == "hero-medium.jpg"
        )));
        assert!(!out.join("poster/img-hero.jpg").exists());
        assert!(out.join("poster/img-hero-medium.jpg").is_file());
    }

    #[test]
    fn empty_project_produces_empty_report() {
        let tmp = TempDir::new().unwrap();
        let (root, out) = (tmp.path().join("src"), tmp.path().join("out"));
        project(&root, "empty", &["notes.txt"]);
        let backend = MockBackend::new();

        let (result, _) = run_collecting(&backend, &root, &out, Some("empty"));
        let summary = result.unwrap();

        assert_eq!(summary.images(), 0);
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn invalid_config_is_rejected_before_any_work() {
        let tmp = TempDir::new().unwrap();
        let (root, out) = (tmp.path().join("src"), tmp.path().join("out"));
        project(&root, "poster", &["1.jpg"]);
        let backend = MockBackend::with_source(300, 200);
        let mut config = OptimizerConfig::default();
        config.encoder.max_attempts = 0;

        let result = run(&backend, &root, &out, Some("poster"), &config, None);

        assert!(matches!(result, Err(ProcessError::Config(_))));
        assert!(!out.exists());
    }

    #[test]
    fn plan_lists_projects_without_encoding() {
        let tmp = TempDir::new().unwrap();
        project(tmp.path(), "b", &["cover.jpg"]);
        project(tmp.path(), "a", &["2.jpg", "1.jpg"]);

        let config = OptimizerConfig::default();
        let sets = plan(tmp.path(), None, &config).unwrap();
        let slugs: Vec<&str> = sets.iter().map(|s| s.slug.as_str()).collect();
        assert_eq!(slugs, vec!["a", "b"]);
        assert_eq!(sets[0].ordered()[0].canonical, "img-01");

        assert!(matches!(
            plan(tmp.path(), Some("c"), &config),
            Err(ProcessError::DirectoryNotFound(_))
        ));
    }

    #[test]
    fn summary_display() {
        let summary = RunSummary {
            projects: vec![ProjectReport {
                slug: "p".to_string(),
                images: vec![
                    ImageOutcome {
                        filename: "1.jpg".to_string(),
                        canonical: "img-01".to_string(),
                        status: ImageStatus::Complete,
                    },
                    ImageOutcome {
                        filename: "2.jpg".to_string(),
                        canonical: "img-02".to_string(),
                        status: ImageStatus::Failed("bad".to_string()),
                    },
                ],
                duplicates: 1,
            }],
            skipped: vec![],
        };
        assert_eq!(
            summary.to_string(),
            "1 projects, 2 images (1 failed, 0 partial), 1 duplicates skipped"
        );
    }
}
