//! Batch driver.
//!
//! Runs every discovered raster source through identity parsing, metadata
//! reconciliation and derivative fan-out, strictly one image (and one
//! derivative) at a time.
//!
//! ## Per-image sequence
//!
//! ```text
//! create destination subfolder
//!   → parse identity from the file name
//!   → prepare metadata            (Skip: next image)
//!   → probe dimensions            (error: image failed, next image)
//!   → record size
//!   → plan + generate derivatives (error: image failed, next image)
//!   → remove source               (if requested)
//!   → finalize metadata
//! ```
//!
//! After the loop the metadata store is flushed exactly once, and only when
//! tracking is active.
//!
//! ## Errors
//!
//! Probe and encode failures are contained per image: they are logged,
//! reported as [`ProcessEvent::ImageFailed`], recorded in the
//! [`BatchReport`], and the batch moves on. Everything else (creating a
//! destination directory, deleting a source, loading or writing the metadata
//! document) is an environment failure and aborts the batch with a
//! [`ProcessError`]. Derivatives already written stay on disk.
//!
//! ## Progress
//!
//! The total number of derivative units is computed before the first image is
//! touched and announced with [`ProcessEvent::BatchStarted`]. Each derivative,
//! written or left unchanged, then emits one [`ProcessEvent::UnitCompleted`]
//! with a monotonically increasing count. Skipped and failed images leave the
//! count short of the total.

use crate::imaging::{
    BackendError, DerivativeAction, ImageBackend, RustBackend, expected_units,
    generate_derivatives, plan_fan_out,
};
use crate::metadata::{Preparation, Reconciler, SkipReason};
use crate::naming::identify_file;
use crate::scan::discover;
use crate::store::{JsonFileStore, MetadataStore, StoreError};
use crate::types::{RunConfig, SourceImage};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to remove source {path}: {source}")]
    RemoveSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Metadata error: {0}")]
    Store(#[from] StoreError),
}

/// Whether a completed derivative was written or was the source itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitStatus {
    Encoded,
    Unchanged,
}

/// Progress events emitted during a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    BatchStarted {
        images: usize,
        total_units: usize,
    },
    ImageSkipped {
        image_name: String,
        source_path: PathBuf,
        reason: SkipReason,
    },
    UnitCompleted {
        completed: usize,
        total: usize,
        output: PathBuf,
        status: UnitStatus,
    },
    ImageFailed {
        source_path: PathBuf,
        message: String,
    },
    SourceRemoved {
        source_path: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedImage {
    pub image_name: String,
    pub source_path: PathBuf,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedImage {
    pub source_path: PathBuf,
    pub message: String,
}

/// Outcome of one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Raster sources handed to the batch.
    pub images: usize,
    /// Images whose full derivative set was produced.
    pub processed: usize,
    pub skipped: Vec<SkippedImage>,
    pub failed: Vec<FailedImage>,
    /// Derivatives written.
    pub encoded: usize,
    /// Derivatives whose output path was the source.
    pub unchanged: usize,
    /// Derivative units completed, encoded or unchanged.
    pub completed_units: usize,
    /// Derivative units expected before the batch started.
    pub total_units: usize,
    /// Sources deleted after their derivatives were written.
    pub removed: usize,
    /// Whether the metadata document was written.
    pub metadata_persisted: bool,
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} images ({} processed, {} skipped, {} failed), {}/{} derivatives ({} encoded, {} unchanged)",
            self.images,
            self.processed,
            self.skipped.len(),
            self.failed.len(),
            self.completed_units,
            self.total_units,
            self.encoded,
            self.unchanged
        )?;
        if self.removed > 0 {
            write!(f, ", {} sources removed", self.removed)?;
        }
        if self.metadata_persisted {
            write!(f, ", metadata saved")?;
        }
        Ok(())
    }
}

fn emit(progress: &Option<Sender<ProcessEvent>>, event: ProcessEvent) {
    if let Some(tx) = progress {
        tx.send(event).ok();
    }
}

/// Discover raster sources under `input_dir` and process them with the
/// [`RustBackend`], writing derivatives under `output_dir`.
///
/// With `metadata_path` set and `config.add_metadata` on, the metadata
/// document at that path is loaded (missing = empty), reconciled and written
/// back once.
pub fn process(
    input_dir: &Path,
    output_dir: &Path,
    config: &RunConfig,
    metadata_path: Option<&Path>,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<BatchReport, ProcessError> {
    let discovered = discover(input_dir);
    if !discovered.vector_paths.is_empty() {
        info!(
            count = discovered.vector_paths.len(),
            "vector sources found; only raster sources are processed"
        );
    }
    let sources: Vec<SourceImage> = discovered
        .raster_paths
        .into_iter()
        .map(|path| SourceImage::new(path, input_dir))
        .collect();

    let backend = RustBackend::new();
    match metadata_path {
        Some(path) if config.add_metadata => {
            let mut store = JsonFileStore::load(path)?;
            process_batch(&backend, &sources, output_dir, config, Some(&mut store), progress)
        }
        _ => process_batch(&backend, &sources, output_dir, config, None, progress),
    }
}

/// Process `sources` in order with the given backend and metadata store.
///
/// Metadata is tracked only when a store is given and `config.add_metadata`
/// is on.
pub fn process_batch(
    backend: &impl ImageBackend,
    sources: &[SourceImage],
    output_root: &Path,
    config: &RunConfig,
    metadata: Option<&mut dyn MetadataStore>,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<BatchReport, ProcessError> {
    let mut reconciler = Reconciler::new(metadata, config);
    let mut report = BatchReport {
        images: sources.len(),
        total_units: expected_units(sources.len(), config),
        ..BatchReport::default()
    };
    emit(
        &progress,
        ProcessEvent::BatchStarted {
            images: report.images,
            total_units: report.total_units,
        },
    );

    for source in sources {
        let dest_dir = source.destination_dir(output_root);
        std::fs::create_dir_all(&dest_dir).map_err(|e| ProcessError::CreateDir {
            path: dest_dir.clone(),
            source: e,
        })?;

        let identity = identify_file(&source.file_name);
        if let Preparation::Skip(reason) = reconciler.prepare(&identity.image_name) {
            emit(
                &progress,
                ProcessEvent::ImageSkipped {
                    image_name: identity.image_name.clone(),
                    source_path: source.path.clone(),
                    reason: reason.clone(),
                },
            );
            report.skipped.push(SkippedImage {
                image_name: identity.image_name,
                source_path: source.path.clone(),
                reason,
            });
            continue;
        }

        let dims = match backend.identify(&source.path) {
            Ok(dims) => dims,
            Err(e) => {
                image_failed(&mut report, &progress, &source.path, &e);
                continue;
            }
        };
        reconciler.add_size_info(&identity.image_name, dims, identity.breakpoint);

        let plan = plan_fan_out(&source.path, &identity, dims, config, &dest_dir);
        let generated = generate_derivatives(backend, &source.path, &plan, config.quality, |unit| {
            report.completed_units += 1;
            let status = match unit.action {
                DerivativeAction::Encode => {
                    report.encoded += 1;
                    UnitStatus::Encoded
                }
                DerivativeAction::Unchanged => {
                    report.unchanged += 1;
                    UnitStatus::Unchanged
                }
            };
            debug!(output = %unit.output.display(), ?status, "derivative done");
            emit(
                &progress,
                ProcessEvent::UnitCompleted {
                    completed: report.completed_units,
                    total: report.total_units,
                    output: unit.output.clone(),
                    status,
                },
            );
        });
        if let Err(e) = generated {
            image_failed(&mut report, &progress, &source.path, &e);
            continue;
        }

        if config.remove_origin {
            let is_own_output = plan
                .iter()
                .any(|unit| unit.action == DerivativeAction::Unchanged);
            if is_own_output {
                debug!(path = %source.path.display(), "source is one of its derivatives; kept");
            } else {
                std::fs::remove_file(&source.path).map_err(|e| ProcessError::RemoveSource {
                    path: source.path.clone(),
                    source: e,
                })?;
                report.removed += 1;
                emit(
                    &progress,
                    ProcessEvent::SourceRemoved {
                        source_path: source.path.clone(),
                    },
                );
            }
        }

        reconciler.finalize(&identity.image_name);
        report.processed += 1;
    }

    if reconciler.is_enabled() {
        if let Err(e) = reconciler.persist() {
            error!(error = %e, "failed to write metadata");
            return Err(e.into());
        }
        report.metadata_persisted = true;
    }

    Ok(report)
}

fn image_failed(
    report: &mut BatchReport,
    progress: &Option<Sender<ProcessEvent>>,
    path: &Path,
    err: &BackendError,
) {
    error!(path = %path.display(), error = %err, "image failed");
    emit(
        progress,
        ProcessEvent::ImageFailed {
            source_path: path.to_path_buf(),
            message: err.to_string(),
        },
    );
    report.failed.push(FailedImage {
        source_path: path.to_path_buf(),
        message: err.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::store::{DataDocument, ImageRecord, MemoryStore, SizeEntry};
    use crate::test_helpers::{source_at, touch, write_test_png};
    use std::sync::mpsc;
    use tempfile::TempDir;

    fn config(origin_density: u32, formats: &[&str]) -> RunConfig {
        RunConfig {
            target_formats: formats.iter().map(|s| s.to_string()).collect(),
            origin_density,
            ..RunConfig::default()
        }
    }

    fn tracked(origin_density: u32, formats: &[&str]) -> RunConfig {
        RunConfig {
            add_metadata: true,
            ..config(origin_density, formats)
        }
    }

    fn relative_outputs(backend: &MockBackend, root: &Path) -> Vec<String> {
        backend
            .resized_outputs()
            .iter()
            .map(|o| {
                Path::new(o)
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    fn size(width: u32, height: u32, breakpoint: Option<u32>) -> SizeEntry {
        SizeEntry {
            width,
            height,
            breakpoint,
        }
    }

    // =========================================================================
    // Fan-out and progress
    // =========================================================================

    #[test]
    fn fans_out_formats_then_densities() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        let backend = MockBackend::with_dimensions(100, 100);
        let sources = vec![source_at(&input, "name.png")];

        let report = process_batch(
            &backend,
            &sources,
            &output,
            &config(2, &["avif", "webp"]),
            None,
            None,
        )
        .unwrap();

        assert_eq!(
            relative_outputs(&backend, &output),
            vec!["name@2x.avif", "name@1x.avif", "name@2x.webp", "name@1x.webp"]
        );
        let widths: Vec<u32> = backend
            .get_operations()
            .into_iter()
            .filter_map(|op| match op {
                RecordedOp::Resize { width, .. } => Some(width),
                RecordedOp::Identify(_) => None,
            })
            .collect();
        assert_eq!(widths, vec![100, 50, 100, 50]);
        assert_eq!(report.encoded, 4);
        assert_eq!(report.processed, 1);
    }

    #[test]
    fn progress_counts_up_to_precomputed_total() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        let backend = MockBackend::with_dimensions(64, 64);
        let sources = vec![source_at(&input, "a.png"), source_at(&input, "b.png")];
        let (tx, rx) = mpsc::channel();

        process_batch(
            &backend,
            &sources,
            &tmp.path().join("out"),
            &config(3, &["avif"]),
            None,
            Some(tx),
        )
        .unwrap();

        let events: Vec<ProcessEvent> = rx.iter().collect();
        assert_eq!(
            events[0],
            ProcessEvent::BatchStarted {
                images: 2,
                total_units: 6
            }
        );
        let counts: Vec<(usize, usize)> = events
            .iter()
            .filter_map(|e| match e {
                ProcessEvent::UnitCompleted {
                    completed, total, ..
                } => Some((*completed, *total)),
                _ => None,
            })
            .collect();
        assert_eq!(counts, (1..=6).map(|n| (n, 6)).collect::<Vec<_>>());
    }

    #[test]
    fn mirrors_subfolders_under_output_root() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        let backend = MockBackend::with_dimensions(10, 10);
        let sources = vec![source_at(&input, "blog/2024/cover.jpg")];

        process_batch(&backend, &sources, &output, &config(0, &["webp"]), None, None).unwrap();

        assert!(output.join("blog/2024").is_dir());
        assert_eq!(relative_outputs(&backend, &output), vec!["blog/2024/cover.webp"]);
    }

    #[test]
    fn output_equal_to_source_is_counted_not_written() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("site");
        let backend = MockBackend::with_dimensions(10, 10);
        let sources = vec![source_at(&root, "logo.avif")];

        let report =
            process_batch(&backend, &sources, &root, &config(0, &["avif"]), None, None).unwrap();

        assert!(backend.resized_outputs().is_empty());
        assert_eq!(report.unchanged, 1);
        assert_eq!(report.completed_units, 1);
        assert_eq!(report.processed, 1);
    }

    // =========================================================================
    // Failure isolation
    // =========================================================================

    #[test]
    fn probe_failure_is_isolated_to_one_image() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        let backend = MockBackend::with_dimensions(200, 100);
        let sources = vec![
            source_at(&input, "one.png"),
            source_at(&input, "two.png"),
            source_at(&input, "three.png"),
        ];
        backend.fail_identify(sources[1].path.clone());
        let mut store = MemoryStore::new();

        let report = process_batch(
            &backend,
            &sources,
            &output,
            &tracked(1, &["avif", "webp"]),
            Some(&mut store),
            None,
        )
        .unwrap();

        assert_eq!(
            relative_outputs(&backend, &output),
            vec!["one@1x.avif", "one@1x.webp", "three@1x.avif", "three@1x.webp"]
        );
        assert_eq!(report.processed, 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].source_path, sources[1].path);
        assert!(report.failed[0].message.contains("corrupt header"));

        assert!(store.get("one").is_some());
        assert!(store.get("two").is_none());
        assert_eq!(store.get("three").unwrap().sizes, vec![size(200, 100, None)]);
        assert_eq!(store.flushes, 1);
    }

    #[test]
    fn encode_failure_keeps_source_and_skips_finalize() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        let backend = MockBackend::with_dimensions(50, 50);
        let sources = vec![source_at(&input, "bad.png"), source_at(&input, "good.png")];
        touch(&sources[0].path);
        touch(&sources[1].path);
        backend.fail_resize(sources[0].path.clone());
        let mut store = MemoryStore::new();
        let cfg = RunConfig {
            remove_origin: true,
            ..tracked(2, &["avif"])
        };
        let (tx, rx) = mpsc::channel();

        let report = process_batch(
            &backend,
            &sources,
            &tmp.path().join("out"),
            &cfg,
            Some(&mut store),
            Some(tx),
        )
        .unwrap();

        assert!(sources[0].path.exists());
        assert!(!sources[1].path.exists());
        assert!(store.get("bad").is_none());
        assert!(store.get("good").is_some());
        assert_eq!(report.removed, 1);
        assert_eq!(report.completed_units, 2);
        assert_eq!(report.total_units, 4);

        let events: Vec<ProcessEvent> = rx.iter().collect();
        assert!(events.iter().any(|e| matches!(
            e,
            ProcessEvent::ImageFailed { source_path, .. } if *source_path == sources[0].path
        )));
        assert!(events.iter().any(|e| matches!(
            e,
            ProcessEvent::SourceRemoved { source_path } if *source_path == sources[1].path
        )));
    }

    // =========================================================================
    // Source removal
    // =========================================================================

    #[test]
    fn remove_origin_deletes_source_after_success() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        let backend = MockBackend::with_dimensions(20, 20);
        let sources = vec![source_at(&input, "hero.jpg")];
        touch(&sources[0].path);
        let cfg = RunConfig {
            remove_origin: true,
            ..config(0, &["webp"])
        };

        let report = process_batch(&backend, &sources, &input, &cfg, None, None).unwrap();

        assert!(!sources[0].path.exists());
        assert_eq!(report.removed, 1);
    }

    #[test]
    fn remove_origin_keeps_source_that_is_its_own_derivative() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("site");
        let backend = MockBackend::with_dimensions(20, 20);
        let sources = vec![source_at(&root, "hero.webp")];
        touch(&sources[0].path);
        let cfg = RunConfig {
            remove_origin: true,
            ..config(0, &["avif", "webp"])
        };

        let report = process_batch(&backend, &sources, &root, &cfg, None, None).unwrap();

        assert!(sources[0].path.exists());
        assert_eq!(report.removed, 0);
        assert_eq!(report.encoded, 1);
        assert_eq!(report.unchanged, 1);
    }

    #[test]
    fn failed_removal_aborts_the_batch() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        let backend = MockBackend::with_dimensions(20, 20);
        // never created on disk
        let sources = vec![source_at(&input, "ghost.jpg")];
        let cfg = RunConfig {
            remove_origin: true,
            ..config(0, &["webp"])
        };

        let result = process_batch(&backend, &sources, &tmp.path().join("out"), &cfg, None, None);
        assert!(matches!(result, Err(ProcessError::RemoveSource { .. })));
    }

    // =========================================================================
    // Metadata reconciliation
    // =========================================================================

    #[test]
    fn mismatched_record_skips_image_entirely() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        let backend = MockBackend::with_dimensions(100, 100);
        let stored = ImageRecord {
            max_density: 2,
            formats: vec!["avif".into()],
            sizes: vec![size(50, 50, None)],
            extra: Default::default(),
        };
        let mut doc = DataDocument::default();
        doc.images.insert("hero".into(), stored.clone());
        let mut store = MemoryStore::with_document(doc);
        let sources = vec![source_at(&input, "hero.png")];
        let (tx, rx) = mpsc::channel();

        let report = process_batch(
            &backend,
            &sources,
            &tmp.path().join("out"),
            &tracked(1, &["avif"]),
            Some(&mut store),
            Some(tx),
        )
        .unwrap();

        assert!(backend.get_operations().is_empty());
        assert_eq!(store.get("hero"), Some(&stored));
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(
            report.skipped[0].reason,
            SkipReason::DensityMismatch {
                stored: 2,
                requested: 1
            }
        );
        assert!(
            rx.iter()
                .any(|e| matches!(e, ProcessEvent::ImageSkipped { image_name, .. } if image_name == "hero"))
        );
    }

    #[test]
    fn breakpoint_variants_merge_into_one_record() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        let backend = MockBackend::new();
        let sources = vec![
            source_at(&input, "hero~1024.png"),
            source_at(&input, "hero~480.png"),
        ];
        backend.set_dimensions(sources[0].path.clone(), 2048, 1024);
        backend.set_dimensions(sources[1].path.clone(), 960, 480);
        let mut store = MemoryStore::new();

        process_batch(
            &backend,
            &sources,
            &output,
            &tracked(2, &["avif"]),
            Some(&mut store),
            None,
        )
        .unwrap();

        assert_eq!(
            relative_outputs(&backend, &output),
            vec![
                "hero~1024@2x.avif",
                "hero~1024@1x.avif",
                "hero~480@2x.avif",
                "hero~480@1x.avif"
            ]
        );
        let record = store.get("hero").unwrap();
        assert_eq!(record.max_density, 2);
        assert_eq!(
            record.sizes,
            vec![size(480, 240, Some(480)), size(1024, 512, Some(1024))]
        );
    }

    #[test]
    fn second_identical_run_leaves_metadata_unchanged() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        let backend = MockBackend::with_dimensions(300, 200);
        let sources = vec![source_at(&input, "a.png"), source_at(&input, "b~640.png")];
        let cfg = tracked(2, &["avif", "webp"]);
        let mut store = MemoryStore::new();

        process_batch(&backend, &sources, &output, &cfg, Some(&mut store), None).unwrap();
        let first = store.document.clone();
        process_batch(&backend, &sources, &output, &cfg, Some(&mut store), None).unwrap();

        assert_eq!(store.document, first);
        assert_eq!(store.flushes, 2);
    }

    #[test]
    fn empty_batch_still_persists_when_tracking() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let mut store = MemoryStore::new();

        let report = process_batch(
            &backend,
            &[],
            tmp.path(),
            &tracked(2, &["avif"]),
            Some(&mut store),
            None,
        )
        .unwrap();

        assert_eq!(store.flushes, 1);
        assert!(report.metadata_persisted);
    }

    #[test]
    fn no_persist_when_tracking_is_off() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        let backend = MockBackend::with_dimensions(10, 10);
        let mut store = MemoryStore::new();

        let report = process_batch(
            &backend,
            &[source_at(&input, "a.png")],
            &tmp.path().join("out"),
            &config(1, &["avif"]),
            Some(&mut store),
            None,
        )
        .unwrap();

        assert_eq!(store.flushes, 0);
        assert!(store.document.images.is_empty());
        assert!(!report.metadata_persisted);
    }

    // =========================================================================
    // process (discovery + real codec)
    // =========================================================================

    #[test]
    fn process_discovers_and_encodes_rasters_only() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        write_test_png(&input.join("nested/photo.png"), 30, 20);
        touch(&input.join("logo.svg"));

        let report = process(&input, &output, &config(0, &["jpeg"]), None, None).unwrap();

        assert_eq!(report.images, 1);
        assert_eq!(report.encoded, 1);
        assert_eq!(
            image::image_dimensions(output.join("nested/photo.jpeg")).unwrap(),
            (30, 20)
        );
        assert!(!report.metadata_persisted);
    }

    #[test]
    fn process_rejects_corrupt_metadata_document() {
        let tmp = TempDir::new().unwrap();
        let data = tmp.path().join("data.json");
        std::fs::write(&data, "{ nope").unwrap();

        let result = process(
            tmp.path(),
            tmp.path(),
            &tracked(1, &["avif"]),
            Some(&data),
            None,
        );
        assert!(matches!(result, Err(ProcessError::Store(StoreError::Json { .. }))));
    }

    // =========================================================================
    // BatchReport display
    // =========================================================================

    #[test]
    fn report_summary_line() {
        let report = BatchReport {
            images: 3,
            processed: 2,
            failed: vec![FailedImage {
                source_path: "x.png".into(),
                message: "boom".into(),
            }],
            encoded: 7,
            unchanged: 1,
            completed_units: 8,
            total_units: 12,
            removed: 2,
            metadata_persisted: true,
            ..BatchReport::default()
        };
        assert_eq!(
            report.to_string(),
            "3 images (2 processed, 0 skipped, 1 failed), 8/12 derivatives (7 encoded, 1 unchanged), 2 sources removed, metadata saved"
        );
    }
}
