//! Image discovery.
//!
//! Walks an input directory recursively and splits the files it finds into
//! vector sources (`.svg`) and raster sources (`.jpg`, `.png`, `.webp`, ...).
//!
//! ## Density variants are never sources
//!
//! A previous run with a non-zero origin density leaves files like
//! `hero@2x.avif` and `hero@1x.webp` next to (or instead of) the original.
//! Those are outputs, not inputs: any raster file whose name contains an
//! `@<digits>x.` marker is excluded, so re-running the optimizer over its own
//! output directory never fans out derivatives of derivatives.
//!
//! ## Missing directories
//!
//! Discovery never fails. A root that does not exist or cannot be read simply
//! yields no files; unreadable entries below the root are skipped.
//!
//! ## Ordering
//!
//! Entries are visited sorted by file name within each directory, so the
//! discovery order (and therefore derivative and progress order) is stable
//! across runs and platforms.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;
use walkdir::WalkDir;

/// Raster extensions accepted as sources (compared case-insensitively).
pub const RASTER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "avif", "gif", "tiff"];

/// Vector extensions accepted as sources (compared case-insensitively).
pub const VECTOR_EXTENSIONS: &[&str] = &["svg"];

static DENSITY_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\d+x\.").expect("static regex must compile"));

/// Files found under an input directory, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovered {
    pub vector_paths: Vec<PathBuf>,
    pub raster_paths: Vec<PathBuf>,
}

/// Whether a file name carries a generated density suffix (`name@2x.avif`).
pub fn is_density_variant(file_name: &str) -> bool {
    DENSITY_SUFFIX.is_match(file_name)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| extensions.contains(&ext.as_str()))
}

fn is_raster_source(path: &Path) -> bool {
    if !has_extension(path, RASTER_EXTENSIONS) {
        return false;
    }
    let name = path
        .file_name()
        .map(|f| f.to_string_lossy())
        .unwrap_or_default();
    !is_density_variant(&name)
}

/// Discover vector and raster sources under `root`.
pub fn discover(root: &Path) -> Discovered {
    let mut found = Discovered::default();

    let files = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path());

    for path in files {
        if has_extension(&path, VECTOR_EXTENSIONS) {
            found.vector_paths.push(path);
        } else if is_raster_source(&path) {
            found.raster_paths.push(path);
        }
    }

    debug!(
        root = %root.display(),
        vectors = found.vector_paths.len(),
        rasters = found.raster_paths.len(),
        "discovery finished"
    );
    found
}
