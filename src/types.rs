//! Shared types used across discovery, fan-out and the batch driver.

use crate::imaging::Quality;
use crate::imaging::calculations::actual_density;
use std::path::{Component, Path, PathBuf};

/// Caller-supplied settings for one batch run. Immutable per invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Output format names in the order derivatives are generated.
    /// Compared case-insensitively against stored metadata.
    pub target_formats: Vec<String>,
    /// Pixel density of the source images. `0` generates a single unsuffixed
    /// derivative per format; `n > 0` generates densities `n..=1` with `@Nx` suffixes.
    pub origin_density: u32,
    /// Delete each source once all its derivatives are written.
    pub remove_origin: bool,
    /// Track size/format metadata for each logical image.
    pub add_metadata: bool,
    /// Lossy encoding quality passed to the codec.
    pub quality: Quality,
}

impl RunConfig {
    /// Number of density levels generated per format.
    pub fn actual_density(&self) -> u32 {
        actual_density(self.origin_density)
    }

    /// Derivatives produced per source image.
    pub fn units_per_image(&self) -> usize {
        self.target_formats.len() * self.actual_density() as usize
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            target_formats: vec!["avif".to_string()],
            origin_density: 0,
            remove_origin: false,
            add_metadata: false,
            quality: Quality::default(),
        }
    }
}

/// A raster source discovered under the input root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    /// Full path to the source file.
    pub path: PathBuf,
    /// Directory of the source relative to the input root (empty at the root).
    /// Mirrored under the output root.
    pub subfolder: PathBuf,
    /// File name with its extension.
    pub file_name: String,
}

impl SourceImage {
    /// Build a source from a discovered path and the root it was found under.
    pub fn new(path: PathBuf, input_root: &Path) -> Self {
        let subfolder = path
            .parent()
            .and_then(|parent| parent.strip_prefix(input_root).ok())
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let file_name = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            subfolder,
            file_name,
        }
    }

    /// Directory the derivatives of this source are written to.
    pub fn destination_dir(&self, output_root: &Path) -> PathBuf {
        if self.subfolder.as_os_str().is_empty() {
            output_root.to_path_buf()
        } else {
            output_root.join(&self.subfolder)
        }
    }
}

/// Resolve `path` against the working directory and drop `.` and `..`
/// components without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Whether two paths name the same file, however each is spelled.
pub fn same_path(a: &Path, b: &Path) -> bool {
    a == b || normalize_path(a) == normalize_path(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_per_image_multiplies_formats_and_density() {
        let config = RunConfig {
            target_formats: vec!["avif".into(), "webp".into()],
            origin_density: 3,
            ..RunConfig::default()
        };
        assert_eq!(config.units_per_image(), 6);
    }

    #[test]
    fn units_per_image_zero_density_counts_once() {
        let config = RunConfig {
            target_formats: vec!["avif".into(), "webp".into()],
            origin_density: 0,
            ..RunConfig::default()
        };
        assert_eq!(config.units_per_image(), 2);
    }

    #[test]
    fn source_image_at_root_has_empty_subfolder() {
        let src = SourceImage::new("/in/hero.jpg".into(), Path::new("/in"));
        assert_eq!(src.subfolder, PathBuf::new());
        assert_eq!(src.file_name, "hero.jpg");
        assert_eq!(src.destination_dir(Path::new("/out")), PathBuf::from("/out"));
    }

    #[test]
    fn source_image_mirrors_nested_subfolder() {
        let src = SourceImage::new("/in/blog/2024/cover.png".into(), Path::new("/in"));
        assert_eq!(src.subfolder, PathBuf::from("blog/2024"));
        assert_eq!(
            src.destination_dir(Path::new("/out")),
            PathBuf::from("/out/blog/2024")
        );
    }

    // =========================================================================
    // Path comparison
    // =========================================================================

    #[test]
    fn normalize_drops_cur_and_parent_components() {
        assert_eq!(
            normalize_path(Path::new("/in/./photos/../photos/hero.png")),
            PathBuf::from("/in/photos/hero.png")
        );
    }

    #[test]
    fn same_path_ignores_leading_cur_dir() {
        assert!(same_path(
            Path::new("./photos/hero.png"),
            Path::new("photos/hero.png")
        ));
    }

    #[test]
    fn same_path_matches_relative_and_absolute_spellings() {
        let cwd = std::env::current_dir().unwrap();
        assert!(same_path(
            Path::new("photos/hero.png"),
            &cwd.join("photos/hero.png")
        ));
    }

    #[test]
    fn same_path_tells_different_files_apart() {
        assert!(!same_path(
            Path::new("photos/hero.png"),
            Path::new("photos/hero.avif")
        ));
        assert!(!same_path(Path::new("a/hero.png"), Path::new("b/hero.png")));
    }
}
