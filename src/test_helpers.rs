//! Shared fixture builders for unit tests.
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let src = source_at(tmp.path(), "blog/cover~768.png");
//! write_test_png(&src.path, 64, 32);
//! ```

use crate::types::SourceImage;
use image::{Rgb, RgbImage};
use std::path::Path;

// =========================================================================
// Filesystem fixtures
// =========================================================================

/// Create an empty file at `path`, including missing parent directories.
pub fn touch(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, b"").unwrap();
}

/// Write a small gradient PNG at `path`, including missing parent directories.
pub fn write_test_png(path: &Path, width: u32, height: u32) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 96])
    });
    img.save_with_format(path, image::ImageFormat::Png).unwrap();
}

// =========================================================================
// Source builders
// =========================================================================

/// A [`SourceImage`] at `root/rel`, as discovery would produce it.
/// Nothing is written to disk.
pub fn source_at(root: &Path, rel: &str) -> SourceImage {
    SourceImage::new(root.join(rel), root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_at_splits_subfolder() {
        let src = source_at(Path::new("/in"), "a/b/c.png");
        assert_eq!(src.subfolder, Path::new("a/b"));
        assert_eq!(src.file_name, "c.png");
    }
}
