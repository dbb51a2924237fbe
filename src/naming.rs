//! Source file name parsing: logical image name and breakpoint marker.
//!
//! Source images may carry a breakpoint tag appended to their base name with
//! a tilde: `hero~768.jpg` is the variant of the logical image `hero` meant
//! for a 768px-wide layout. The logical image name groups all variants under
//! one metadata record; the breakpoint is recorded alongside each variant's
//! size.
//!
//! ```text
//! hero.jpg          → base "hero",       image "hero", breakpoint None
//! hero~768.jpg      → base "hero~768",   image "hero", breakpoint Some(768)
//! hero~.jpg         → base "hero~",      image "hero~", breakpoint None
//! hero.min.jpg      → base "hero",       image "hero", breakpoint None
//! ```
//!
//! Derivatives are named after the *base* name (marker included), so
//! `hero~768.jpg` produces `hero~768@2x.avif`.
//!
//! ## Double extension strip
//!
//! Two extension-like suffixes are removed before parsing (`photo.min.jpg`
//! becomes `photo`). For single-extension names the second strip is a no-op.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static BREAKPOINT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?s)(.*?)(?:~(\d+))?$").expect("static regex must compile"));

/// Identity of a source image derived from its file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// File name with up to two extensions stripped; derivatives are named after it.
    pub base_name: String,
    /// Logical image name: base name minus a trailing `~<digits>` marker.
    pub image_name: String,
    /// Breakpoint parsed from the marker, if present.
    pub breakpoint: Option<u32>,
}

/// Strip one extension-like suffix, the way `Path::file_stem` does.
fn strip_extension(name: &str) -> &str {
    match Path::new(name).file_stem().and_then(|s| s.to_str()) {
        Some(stem) => stem,
        None => name,
    }
}

/// Derive the base name of a source file: its name with two extensions stripped.
pub fn base_name(file_name: &str) -> String {
    strip_extension(strip_extension(file_name)).to_string()
}

/// Parse a base name (extensions already stripped) into an [`Identity`].
///
/// A marker whose digits do not fit in a `u32` is kept as part of the name.
pub fn parse_identity(base_name: &str) -> Identity {
    let (image_name, breakpoint) = BREAKPOINT_MARKER
        .captures(base_name)
        .and_then(|caps| {
            let digits = caps.get(2)?;
            let number = digits.as_str().parse::<u32>().ok()?;
            let prefix = caps.get(1).map_or("", |m| m.as_str());
            Some((prefix.to_string(), Some(number)))
        })
        .unwrap_or_else(|| (base_name.to_string(), None));

    Identity {
        base_name: base_name.to_string(),
        image_name,
        breakpoint,
    }
}

/// Parse a source file name (with extension) into an [`Identity`].
pub fn identify_file(file_name: &str) -> Identity {
    parse_identity(&base_name(file_name))
}
