//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the fan-out planner in [`operations`](super::operations)
//! (which decides which derivatives to create) and the
//! [`backend`](super::backend) (which does the actual pixel work). This
//! separation allows swapping backends (e.g. for testing with a mock) without
//! changing the fan-out logic.
//!
//! ## Types
//!
//! - [`Quality`]: lossy encoding quality (1-100, default 80), clamped on construction.
//! - [`ResizeParams`]: one derivative's source, output path, target
//!   dimensions, output format name and quality.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

impl From<u32> for Quality {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<Quality> for u32 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

/// Parameters for a resize + re-encode operation.
///
/// `format` is the caller-supplied format name (`"avif"`, `"WebP"`, ...).
/// It is passed through untouched; the backend decides whether it can encode it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub quality: Quality,
}
