//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the pipeline needs
//! from an image codec: probe the intrinsic dimensions of a source, and
//! resize + re-encode it to a named output format.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use the recording `MockBackend` in this module.

use super::params::ResizeParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image codec backends.
///
/// Failures surface as a single [`BackendError`] per operation; the batch
/// driver decides whether that aborts anything beyond the current image.
pub trait ImageBackend {
    /// Get the intrinsic pixel dimensions of an image.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Resize the source to the given dimensions and encode it as `params.format`.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;
}
