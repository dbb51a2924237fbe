//! Image processing.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions`, `avif-parse` for AVIF |
//! | **Resize** | `DynamicImage::resize_exact` with Lanczos3 |
//! | **Encode** | `image` codecs, chosen by format name |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for density and dimension math (unit testable)
//! - **Parameters**: Data structures describing one resize request
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Fan-out planning and execution over a backend

pub mod backend;
pub mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use operations::{
    Derivative, DerivativeAction, expected_units, generate_derivatives, output_file_name,
    plan_fan_out,
};
pub use params::{Quality, ResizeParams};
pub use rust_backend::RustBackend;
