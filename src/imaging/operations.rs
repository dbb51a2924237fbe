//! Derivative fan-out.
//!
//! One source image fans out into `formats × densities` derivatives. Planning
//! is pure ([`plan_fan_out`]) and returns the full list in generation order;
//! execution ([`generate_derivatives`]) walks the plan and calls the backend.
//!
//! ## Order
//!
//! Formats are the outer loop (in configured order), densities the inner loop
//! from the origin density down to 1:
//!
//! ```text
//! origin 2, [avif, webp] → hero@2x.avif, hero@1x.avif, hero@2x.webp, hero@1x.webp
//! origin 0, [avif]       → hero.avif
//! ```
//!
//! ## Unchanged outputs
//!
//! When a derivative's output path is the source path itself (same format,
//! density 0, output directory equal to the input directory) nothing is
//! encoded. The derivative still counts as a completed unit. Paths are
//! compared after normalization, so `./photos` and `photos` are one
//! directory.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{proportional_height, scaled_width};
use super::params::{Quality, ResizeParams};
use crate::naming::Identity;
use crate::types::{RunConfig, same_path};
use std::path::{Path, PathBuf};

/// What executing a [`Derivative`] involves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivativeAction {
    /// Resize and encode the source into the output path.
    Encode,
    /// The output path is the source; nothing to do.
    Unchanged,
}

/// One planned output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derivative {
    pub format: String,
    /// Density level of this output (1 when the origin density is 0).
    pub density: u32,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub action: DerivativeAction,
}

/// File name of one derivative: `<base>[@<density>x].<format>`.
///
/// The density suffix is omitted when the origin density is 0.
pub fn output_file_name(base_name: &str, density: u32, origin_density: u32, format: &str) -> String {
    if origin_density == 0 {
        format!("{}.{}", base_name, format)
    } else {
        format!("{}@{}x.{}", base_name, density, format)
    }
}

/// Plan every derivative of one source, in generation order.
pub fn plan_fan_out(
    source_path: &Path,
    identity: &Identity,
    dims: Dimensions,
    config: &RunConfig,
    dest_dir: &Path,
) -> Vec<Derivative> {
    let actual = config.actual_density();
    let mut plan = Vec::with_capacity(config.units_per_image());

    for format in &config.target_formats {
        for density in (1..=actual).rev() {
            let name = output_file_name(&identity.base_name, density, config.origin_density, format);
            let output = dest_dir.join(name);
            let width = scaled_width(dims.width, density, actual);
            let action = if same_path(&output, source_path) {
                DerivativeAction::Unchanged
            } else {
                DerivativeAction::Encode
            };
            plan.push(Derivative {
                format: format.clone(),
                density,
                output,
                width,
                height: proportional_height((dims.width, dims.height), width),
                action,
            });
        }
    }
    plan
}

/// Total derivative count of a batch of `image_count` sources.
pub fn expected_units(image_count: usize, config: &RunConfig) -> usize {
    image_count * config.units_per_image()
}

/// Execute a plan against the backend.
///
/// `on_unit` is called after each derivative completes, including unchanged
/// ones. The first backend failure stops the plan and is returned; the
/// derivatives before it stay on disk.
pub fn generate_derivatives(
    backend: &impl ImageBackend,
    source_path: &Path,
    plan: &[Derivative],
    quality: Quality,
    mut on_unit: impl FnMut(&Derivative),
) -> Result<(), BackendError> {
    for derivative in plan {
        if derivative.action == DerivativeAction::Encode {
            backend.resize(&ResizeParams {
                source: source_path.to_path_buf(),
                output: derivative.output.clone(),
                width: derivative.width,
                height: derivative.height,
                format: derivative.format.clone(),
                quality,
            })?;
        }
        on_unit(derivative);
    }
    Ok(())
}
