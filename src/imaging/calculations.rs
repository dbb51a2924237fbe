//! Pure calculation functions for pixel densities and dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Resolve the number of density levels to generate.
///
/// An origin density of `0` means "density 1, but without `@Nx` suffixes".
pub fn actual_density(origin_density: u32) -> u32 {
    if origin_density == 0 { 1 } else { origin_density }
}

/// Width of the derivative for one density level.
///
/// Scales the source width by `density / actual_density`, rounding up.
///
/// # Examples
/// ```
/// # use optimize_assets::imaging::calculations::scaled_width;
/// // 2x source, 1x derivative
/// assert_eq!(scaled_width(100, 1, 2), 50);
/// // 3x source, 1x derivative of an odd width rounds up
/// assert_eq!(scaled_width(101, 1, 3), 34);
/// ```
pub fn scaled_width(source_width: u32, density: u32, actual_density: u32) -> u32 {
    (u64::from(source_width) * u64::from(density)).div_ceil(u64::from(actual_density)) as u32
}

/// Height that preserves the source aspect ratio at `target_width`.
///
/// Rounded to the nearest pixel, never below 1.
pub fn proportional_height(source: (u32, u32), target_width: u32) -> u32 {
    let (src_w, src_h) = source;
    if src_w == 0 {
        return src_h.max(1);
    }
    let h = (src_h as f64 * target_width as f64 / src_w as f64).round() as u32;
    h.max(1)
}

/// Convert device pixels back to density-independent units.
///
/// Divides by the origin density (or 1 when it is 0), rounding up.
pub fn density_independent(pixels: u32, origin_density: u32) -> u32 {
    pixels.div_ceil(actual_density(origin_density))
}
