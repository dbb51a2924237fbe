//! # optimize-assets
//!
//! A batch raster image optimizer. Every source image under a directory is
//! re-encoded into a set of target formats at every pixel density from the
//! source's origin density down to 1, and (optionally) the intrinsic size of
//! each logical image is recorded in a project-level JSON document for
//! responsive-image markup generators to consume.
//!
//! # Pipeline
//!
//! ```text
//! discover   input/          →  raster sources     (scan)
//! identify   hero~768.png    →  "hero", bp 768     (naming)
//! reconcile  data.json       →  proceed / skip     (metadata, store)
//! fan out    source          →  formats × densities (imaging)
//! drive      all of the above, one image at a time (process)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Recursive discovery of vector and raster sources, density-variant exclusion |
//! | [`naming`] | Base name and `~<breakpoint>` marker parsing |
//! | [`store`] | Metadata document model, `MetadataStore` trait, JSON file and in-memory stores |
//! | [`metadata`] | Per-image reconciliation: skip on config mismatch, size recording, dedupe |
//! | [`imaging`] | Codec backend trait, pure-Rust backend, density math, fan-out planning |
//! | [`process`] | Batch driver, progress events, batch report |
//! | [`types`] | `RunConfig` and `SourceImage` shared across modules |
//! | [`config`] | `optimize.toml` loading, merging over stock defaults, validation |
//! | [`output`] | CLI formatting of progress events and the batch report |
//!
//! # Design Decisions
//!
//! ## Sequential by Default
//!
//! Images and derivatives are produced strictly one after another. Peak memory
//! stays at one decoded image, and progress events arrive in a deterministic
//! order. Fan-out planning ([`imaging::plan_fan_out`]) is pure, so a parallel
//! driver can reuse it unchanged.
//!
//! ## Metadata as a Store
//!
//! The metadata document is loaded once, mutated in memory, and flushed once
//! at the end of the batch through the [`store::MetadataStore`] trait. The
//! reconciliation rules are unit-tested against [`store::MemoryStore`] with no
//! filesystem involved.
//!
//! ## Pure-Rust Imaging
//!
//! The [`imaging`] module uses the `image` crate (Lanczos3 resampling, AVIF
//! via rav1e) and `rav1d` for AVIF decoding. There are no system libraries to
//! install.

pub mod config;
pub mod imaging;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod process;
pub mod scan;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
