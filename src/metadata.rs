//! Metadata reconciliation.
//!
//! The [`Reconciler`] decides, per logical image, whether the current run may
//! touch its metadata record, collects size observations while derivatives
//! are generated, and commits the cleaned-up record back to the
//! [`MetadataStore`].
//!
//! ## Lifecycle per image
//!
//! ```text
//! prepare(name) ──Skip──▶ (image not processed, stored record untouched)
//!      │
//!   Proceed
//!      ▼
//! add_size_info(name, ...)   zero or more times
//!      ▼
//! finalize(name)             dedupe + sort sizes, commit to store
//! ```
//!
//! After the batch, [`Reconciler::persist`] flushes the store once.
//!
//! ## Skip on configuration mismatch
//!
//! A stored record remembers the origin density and format set its sizes were
//! produced with. If the current run uses a different density, or a format set
//! that differs ignoring case and order, the image is skipped entirely rather
//! than merged: mixing sizes from two configurations would hand inconsistent
//! data to whatever renders responsive markup from it. The operator either
//! keeps the configuration stable or removes the record by hand.
//!
//! ## Disabled tracking
//!
//! Tracking is on only when a store is attached *and* the run asks for
//! metadata. Otherwise every operation is a no-op and `prepare` always
//! proceeds.

use crate::imaging::Dimensions;
use crate::imaging::calculations::density_independent;
use crate::store::{ImageRecord, MetadataStore, SizeEntry, StoreError};
use crate::types::RunConfig;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::info;

/// Why an image was left alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    DensityMismatch { stored: u32, requested: u32 },
    FormatsMismatch { stored: Vec<String>, requested: Vec<String> },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::DensityMismatch { stored, requested } => write!(
                f,
                "stored maxDensity {} does not match the requested origin density {}",
                stored, requested
            ),
            SkipReason::FormatsMismatch { stored, requested } => write!(
                f,
                "stored formats [{}] do not match the requested formats [{}]",
                stored.join(", "),
                requested.join(", ")
            ),
        }
    }
}

/// Outcome of [`Reconciler::prepare`].
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preparation {
    /// Process the image. `existing` is true when a stored record is being extended.
    Proceed { existing: bool },
    /// Do not process the image.
    Skip(SkipReason),
}

/// Case-insensitive, order-insensitive comparison of format lists.
pub fn same_formats(a: &[String], b: &[String]) -> bool {
    let lower = |list: &[String]| -> HashSet<String> {
        list.iter().map(|s| s.to_lowercase()).collect()
    };
    lower(a) == lower(b)
}

/// Tracks in-flight metadata for the images of one batch.
pub struct Reconciler<'s> {
    store: Option<&'s mut dyn MetadataStore>,
    enabled: bool,
    origin_density: u32,
    formats: Vec<String>,
    working: HashMap<String, ImageRecord>,
}

impl<'s> Reconciler<'s> {
    /// Build a reconciler for `config`.
    pub fn new(store: Option<&'s mut dyn MetadataStore>, config: &RunConfig) -> Self {
        Self {
            enabled: config.add_metadata && store.is_some(),
            store,
            origin_density: config.origin_density,
            formats: config.target_formats.clone(),
            working: HashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Decide whether `image_name` may be processed and open its working record.
    ///
    /// A new record is seeded from the run configuration. An existing record
    /// is reused only when its density and formats match the current run.
    pub fn prepare(&mut self, image_name: &str) -> Preparation {
        let store = match self.store.as_deref() {
            Some(store) if self.enabled => store,
            _ => return Preparation::Proceed { existing: false },
        };

        let Some(stored) = store.get(image_name) else {
            self.working.insert(
                image_name.to_string(),
                ImageRecord::new(self.origin_density, self.formats.clone()),
            );
            return Preparation::Proceed { existing: false };
        };

        let mismatch = if stored.max_density != self.origin_density {
            Some(SkipReason::DensityMismatch {
                stored: stored.max_density,
                requested: self.origin_density,
            })
        } else if !same_formats(&stored.formats, &self.formats) {
            Some(SkipReason::FormatsMismatch {
                stored: stored.formats.clone(),
                requested: self.formats.clone(),
            })
        } else {
            None
        };

        match mismatch {
            Some(reason) => {
                info!(image = image_name, %reason, "processing skipped");
                self.working.remove(image_name);
                Preparation::Skip(reason)
            }
            None => {
                self.working
                    .insert(image_name.to_string(), stored.clone());
                Preparation::Proceed { existing: true }
            }
        }
    }

    /// Record the intrinsic size of one source variant of `image_name`.
    ///
    /// Device pixels are converted to density-independent units.
    pub fn add_size_info(&mut self, image_name: &str, dims: Dimensions, breakpoint: Option<u32>) {
        if !self.enabled {
            return;
        }
        let Some(record) = self.working.get_mut(image_name) else {
            return;
        };
        record.sizes.push(SizeEntry {
            width: density_independent(dims.width, self.origin_density),
            height: density_independent(dims.height, self.origin_density),
            breakpoint,
        });
    }

    /// Clean up the working record of `image_name` and commit it to the store.
    pub fn finalize(&mut self, image_name: &str) {
        if !self.enabled {
            return;
        }
        let Some(mut record) = self.working.remove(image_name) else {
            return;
        };
        record.normalize_sizes();
        if let Some(store) = self.store.as_deref_mut() {
            store.commit(image_name, record);
        }
    }

    /// Flush the store. Does nothing when tracking is disabled.
    pub fn persist(&mut self) -> Result<(), StoreError> {
        match self.store.as_deref_mut() {
            Some(store) if self.enabled => store.flush(),
            _ => Ok(()),
        }
    }
}
