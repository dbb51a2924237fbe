//! Command configuration.
//!
//! Handles loading, validating, and merging `optimize.toml`. Stock defaults are
//! overridden by the user's file, which is in turn overridden by command-line
//! flags (applied by the binary).
//!
//! ## Config File Location
//!
//! `optimize.toml` in the working directory, or any file passed with
//! `--config`.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [images]
//! input_directory = "./"
//! # output_directory = "./"       # defaults to input_directory
//! origin_density = 0               # 0 = no @Nx suffixes
//! target_formats = ["avif"]
//! remove_origin = false
//! quality = 80
//!
//! [assets]
//! public_directory = "./public/"   # rasters live in <public>/images
//! shared_directory = "./src/shared/" # metadata lives in <shared>/data.json
//! origin_density = 2
//! target_formats = ["avif", "webp"]
//! remove_origin = true
//! add_meta_data = true
//! quality = 80
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse, override just the values you want:
//!
//! ```toml
//! [assets]
//! target_formats = ["avif"]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::Quality;
use crate::types::RunConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "optimize.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration for both commands, loaded from `optimize.toml`.
///
/// All fields have defaults. User files need only specify the values they
/// want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizeConfig {
    /// Settings for the `images` command.
    pub images: ImagesConfig,
    /// Settings for the `assets` command.
    pub assets: AssetsConfig,
}

impl OptimizeConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_section("images", &self.images.target_formats, self.images.quality)?;
        validate_section("assets", &self.assets.target_formats, self.assets.quality)
    }
}

fn validate_section(section: &str, formats: &[String], quality: u32) -> Result<(), ConfigError> {
    if formats.is_empty() {
        return Err(ConfigError::Validation(format!(
            "{section}.target_formats must not be empty"
        )));
    }
    if formats.iter().any(|f| f.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "{section}.target_formats must not contain empty names"
        )));
    }
    if !(1..=100).contains(&quality) {
        return Err(ConfigError::Validation(format!(
            "{section}.quality must be 1-100"
        )));
    }
    Ok(())
}

/// Settings for optimizing an arbitrary directory of images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Directory searched recursively for source images.
    pub input_directory: String,
    /// Directory derivatives are written to. Defaults to the input directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_directory: Option<String>,
    /// Pixel density of the sources (0 = no density suffixes).
    pub origin_density: u32,
    /// Output formats, in generation order.
    pub target_formats: Vec<String>,
    /// Delete each source once its derivatives are written.
    pub remove_origin: bool,
    /// Lossy encoding quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            input_directory: "./".to_string(),
            output_directory: None,
            origin_density: 0,
            target_formats: vec!["avif".to_string()],
            remove_origin: false,
            quality: 80,
        }
    }
}

impl ImagesConfig {
    pub fn input_dir(&self) -> PathBuf {
        PathBuf::from(&self.input_directory)
    }

    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(
            self.output_directory
                .as_deref()
                .unwrap_or(&self.input_directory),
        )
    }

    /// Run settings for the `images` command. Metadata is never tracked.
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            target_formats: self.target_formats.clone(),
            origin_density: self.origin_density,
            remove_origin: self.remove_origin,
            add_metadata: false,
            quality: Quality::new(self.quality),
        }
    }
}

/// Settings for optimizing a web project's asset tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetsConfig {
    /// Public asset root. Raster sources live in its `images` subdirectory.
    pub public_directory: String,
    /// Shared source directory holding the `data.json` metadata document.
    pub shared_directory: String,
    pub origin_density: u32,
    pub target_formats: Vec<String>,
    pub remove_origin: bool,
    /// Record per-image sizes in `data.json`.
    pub add_meta_data: bool,
    pub quality: u32,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            public_directory: "./public/".to_string(),
            shared_directory: "./src/shared/".to_string(),
            origin_density: 2,
            target_formats: vec!["avif".to_string(), "webp".to_string()],
            remove_origin: true,
            add_meta_data: true,
            quality: 80,
        }
    }
}

impl AssetsConfig {
    /// `<public>/images`: both the input and the output directory.
    pub fn images_dir(&self) -> PathBuf {
        Path::new(&self.public_directory).join("images")
    }

    /// `<shared>/data.json`.
    pub fn metadata_path(&self) -> PathBuf {
        Path::new(&self.shared_directory).join("data.json")
    }

    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            target_formats: self.target_formats.clone(),
            origin_density: self.origin_density,
            remove_origin: self.remove_origin,
            add_metadata: self.add_meta_data,
            quality: Quality::new(self.quality),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(OptimizeConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<OptimizeConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: OptimizeConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `optimize.toml` from `dir`, falling back to stock defaults when absent.
pub fn load_config(dir: &Path) -> Result<OptimizeConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(&dir.join(CONFIG_FILE_NAME))?)
}

/// Load an explicitly named config file. The file must exist.
pub fn load_config_file(path: &Path) -> Result<OptimizeConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let overlay: toml::Value = toml::from_str(&content)?;
    resolve_config(stock_defaults_value(), Some(overlay))
}

/// Returns a fully-commented stock `optimize.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# optimize configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Command-line flags override them.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# `optimize images`: any directory of raster images
# ---------------------------------------------------------------------------
[images]
# Directory searched recursively for .jpg .jpeg .png .webp .avif .gif .tiff.
# Files named like `name@2x.avif` are treated as generated and ignored.
input_directory = "./"

# Where derivatives are written, mirroring subfolders of the input.
# Defaults to the input directory.
# output_directory = "./dist/images/"

# Pixel density of the source images. With 0, one derivative per format is
# written without a suffix (hero.avif). With N > 0, densities N down to 1
# are written as hero@Nx.avif ... hero@1x.avif.
origin_density = 0

# Output formats, generated in this order: avif, webp, png, jpeg, gif, tiff.
target_formats = ["avif"]

# Delete each source after all its derivatives are written.
remove_origin = false

# Lossy encoding quality (1 = worst, 100 = best). WebP output is lossless.
quality = 80

# ---------------------------------------------------------------------------
# `optimize assets`: a web project's public/images + shared metadata
# ---------------------------------------------------------------------------
[assets]
# Raster sources are read from and written to <public_directory>/images.
public_directory = "./public/"

# Per-image sizes are recorded in <shared_directory>/data.json.
# Other top-level fields of that document are left untouched.
shared_directory = "./src/shared/"

origin_density = 2
target_formats = ["avif", "webp"]
remove_origin = true

# Record sizes and formats per logical image (name~768.png and name.png
# share the record "name"). An image whose stored density or formats differ
# from this run is skipped rather than mixed.
add_meta_data = true

quality = 80
"##
}
