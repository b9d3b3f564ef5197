//! Reducer configuration.
//!
//! Handles loading, validating, and merging `reducer.toml`. User files are
//! sparse: stock defaults are the base layer and user values override them
//! key by key.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [density]
//! baseline = 72         # density at which images keep their original size
//! min = 10              # lowest value offered by the density control
//! max = 100             # highest value offered by the density control
//! default = 72          # initial density of a new session
//!
//! [output]
//! format = "image/webp" # image/webp or image/jpeg
//! quality = 0.9         # lossy quality, 0.0 (smallest) - 1.0 (best)
//! resample = "bilinear" # nearest | bilinear | catmull-rom | lanczos3
//!
//! [processing]
//! max_processes = 4     # Max parallel export workers (omit for auto = CPU cores)
//! ```
//!
//! ## Density Convention
//!
//! Output size is `original * density / baseline`. The baseline is the
//! classic 72 DPI screen reference, so the default density of 72 keeps the
//! original size and the 10–100 range reduces down to about 14%. Densities
//! above the baseline upscale; the range is what the control offers, not a
//! limit enforced on callers.
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{DensityRange, OutputFormat, Quality, Resampling};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up by [`load_config`].
pub const CONFIG_FILE_NAME: &str = "reducer.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Reducer configuration loaded from `reducer.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReducerConfig {
    /// Density control convention.
    pub density: DensityConfig,
    /// Encoding settings.
    pub output: OutputConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl ReducerConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.density;
        if !(d.baseline.is_finite() && d.baseline > 0.0) {
            return Err(ConfigError::Validation(
                "density.baseline must be positive".into(),
            ));
        }
        if !(d.min.is_finite() && d.min > 0.0) {
            return Err(ConfigError::Validation("density.min must be positive".into()));
        }
        if !(d.min <= d.default && d.default <= d.max) {
            return Err(ConfigError::Validation(
                "density must satisfy min <= default <= max".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 0.0-1.0".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Density control settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DensityConfig {
    /// Density at which output keeps the original pixel size.
    pub baseline: f64,
    /// Lowest density offered to users.
    pub min: f64,
    /// Highest density offered to users.
    pub max: f64,
    /// Density a new session starts with.
    pub default: f64,
}

impl DensityConfig {
    pub fn range(&self) -> DensityRange {
        DensityRange {
            min: self.min,
            max: self.max,
        }
    }
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            baseline: 72.0,
            min: 10.0,
            max: 100.0,
            default: 72.0,
        }
    }
}

/// Encoding settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Target mime type.
    pub format: OutputFormat,
    /// Lossy quality (0.0 = smallest, 1.0 = best).
    pub quality: f32,
    /// Resampling filter used to reach the target size.
    pub resample: Resampling,
}

impl OutputConfig {
    pub fn quality(&self) -> Quality {
        Quality::new(self.quality)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::WebP,
            quality: Quality::default().value(),
            resample: Resampling::default(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel export workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective worker count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(ReducerConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
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

/// Parse a config document, merge it over the defaults and validate.
pub fn parse_config(content: &str) -> Result<ReducerConfig, ConfigError> {
    let overlay: toml::Value = toml::from_str(content)?;
    let merged = merge_toml(stock_defaults_value()?, overlay);
    let config: ReducerConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `reducer.toml` from the given directory.
///
/// Returns the validated defaults when the file does not exist.
pub fn load_config(dir: &Path) -> Result<ReducerConfig, ConfigError> {
    let path = dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(ReducerConfig::default());
    }
    parse_config(&fs::read_to_string(&path)?)
}

/// Returns a fully-commented stock `reducer.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Image Reducer Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Density control
# ---------------------------------------------------------------------------
# Output size = original size * density / baseline.
[density]
# Density at which images keep their original pixel size (72 DPI reference).
baseline = 72

# Range offered by the density control. Values below the baseline shrink.
min = 10
max = 100

# Density a new session starts with.
default = 72

# ---------------------------------------------------------------------------
# Output encoding
# ---------------------------------------------------------------------------
[output]
# Lossy target format: "image/webp" or "image/jpeg".
format = "image/webp"

# Quality hint from 0.0 (smallest files) to 1.0 (best fidelity).
quality = 0.9

# Resampling filter: "nearest", "bilinear", "catmull-rom" or "lanczos3".
resample = "bilinear"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel export workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
