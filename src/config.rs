//! Optimizer configuration.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! overridden by a user config placed in the projects root (or passed with
//! `--config`).
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [[presets]]               # A [[presets]] list replaces the whole default table
//! name = "thumbnail"
//! width = 400               # Target width in pixels
//! base_quality = 80         # Ceiling on the starting encoder quality
//! max_bytes = 50000         # JPEG byte budget (WebP gets webp_budget_ratio of it)
//!
//! [originals]
//! jpeg_quality = 92         # Full-resolution JPEG
//! webp_quality = 90         # Full-resolution WebP
//!
//! [encoder]
//! max_attempts = 5          # Encodes per budgeted variant
//! jpeg_floor = 70           # Lowest JPEG quality the budget loop may reach
//! webp_floor = 65           # Lowest WebP quality the budget loop may reach
//! webp_offset = 5           # WebP starts this much below JPEG
//! webp_budget_ratio = 0.8   # WebP budget as a fraction of the preset's
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse — override just the values you want:
//!
//! ```toml
//! [encoder]
//! jpeg_floor = 75
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{BudgetConfig, Quality};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the projects root.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Optimizer configuration loaded from `config.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerConfig {
    /// Size presets, ascending by width.
    pub presets: Vec<SizePreset>,
    /// Full-resolution pair settings.
    pub originals: OriginalsConfig,
    /// Budget loop settings.
    pub encoder: EncoderConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            presets: SizePreset::default_table(),
            originals: OriginalsConfig::default(),
            encoder: EncoderConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl OptimizerConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.presets.is_empty() {
            return Err(ConfigError::Validation("presets must not be empty".into()));
        }
        for preset in &self.presets {
            if preset.name.is_empty()
                || !preset
                    .name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            {
                return Err(ConfigError::Validation(format!(
                    "preset name '{}' must be non-empty and use only [A-Za-z0-9_-]",
                    preset.name
                )));
            }
            if preset.width == 0 {
                return Err(ConfigError::Validation(format!(
                    "presets.{}.width must be non-zero",
                    preset.name
                )));
            }
            check_quality(&format!("presets.{}.base_quality", preset.name), preset.base_quality)?;
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.presets.iter().find(|p| !seen.insert(p.name.as_str())) {
            return Err(ConfigError::Validation(format!(
                "duplicate preset name '{}'",
                dup.name
            )));
        }
        for pair in self.presets.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if b.width <= a.width {
                return Err(ConfigError::Validation(format!(
                    "preset widths must be strictly increasing ({} {}px → {} {}px)",
                    a.name, a.width, b.name, b.width
                )));
            }
            if b.max_bytes <= a.max_bytes {
                return Err(ConfigError::Validation(format!(
                    "preset byte budgets must be strictly increasing ({} {} → {} {})",
                    a.name, a.max_bytes, b.name, b.max_bytes
                )));
            }
        }
        check_quality("originals.jpeg_quality", self.originals.jpeg_quality)?;
        check_quality("originals.webp_quality", self.originals.webp_quality)?;
        check_quality("encoder.jpeg_floor", self.encoder.jpeg_floor)?;
        check_quality("encoder.webp_floor", self.encoder.webp_floor)?;
        if self.encoder.max_attempts == 0 {
            return Err(ConfigError::Validation(
                "encoder.max_attempts must be at least 1".into(),
            ));
        }
        if !(self.encoder.webp_budget_ratio > 0.0 && self.encoder.webp_budget_ratio <= 1.0) {
            return Err(ConfigError::Validation(
                "encoder.webp_budget_ratio must be in (0, 1]".into(),
            ));
        }
        Ok(())
    }
}

fn check_quality(key: &str, value: u32) -> Result<(), ConfigError> {
    if (1..=100).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!("{key} must be 1-100")))
    }
}

/// A named responsive rendition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SizePreset {
    /// Suffix in output file names (`img-01-{name}.jpg`).
    pub name: String,
    /// Target width in pixels.
    pub width: u32,
    /// Ceiling on the starting encoder quality.
    pub base_quality: u32,
    /// JPEG byte budget. Advisory: see [`crate::imaging::operations`].
    pub max_bytes: usize,
}

impl SizePreset {
    fn new(name: &str, width: u32, base_quality: u32, max_bytes: usize) -> Self {
        Self {
            name: name.to_string(),
            width,
            base_quality,
            max_bytes,
        }
    }

    /// thumbnail / medium / large / desktop.
    pub fn default_table() -> Vec<SizePreset> {
        vec![
            Self::new("thumbnail", 400, 80, 50_000),
            Self::new("medium", 800, 85, 200_000),
            Self::new("large", 1200, 85, 350_000),
            Self::new("desktop", 1920, 90, 600_000),
        ]
    }
}

/// Full-resolution pair settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OriginalsConfig {
    pub jpeg_quality: u32,
    pub webp_quality: u32,
}

impl Default for OriginalsConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 92,
            webp_quality: 90,
        }
    }
}

/// Budget loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncoderConfig {
    pub max_attempts: u32,
    pub jpeg_floor: u32,
    pub webp_floor: u32,
    pub webp_offset: u32,
    pub webp_budget_ratio: f64,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            jpeg_floor: 70,
            webp_floor: 65,
            webp_offset: 5,
            webp_budget_ratio: 0.8,
        }
    }
}

impl EncoderConfig {
    /// The imaging layer's view of these settings.
    pub fn budget(&self) -> BudgetConfig {
        BudgetConfig {
            max_attempts: self.max_attempts,
            jpeg_floor: Quality::new(self.jpeg_floor),
            webp_floor: Quality::new(self.webp_floor),
            webp_offset: self.webp_offset.min(100) as u8,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up), at least 1
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
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(OptimizerConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely, so a
///   `[[presets]]` list replaces the default table rather than extending it.
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

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<OptimizerConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: OptimizerConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load `config.toml` from `dir` if present, stock defaults otherwise.
pub fn load_config(dir: &Path) -> Result<OptimizerConfig, ConfigError> {
    let path = dir.join(CONFIG_FILENAME);
    let overlay = if path.is_file() {
        Some(load_raw_config(&path)?)
    } else {
        None
    };
    resolve_config(overlay)
}

/// Load an explicitly named config file. The file must exist.
pub fn load_config_file(path: &Path) -> Result<OptimizerConfig, ConfigError> {
    resolve_config(Some(load_raw_config(path)?))
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Printed by `--gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# folio-optimize configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file as config.toml in the projects root, or pass --config.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Size presets
# ---------------------------------------------------------------------------
# Each preset yields {name}-{preset}.jpg and {name}-{preset}.webp.
# Widths and byte budgets must both be strictly increasing.
# Sources no wider than a preset get a verbatim copy of the full-size pair
# instead of an upscale. Listing any [[presets]] replaces this whole table.

[[presets]]
name = "thumbnail"
width = 400
base_quality = 80     # nominal quality; the encoder starts from the content class
max_bytes = 50000     # JPEG budget; WebP gets webp_budget_ratio of it

[[presets]]
name = "medium"
width = 800
base_quality = 85
max_bytes = 200000

[[presets]]
name = "large"
width = 1200
base_quality = 85
max_bytes = 350000

[[presets]]
name = "desktop"
width = 1920
base_quality = 90
max_bytes = 600000

# ---------------------------------------------------------------------------
# Full-resolution pair ({name}.jpg / {name}.webp)
# ---------------------------------------------------------------------------
[originals]
jpeg_quality = 92
webp_quality = 90

# ---------------------------------------------------------------------------
# Byte-budget loop
# ---------------------------------------------------------------------------
# Budgets are advisory: once the floor is reached the last encode is kept
# even if it is still over budget.
[encoder]
max_attempts = 5
jpeg_floor = 70
webp_floor = 65
webp_offset = 5          # WebP starts this much below the JPEG start quality
webp_budget_ratio = 0.8  # WebP budget = ratio x preset max_bytes

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
