//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching
//! config/riskmetric.toml.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::bands::BAND_COUNT;
use crate::domain::bounds::normalize_symbol;
use crate::domain::curve::{AnchorPoint, DEFAULT_CURVE_POINTS};
use crate::domain::store::ValidationPolicy;

/// Main configuration structure matching riskmetric.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub curve: CurveSection,
    #[serde(default)]
    pub validation: ValidationSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default)]
    pub symbols: Vec<SymbolSection>,
}

/// Risk curve configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct CurveSection {
    /// Number of evenly spaced risk levels (41 = step 0.025)
    #[serde(default = "default_curve_points")]
    pub points: usize,
}

impl Default for CurveSection {
    fn default() -> Self {
        Self {
            points: DEFAULT_CURVE_POINTS,
        }
    }
}

/// Validation tolerances for unverified input data
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationSection {
    /// Allowed distance of band percentages' total from 100
    #[serde(default = "default_band_sum_tolerance")]
    pub band_sum_tolerance: f64,
    /// Allowed relative deviation of an anchor price from the curve
    #[serde(default = "default_anchor_tolerance")]
    pub anchor_tolerance: f64,
    /// Reject out-of-tolerance data instead of warning
    #[serde(default)]
    pub strict: bool,
}

impl Default for ValidationSection {
    fn default() -> Self {
        Self {
            band_sum_tolerance: default_band_sum_tolerance(),
            anchor_tolerance: default_anchor_tolerance(),
            strict: false,
        }
    }
}

/// File locations
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSection {
    /// Append-only assessment history (JSON lines)
    #[serde(default = "default_history_path")]
    pub history_path: String,
    /// Persisted manual bounds overrides
    #[serde(default = "default_overrides_path")]
    pub overrides_path: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            history_path: default_history_path(),
            overrides_path: default_overrides_path(),
        }
    }
}

impl StorageSection {
    /// History path with environment variable override.
    /// Checks RISKMETRIC_HISTORY_PATH first, falls back to config value.
    pub fn get_history_path(&self) -> PathBuf {
        let raw = std::env::var("RISKMETRIC_HISTORY_PATH")
            .unwrap_or_else(|_| self.history_path.clone());
        PathBuf::from(shellexpand::tilde(&raw).to_string())
    }

    /// Overrides path with environment variable override.
    /// Checks RISKMETRIC_OVERRIDES_PATH first, falls back to config value.
    pub fn get_overrides_path(&self) -> PathBuf {
        let raw = std::env::var("RISKMETRIC_OVERRIDES_PATH")
            .unwrap_or_else(|_| self.overrides_path.clone());
        PathBuf::from(shellexpand::tilde(&raw).to_string())
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// One `[[symbols]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct SymbolSection {
    pub symbol: String,
    pub min_price: f64,
    pub max_price: f64,
    /// Ten time-spent percentages, band 0.0-0.1 first
    #[serde(default)]
    pub time_spent: Option<Vec<f64>>,
    /// Known (risk, price) pair forced into the curve
    #[serde(default)]
    pub anchor: Option<AnchorSection>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AnchorSection {
    pub risk: f64,
    pub price: f64,
}

impl From<AnchorSection> for AnchorPoint {
    fn from(anchor: AnchorSection) -> Self {
        AnchorPoint::new(anchor.risk, anchor.price)
    }
}

fn default_curve_points() -> usize {
    DEFAULT_CURVE_POINTS
}

fn default_band_sum_tolerance() -> f64 {
    5.0
}

fn default_anchor_tolerance() -> f64 {
    0.25
}

fn default_history_path() -> String {
    "data/assessments.jsonl".to_string()
}

fn default_overrides_path() -> String {
    "data/bounds_overrides.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Structural validation. Bounds, anchors and band data are checked by
    /// the store when it is built from this config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.curve.points < 2 {
            return Err(ConfigError::ValidationError(format!(
                "curve.points must be >= 2, got {}",
                self.curve.points
            )));
        }

        if !(self.validation.band_sum_tolerance >= 0.0
            && self.validation.band_sum_tolerance.is_finite())
        {
            return Err(ConfigError::ValidationError(format!(
                "band_sum_tolerance must be a finite value >= 0, got {}",
                self.validation.band_sum_tolerance
            )));
        }

        if !(self.validation.anchor_tolerance >= 0.0
            && self.validation.anchor_tolerance.is_finite())
        {
            return Err(ConfigError::ValidationError(format!(
                "anchor_tolerance must be a finite value >= 0, got {}",
                self.validation.anchor_tolerance
            )));
        }

        if self.storage.history_path.is_empty() {
            return Err(ConfigError::ValidationError(
                "history_path cannot be empty".to_string(),
            ));
        }

        if self.storage.overrides_path.is_empty() {
            return Err(ConfigError::ValidationError(
                "overrides_path cannot be empty".to_string(),
            ));
        }

        if self.symbols.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one [[symbols]] entry is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for entry in &self.symbols {
            let key = normalize_symbol(&entry.symbol);
            if key.is_empty() {
                return Err(ConfigError::ValidationError(
                    "symbol cannot be empty".to_string(),
                ));
            }
            if !seen.insert(key.clone()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate symbol {}",
                    key
                )));
            }
            if let Some(ref pct) = entry.time_spent {
                if pct.len() != BAND_COUNT {
                    return Err(ConfigError::ValidationError(format!(
                        "{}: time_spent must have {} entries, got {}",
                        key,
                        BAND_COUNT,
                        pct.len()
                    )));
                }
            }
        }

        Ok(())
    }
}

impl From<&Config> for ValidationPolicy {
    fn from(config: &Config) -> Self {
        ValidationPolicy {
            band_sum_tolerance: config.validation.band_sum_tolerance,
            anchor_tolerance: config.validation.anchor_tolerance,
            strict: config.validation.strict,
        }
    }
}
