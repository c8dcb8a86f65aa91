//! Bounds Overrides
//!
//! Manual bounds overrides persisted to a JSON file so they survive restarts.
//! They are applied on top of the configured bounds at startup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::domain::bounds::normalize_symbol;

/// Default overrides file name
pub const DEFAULT_OVERRIDES_FILE: &str = "bounds_overrides.json";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OverrideError {
    #[error("Failed to read overrides file: {0}")]
    ReadError(String),

    #[error("Failed to write overrides file: {0}")]
    WriteError(String),

    #[error("Overrides file is corrupted: {0}")]
    CorruptedFile(String),

    #[error("Failed to serialize overrides: {0}")]
    SerializationError(String),
}

/// One manual override of a symbol's bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundsOverride {
    pub symbol: String,
    pub min_price: f64,
    pub max_price: f64,
    pub updated_at: DateTime<Utc>,
}

impl BoundsOverride {
    pub fn new(symbol: &str, min_price: f64, max_price: f64) -> Self {
        Self {
            symbol: normalize_symbol(symbol),
            min_price,
            max_price,
            updated_at: Utc::now(),
        }
    }
}

/// All persisted overrides, keyed by normalized symbol
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundsOverrideFile {
    #[serde(default)]
    overrides: BTreeMap<String, BoundsOverride>,
}

impl BoundsOverrideFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load overrides; a missing or empty file means none
    pub fn load(path: &Path) -> Result<Self, OverrideError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| OverrideError::ReadError(e.to_string()))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let file: Self = serde_json::from_str(&content)
            .map_err(|e| OverrideError::CorruptedFile(e.to_string()))?;

        tracing::info!(
            "Loaded {} bounds override(s) from {}",
            file.len(),
            path.display()
        );
        Ok(file)
    }

    /// Save overrides, creating the parent directory if needed
    pub fn save(&self, path: &Path) -> Result<(), OverrideError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| OverrideError::WriteError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| OverrideError::SerializationError(e.to_string()))?;

        fs::write(path, content).map_err(|e| OverrideError::WriteError(e.to_string()))?;

        tracing::info!("Saved {} bounds override(s) to {}", self.len(), path.display());
        Ok(())
    }

    /// Insert or replace the override for its symbol
    pub fn upsert(&mut self, entry: BoundsOverride) {
        let key = normalize_symbol(&entry.symbol);
        self.overrides.insert(key, entry);
    }

    pub fn remove(&mut self, symbol: &str) -> Option<BoundsOverride> {
        self.overrides.remove(&normalize_symbol(symbol))
    }

    pub fn get(&self, symbol: &str) -> Option<&BoundsOverride> {
        self.overrides.get(&normalize_symbol(symbol))
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundsOverride> {
        self.overrides.values()
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}
