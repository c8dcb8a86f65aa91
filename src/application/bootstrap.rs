//! Store Bootstrap
//!
//! Builds a `RiskMetricStore` from validated configuration and applies
//! persisted manual overrides on top.

use crate::adapters::persistence::BoundsOverrideFile;
use crate::config::Config;
use crate::domain::bands::BandTable;
use crate::domain::bounds::SymbolBounds;
use crate::domain::error::RiskMetricError;
use crate::domain::store::{RiskMetricStore, ValidationPolicy};

/// Register every configured symbol, with its anchor and band data
pub fn build_store(config: &Config) -> Result<RiskMetricStore, RiskMetricError> {
    let mut store = RiskMetricStore::new(config.curve.points, ValidationPolicy::from(config))?;

    for entry in &config.symbols {
        let bounds = SymbolBounds::new(&entry.symbol, entry.min_price, entry.max_price)?;
        let symbol = bounds.symbol.clone();
        store.register(bounds, entry.anchor.map(Into::into))?;

        match entry.time_spent {
            Some(ref pct) => {
                let bands = BandTable::from_percentages(symbol.as_str(), pct)?;
                store.set_bands(&symbol, bands)?;
            }
            None => tracing::warn!("{} has no time_spent data; assessments will fail", symbol),
        }
    }

    tracing::info!("RiskMetric store ready with {} symbol(s)", store.len());
    Ok(store)
}

/// Apply persisted overrides. Overrides for symbols no longer configured
/// are skipped with a warning; invalid overrides fail.
pub fn apply_overrides(
    store: &mut RiskMetricStore,
    overrides: &BoundsOverrideFile,
) -> Result<usize, RiskMetricError> {
    let mut applied = 0;
    for entry in overrides.iter() {
        if !store.contains(&entry.symbol) {
            tracing::warn!(
                "Ignoring bounds override for {}: symbol is not configured",
                entry.symbol
            );
            continue;
        }
        store.override_bounds(&entry.symbol, entry.min_price, entry.max_price)?;
        applied += 1;
    }
    Ok(applied)
}
