//! RiskMetric Store
//!
//! Process-local owner of every per-symbol table: bounds, anchor, risk
//! curve and time-in-band data. Passed explicitly to whoever needs it.
//!
//! Reads are pure lookups. The only writes are registration and manual
//! overrides, and each write either fully succeeds or leaves the previous
//! state untouched.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::bands::{BandTable, RiskBand};
use crate::domain::bounds::{normalize_symbol, SymbolBounds};
use crate::domain::curve::{build_risk_table, AnchorPoint, RiskCurve, DEFAULT_CURVE_POINTS};
use crate::domain::error::RiskMetricError;

/// How much slack to allow in data the source never validated
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationPolicy {
    /// Allowed distance (percentage points) of the band total from 100
    pub band_sum_tolerance: f64,
    /// Allowed relative deviation of an anchor from the log-linear curve
    pub anchor_tolerance: f64,
    /// Reject out-of-tolerance data instead of warning about it
    pub strict: bool,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            band_sum_tolerance: 5.0,
            anchor_tolerance: 0.25,
            strict: false,
        }
    }
}

impl ValidationPolicy {
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
struct SymbolEntry {
    bounds: SymbolBounds,
    anchor: Option<AnchorPoint>,
    curve: RiskCurve,
    bands: Option<BandTable>,
}

#[derive(Debug, Clone)]
pub struct RiskMetricStore {
    entries: HashMap<String, SymbolEntry>,
    curve_points: usize,
    policy: ValidationPolicy,
}

impl Default for RiskMetricStore {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            curve_points: DEFAULT_CURVE_POINTS,
            policy: ValidationPolicy::default(),
        }
    }
}

impl RiskMetricStore {
    /// Create an empty store with a custom curve resolution and policy
    pub fn new(curve_points: usize, policy: ValidationPolicy) -> Result<Self, RiskMetricError> {
        if curve_points < 2 {
            return Err(RiskMetricError::InvalidCurveResolution(curve_points));
        }
        Ok(Self {
            entries: HashMap::new(),
            curve_points,
            policy,
        })
    }

    pub fn curve_points(&self) -> usize {
        self.curve_points
    }

    pub fn policy(&self) -> ValidationPolicy {
        self.policy
    }

    /// Register (or replace) a symbol's bounds and optional anchor.
    /// Existing band data for the symbol is kept.
    pub fn register(
        &mut self,
        bounds: SymbolBounds,
        anchor: Option<AnchorPoint>,
    ) -> Result<(), RiskMetricError> {
        let bounds = SymbolBounds::new(&bounds.symbol, bounds.min_price, bounds.max_price)?;
        let curve = self.build_curve(&bounds, anchor)?;
        let key = bounds.symbol.clone();
        let bands = self.entries.remove(&key).and_then(|e| e.bands);

        tracing::info!(
            "Registered {} bounds {:.4} -> {:.4} ({} curve points)",
            key,
            bounds.min_price,
            bounds.max_price,
            curve.len()
        );

        self.entries.insert(
            key,
            SymbolEntry {
                bounds,
                anchor,
                curve,
                bands,
            },
        );
        Ok(())
    }

    /// Attach time-in-band data to an already registered symbol
    pub fn set_bands(&mut self, symbol: &str, bands: BandTable) -> Result<(), RiskMetricError> {
        let key = normalize_symbol(symbol);
        let policy = self.policy;
        let entry = self
            .entries
            .get_mut(&key)
            .ok_or_else(|| RiskMetricError::UnknownSymbol(key.clone()))?;

        if bands.symbol() != key {
            return Err(RiskMetricError::InvalidBandData {
                symbol: key,
                reason: format!("band data was built for {}", bands.symbol()),
            });
        }
        check_band_total(&key, &bands, policy)?;

        tracing::debug!(
            "Band data for {} updated (total {:.2}%, max {:.2}%)",
            key,
            bands.total_percentage(),
            bands.max_percentage()
        );
        entry.bands = Some(bands);
        Ok(())
    }

    /// Manually replace a symbol's bounds, keeping its anchor
    pub fn override_bounds(
        &mut self,
        symbol: &str,
        min_price: f64,
        max_price: f64,
    ) -> Result<(), RiskMetricError> {
        let key = normalize_symbol(symbol);
        let anchor = self.entry(&key)?.anchor;
        let bounds = SymbolBounds::new(&key, min_price, max_price)?;
        let curve = self.build_curve(&bounds, anchor)?;

        if let Some(entry) = self.entries.get_mut(&key) {
            tracing::info!(
                "Bounds override for {}: {:.4} -> {:.4} (was {:.4} -> {:.4})",
                key,
                min_price,
                max_price,
                entry.bounds.min_price,
                entry.bounds.max_price
            );
            entry.bounds = bounds;
            entry.curve = curve;
        }
        Ok(())
    }

    /// Set or clear a symbol's anchor point
    pub fn set_anchor(
        &mut self,
        symbol: &str,
        anchor: Option<AnchorPoint>,
    ) -> Result<(), RiskMetricError> {
        let key = normalize_symbol(symbol);
        let bounds = self.entry(&key)?.bounds.clone();
        let curve = self.build_curve(&bounds, anchor)?;

        if let Some(entry) = self.entries.get_mut(&key) {
            entry.anchor = anchor;
            entry.curve = curve;
        }
        Ok(())
    }

    /// Registered symbols, sorted
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.entries.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.entries.contains_key(&normalize_symbol(symbol))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get_bounds(&self, symbol: &str) -> Result<&SymbolBounds, RiskMetricError> {
        Ok(&self.entry(symbol)?.bounds)
    }

    pub fn anchor(&self, symbol: &str) -> Result<Option<AnchorPoint>, RiskMetricError> {
        Ok(self.entry(symbol)?.anchor)
    }

    pub fn risk_table(&self, symbol: &str) -> Result<&RiskCurve, RiskMetricError> {
        Ok(&self.entry(symbol)?.curve)
    }

    pub fn risk_from_price(&self, symbol: &str, price: f64) -> Result<f64, RiskMetricError> {
        let risk = self.entry(symbol)?.curve.risk_for_price(price)?;
        tracing::debug!("{} price {:.4} -> risk {:.4}", symbol, price, risk);
        Ok(risk)
    }

    pub fn price_from_risk(&self, symbol: &str, risk: f64) -> Result<f64, RiskMetricError> {
        if !(0.0..=1.0).contains(&risk) {
            return Err(RiskMetricError::InvalidRiskRange(risk));
        }
        self.entry(symbol)?.curve.price_for_risk(risk)
    }

    pub fn band_table(&self, symbol: &str) -> Result<&BandTable, RiskMetricError> {
        let entry = self.entry(symbol)?;
        entry
            .bands
            .as_ref()
            .ok_or_else(|| RiskMetricError::MissingBandData(entry.bounds.symbol.clone()))
    }

    pub fn coefficient_for_band(
        &self,
        symbol: &str,
        band: RiskBand,
    ) -> Result<f64, RiskMetricError> {
        self.band_table(symbol)?.coefficient(band)
    }

    fn entry(&self, symbol: &str) -> Result<&SymbolEntry, RiskMetricError> {
        let key = normalize_symbol(symbol);
        self.entries
            .get(&key)
            .ok_or(RiskMetricError::UnknownSymbol(key))
    }

    fn build_curve(
        &self,
        bounds: &SymbolBounds,
        anchor: Option<AnchorPoint>,
    ) -> Result<RiskCurve, RiskMetricError> {
        if let Some(anchor) = anchor {
            check_anchor_deviation(bounds, anchor, self.policy)?;
        }
        build_risk_table(bounds, self.curve_points, anchor)
    }
}

fn check_band_total(
    symbol: &str,
    bands: &BandTable,
    policy: ValidationPolicy,
) -> Result<(), RiskMetricError> {
    let total = bands.total_percentage();
    let deviation = (total - 100.0).abs();
    if deviation <= policy.band_sum_tolerance {
        return Ok(());
    }

    if policy.strict {
        return Err(RiskMetricError::InvalidBandData {
            symbol: symbol.to_string(),
            reason: format!(
                "percentages sum to {:.2}, more than {:.2} away from 100",
                total, policy.band_sum_tolerance
            ),
        });
    }

    tracing::warn!(
        "Band percentages for {} sum to {:.2} (tolerance {:.2}); accepting",
        symbol,
        total,
        policy.band_sum_tolerance
    );
    Ok(())
}

fn check_anchor_deviation(
    bounds: &SymbolBounds,
    anchor: AnchorPoint,
    policy: ValidationPolicy,
) -> Result<(), RiskMetricError> {
    if !(0.0..=1.0).contains(&anchor.risk) {
        // Range problems are reported by the curve builder
        return Ok(());
    }

    let expected = bounds.price_at(anchor.risk);
    let deviation = (anchor.price - expected).abs() / expected;
    if deviation <= policy.anchor_tolerance {
        return Ok(());
    }

    if policy.strict {
        return Err(RiskMetricError::InvalidAnchor {
            symbol: bounds.symbol.clone(),
            reason: format!(
                "price {:.4} deviates {:.1}% from curve price {:.4} at risk {}",
                anchor.price,
                deviation * 100.0,
                expected,
                anchor.risk
            ),
        });
    }

    tracing::warn!(
        "Anchor for {} at risk {} deviates {:.1}% from curve price {:.4}; accepting",
        bounds.symbol,
        anchor.risk,
        deviation * 100.0,
        expected
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const BTC_TIME_SPENT: [f64; 10] = [4.2, 9.8, 14.5, 18.3, 16.7, 13.1, 10.4, 7.2, 4.1, 1.7];

    fn btc_store(policy: ValidationPolicy) -> RiskMetricStore {
        let mut store = RiskMetricStore::new(DEFAULT_CURVE_POINTS, policy).unwrap();
        store
            .register(SymbolBounds::new("BTC", 30_000.0, 300_000.0).unwrap(), None)
            .unwrap();
        store
            .set_bands("BTC", BandTable::from_percentages("BTC", &BTC_TIME_SPENT).unwrap())
            .unwrap();
        store
    }

    #[test]
    fn test_lookup_unknown_symbol() {
        let store = btc_store(ValidationPolicy::default());
        assert_eq!(
            store.get_bounds("DOGE").unwrap_err(),
            RiskMetricError::UnknownSymbol("DOGE".to_string())
        );
        assert!(matches!(
            store.risk_from_price("DOGE", 1.0),
            Err(RiskMetricError::UnknownSymbol(_))
        ));
        assert!(matches!(
            store.price_from_risk("DOGE", 0.5),
            Err(RiskMetricError::UnknownSymbol(_))
        ));
    }

    #[test]
    fn test_symbol_lookup_is_case_insensitive() {
        let store = btc_store(ValidationPolicy::default());
        assert!(store.contains("btc"));
        assert_eq!(store.get_bounds(" btc").unwrap().min_price, 30_000.0);
        assert_eq!(store.symbols(), vec!["BTC".to_string()]);
    }

    #[test]
    fn test_invalid_risk_checked_before_symbol() {
        let store = btc_store(ValidationPolicy::default());
        assert_eq!(
            store.price_from_risk("BTC", 1.5).unwrap_err(),
            RiskMetricError::InvalidRiskRange(1.5)
        );
    }

    #[test]
    fn test_lookups() {
        let store = btc_store(ValidationPolicy::default());
        assert_eq!(store.risk_from_price("BTC", 30_000.0).unwrap(), 0.0);
        assert_eq!(store.risk_from_price("BTC", 300_000.0).unwrap(), 1.0);
        assert_eq!(store.risk_from_price("BTC", 10.0).unwrap(), 0.0);
        assert_eq!(store.risk_from_price("BTC", 1e9).unwrap(), 1.0);

        let price = store.price_from_risk("BTC", 0.5).unwrap();
        assert_relative_eq!(price, 30_000.0 * 10f64.sqrt(), max_relative = 1e-9);
    }

    #[test]
    fn test_coefficient_lookup() {
        let store = btc_store(ValidationPolicy::default());
        let band = RiskBand::new(3).unwrap();
        assert_eq!(store.coefficient_for_band("BTC", band).unwrap(), 1.0);
    }

    #[test]
    fn test_missing_band_data() {
        let mut store = RiskMetricStore::default();
        store
            .register(SymbolBounds::new("ETH", 800.0, 10_000.0).unwrap(), None)
            .unwrap();
        assert_eq!(
            store.coefficient_for_band("ETH", RiskBand::new(0).unwrap()).unwrap_err(),
            RiskMetricError::MissingBandData("ETH".to_string())
        );
    }

    #[test]
    fn test_set_bands_unknown_symbol() {
        let mut store = RiskMetricStore::default();
        let bands = BandTable::from_percentages("XRP", &[10.0; 10]).unwrap();
        assert!(matches!(
            store.set_bands("XRP", bands),
            Err(RiskMetricError::UnknownSymbol(_))
        ));
    }

    #[test]
    fn test_set_bands_symbol_mismatch() {
        let mut store = btc_store(ValidationPolicy::default());
        let eth = BandTable::from_percentages("eth", &[10.0; 10]).unwrap();
        let err = store.set_bands("BTC", eth).unwrap_err();
        assert!(matches!(
            err,
            RiskMetricError::InvalidBandData { ref symbol, .. } if symbol == "BTC"
        ));

        // Case and whitespace differences are not a mismatch
        let btc = BandTable::from_percentages(" btc", &[10.0; 10]).unwrap();
        store.set_bands("BTC", btc).unwrap();
        assert_eq!(store.band_table("BTC").unwrap().symbol(), "BTC");
    }

    #[test]
    fn test_band_total_policy() {
        let short = [5.0; 10]; // sums to 50

        let mut lenient = btc_store(ValidationPolicy::default());
        assert!(lenient
            .set_bands("BTC", BandTable::from_percentages("BTC", &short).unwrap())
            .is_ok());

        let mut strict = btc_store(ValidationPolicy::strict());
        let err = strict
            .set_bands("BTC", BandTable::from_percentages("BTC", &short).unwrap())
            .unwrap_err();
        assert!(matches!(err, RiskMetricError::InvalidBandData { .. }));
        // Previous band data survives the rejected update
        assert_relative_eq!(
            strict.band_table("BTC").unwrap().max_percentage(),
            18.3
        );
    }

    #[test]
    fn test_register_keeps_band_data() {
        let mut store = btc_store(ValidationPolicy::default());
        store
            .register(SymbolBounds::new("BTC", 20_000.0, 200_000.0).unwrap(), None)
            .unwrap();
        assert!(store.band_table("BTC").is_ok());
        assert_eq!(store.get_bounds("BTC").unwrap().min_price, 20_000.0);
    }

    #[test]
    fn test_override_bounds() {
        let mut store = btc_store(ValidationPolicy::default());
        store.override_bounds("btc", 40_000.0, 400_000.0).unwrap();

        assert_eq!(store.get_bounds("BTC").unwrap().max_price, 400_000.0);
        assert_eq!(store.risk_from_price("BTC", 40_000.0).unwrap(), 0.0);
        assert_eq!(store.risk_from_price("BTC", 400_000.0).unwrap(), 1.0);
    }

    #[test]
    fn test_invalid_override_leaves_state_untouched() {
        let mut store = btc_store(ValidationPolicy::default());
        let err = store.override_bounds("BTC", 500.0, 100.0).unwrap_err();
        assert!(matches!(err, RiskMetricError::InvalidBounds { .. }));
        assert_eq!(store.get_bounds("BTC").unwrap().min_price, 30_000.0);

        assert!(matches!(
            store.override_bounds("NOPE", 1.0, 2.0),
            Err(RiskMetricError::UnknownSymbol(_))
        ));
    }

    #[test]
    fn test_override_revalidates_anchor() {
        let mut store = btc_store(ValidationPolicy::default());
        store
            .set_anchor("BTC", Some(AnchorPoint::new(0.5, 95_000.0)))
            .unwrap();

        // New bounds put 0.525 well below the anchor price
        let err = store.override_bounds("BTC", 1_000.0, 10_000.0).unwrap_err();
        assert!(matches!(err, RiskMetricError::InvalidAnchor { .. }));
        assert_eq!(store.get_bounds("BTC").unwrap().min_price, 30_000.0);
        assert_relative_eq!(store.price_from_risk("BTC", 0.5).unwrap(), 95_000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_anchor_deviation_policy() {
        // ~5% above the curve price at 0.5, still below the 0.525 point
        let anchor = AnchorPoint::new(0.5, 100_000.0);

        let mut lenient = btc_store(ValidationPolicy {
            anchor_tolerance: 0.01,
            ..ValidationPolicy::default()
        });
        assert!(lenient.set_anchor("BTC", Some(anchor)).is_ok());

        let mut strict = btc_store(ValidationPolicy {
            anchor_tolerance: 0.01,
            strict: true,
            ..ValidationPolicy::default()
        });
        let err = strict.set_anchor("BTC", Some(anchor)).unwrap_err();
        assert!(matches!(err, RiskMetricError::InvalidAnchor { .. }));
        assert_eq!(strict.anchor("BTC").unwrap(), None);
    }

    #[test]
    fn test_clear_anchor() {
        let mut store = btc_store(ValidationPolicy::default());
        store
            .set_anchor("BTC", Some(AnchorPoint::new(0.51, 97_000.0)))
            .unwrap();
        assert_eq!(store.risk_table("BTC").unwrap().len(), 42);

        store.set_anchor("BTC", None).unwrap();
        assert_eq!(store.risk_table("BTC").unwrap().len(), 41);
    }

    #[test]
    fn test_invalid_resolution() {
        assert!(matches!(
            RiskMetricStore::new(1, ValidationPolicy::default()),
            Err(RiskMetricError::InvalidCurveResolution(1))
        ));
    }
}
