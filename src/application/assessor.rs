//! Assessor
//!
//! Composes the engine into a full assessment:
//! 1. price -> risk (curve lookup)
//! 2. risk -> enclosing band -> coefficient
//! 3. risk -> signal, signal x coefficient -> score
//! 4. append the assessment to the history log
//!
//! Batch assessment isolates failures per symbol: one bad symbol never
//! aborts the rest of the batch.

use chrono::Utc;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::assessment::Assessment;
use crate::domain::bands::RiskBand;
use crate::domain::bounds::normalize_symbol;
use crate::domain::error::RiskMetricError;
use crate::domain::store::RiskMetricStore;
use crate::ports::assessment_log::AssessmentLog;

/// Per-symbol outcome of a batch call
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    pub symbol: String,
    pub outcome: Result<Assessment, RiskMetricError>,
}

impl BatchResult {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

pub struct Assessor<L: AssessmentLog> {
    store: Arc<RwLock<RiskMetricStore>>,
    log: L,
}

impl<L: AssessmentLog> Assessor<L> {
    pub fn new(store: RiskMetricStore, log: L) -> Self {
        Self::with_shared_store(Arc::new(RwLock::new(store)), log)
    }

    /// Share a store with other readers (e.g. an override handler)
    pub fn with_shared_store(store: Arc<RwLock<RiskMetricStore>>, log: L) -> Self {
        Self { store, log }
    }

    pub fn shared_store(&self) -> Arc<RwLock<RiskMetricStore>> {
        Arc::clone(&self.store)
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    /// Read access to the store
    pub fn store(&self) -> RwLockReadGuard<'_, RiskMetricStore> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write access to the store, for manual overrides
    pub fn store_mut(&self) -> RwLockWriteGuard<'_, RiskMetricStore> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Steps 1-3 without touching the history log
    /// The price must be finite, since it is carried into the recorded assessment.
    pub fn evaluate(&self, symbol: &str, price: f64) -> Result<Assessment, RiskMetricError> {
        if !price.is_finite() {
            return Err(RiskMetricError::InvalidPrice(price));
        }
        let store = self.store();
        let key = normalize_symbol(symbol);

        let risk = store.risk_from_price(&key, price)?;
        let band = RiskBand::containing(risk);
        let coefficient = store.coefficient_for_band(&key, band)?;

        Ok(Assessment::new(key, price, risk, coefficient, Utc::now()))
    }

    /// Full assessment, recorded in the history log
    pub fn assess(&self, symbol: &str, price: f64) -> Result<Assessment, RiskMetricError> {
        let assessment = self.evaluate(symbol, price)?;

        self.log
            .append(&assessment)
            .map_err(|e| RiskMetricError::HistoryWrite(e.to_string()))?;

        tracing::info!("{}", assessment.summary());
        Ok(assessment)
    }

    /// Assess many symbols; results come back in input order
    pub fn assess_batch<S: AsRef<str>>(&self, requests: &[(S, f64)]) -> Vec<BatchResult> {
        let results: Vec<BatchResult> = requests
            .iter()
            .map(|(symbol, price)| {
                let outcome = self.assess(symbol.as_ref(), *price);
                if let Err(ref e) = outcome {
                    tracing::warn!("Assessment failed for {}: {}", symbol.as_ref(), e);
                }
                BatchResult {
                    symbol: normalize_symbol(symbol.as_ref()),
                    outcome,
                }
            })
            .collect();

        let ok = results.iter().filter(|r| r.is_ok()).count();
        tracing::info!(
            "Batch complete: {} assessed, {} failed",
            ok,
            results.len() - ok
        );
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::persistence::MemoryAssessmentLog;
    use crate::domain::bands::BandTable;
    use crate::domain::bounds::SymbolBounds;
    use crate::domain::signal::Signal;
    use crate::ports::assessment_log::{HistoryError, MockAssessmentLog};
    use approx::assert_relative_eq;

    const BTC_TIME_SPENT: [f64; 10] = [4.2, 9.8, 14.5, 18.3, 16.7, 13.1, 10.4, 7.2, 4.1, 1.7];
    const ETH_TIME_SPENT: [f64; 10] = [6.5, 12.0, 17.5, 19.0, 15.5, 11.0, 8.5, 5.5, 3.0, 1.5];

    fn store() -> RiskMetricStore {
        let mut store = RiskMetricStore::default();
        store
            .register(SymbolBounds::new("BTC", 30_000.0, 300_000.0).unwrap(), None)
            .unwrap();
        store
            .set_bands("BTC", BandTable::from_percentages("BTC", &BTC_TIME_SPENT).unwrap())
            .unwrap();
        store
            .register(SymbolBounds::new("ETH", 800.0, 10_000.0).unwrap(), None)
            .unwrap();
        store
            .set_bands("ETH", BandTable::from_percentages("ETH", &ETH_TIME_SPENT).unwrap())
            .unwrap();
        store
    }

    fn assessor() -> Assessor<MemoryAssessmentLog> {
        Assessor::new(store(), MemoryAssessmentLog::new())
    }

    #[test]
    fn test_btc_neutral_scenario() {
        let assessor = assessor();
        let a = assessor.assess("BTC", 114_222.0).unwrap();

        assert!(a.risk > 0.57 && a.risk < 0.59, "risk {}", a.risk);
        assert_eq!(a.signal, Signal::Neutral);
        assert_eq!(a.score, 0.0);
        assert_eq!(a.risk_band, "0.5-0.6");
        assert_relative_eq!(a.coefficient, 1.0 + 0.6 * (1.0 - 13.1 / 18.3), epsilon = 1e-12);
        assert_eq!(assessor.log().len(), 1);
    }

    #[test]
    fn test_strong_buy_scales_with_coefficient() {
        let assessor = assessor();
        let a = assessor.assess("btc", 35_000.0).unwrap();

        assert_eq!(a.symbol, "BTC");
        assert_eq!(a.signal, Signal::StrongBuy);
        let expected = 1.0 + 0.6 * (1.0 - 4.2 / 18.3);
        assert_relative_eq!(a.score, 10.0 * expected, epsilon = 1e-9);
    }

    #[test]
    fn test_strong_sell_at_top_of_range() {
        let assessor = assessor();
        let a = assessor.assess("BTC", 1_000_000.0).unwrap();

        assert_eq!(a.risk, 1.0);
        assert_eq!(a.risk_band, "0.9-1.0");
        assert_eq!(a.signal, Signal::StrongSell);
        assert!(a.score < -10.0);
    }

    #[test]
    fn test_evaluate_does_not_record() {
        let assessor = assessor();
        assessor.evaluate("ETH", 2_500.0).unwrap();
        assert!(assessor.log().is_empty());
    }

    #[test]
    fn test_failed_assessment_not_recorded() {
        let assessor = assessor();
        let err = assessor.assess("NOPE", 1.0).unwrap_err();
        assert_eq!(err, RiskMetricError::UnknownSymbol("NOPE".to_string()));
        assert!(assessor.log().is_empty());
    }

    #[test]
    fn test_non_finite_price_not_recorded() {
        let assessor = assessor();
        for price in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let err = assessor.assess("BTC", price).unwrap_err();
            assert!(matches!(err, RiskMetricError::InvalidPrice(_)));
        }
        assert!(assessor.log().is_empty());
        // Plain lookups still clamp
        assert_eq!(assessor.store().risk_from_price("BTC", f64::INFINITY).unwrap(), 1.0);
    }

    #[test]
    fn test_degenerate_bands() {
        let mut store = store();
        store
            .set_bands("ETH", BandTable::from_percentages("ETH", &[0.0; 10]).unwrap())
            .unwrap();
        let assessor = Assessor::new(store, MemoryAssessmentLog::new());

        let err = assessor.assess("ETH", 2_500.0).unwrap_err();
        assert_eq!(err, RiskMetricError::DegenerateBandData("ETH".to_string()));
    }

    #[test]
    fn test_batch_isolation() {
        let assessor = assessor();
        let results = assessor.assess_batch(&[
            ("BTC", 114_222.0),
            ("UNKNOWN_XYZ", 1.0),
            ("ETH", 2_500.0),
        ]);

        assert_eq!(results.len(), 3);
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 2);
        assert_eq!(results[0].symbol, "BTC");
        assert_eq!(
            results[1].outcome,
            Err(RiskMetricError::UnknownSymbol("UNKNOWN_XYZ".to_string()))
        );
        assert_eq!(results[2].outcome.as_ref().unwrap().symbol, "ETH");
        assert_eq!(assessor.log().len(), 2);
    }

    #[test]
    fn test_history_write_failure() {
        let mut log = MockAssessmentLog::new();
        log.expect_append()
            .times(1)
            .returning(|_| Err(HistoryError::Io("disk full".to_string())));

        let assessor = Assessor::new(store(), log);
        let err = assessor.assess("BTC", 50_000.0).unwrap_err();
        assert!(matches!(err, RiskMetricError::HistoryWrite(ref msg) if msg.contains("disk full")));
    }

    #[test]
    fn test_batch_continues_after_history_failure() {
        let mut log = MockAssessmentLog::new();
        let mut calls = 0;
        log.expect_append().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Err(HistoryError::Io("transient".to_string()))
            } else {
                Ok(())
            }
        });

        let assessor = Assessor::new(store(), log);
        let results = assessor.assess_batch(&[("BTC", 50_000.0), ("ETH", 2_500.0)]);

        assert!(!results[0].is_ok());
        assert!(results[1].is_ok());
    }

    #[test]
    fn test_override_visible_to_assessor() {
        let assessor = assessor();
        let before = assessor.evaluate("BTC", 100_000.0).unwrap().risk;

        assessor
            .store_mut()
            .override_bounds("BTC", 50_000.0, 500_000.0)
            .unwrap();

        let after = assessor.evaluate("BTC", 100_000.0).unwrap().risk;
        assert!(after < before);
    }
}
