//! Assessment
//!
//! The immutable result of assessing one symbol at one price.
//! Created once, appended to the history log, never mutated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::bands::RiskBand;
use crate::domain::signal::Signal;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub symbol: String,
    pub price: f64,
    pub risk: f64,
    /// Enclosing band, e.g. "0.5-0.6"
    pub risk_band: String,
    pub coefficient: f64,
    pub signal: Signal,
    pub score: f64,
    pub timestamp: DateTime<Utc>,
}

impl Assessment {
    /// Derive signal and score from risk and the band coefficient
    pub fn new(
        symbol: impl Into<String>,
        price: f64,
        risk: f64,
        coefficient: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let signal = Signal::from_risk(risk);
        Self {
            symbol: symbol.into(),
            price,
            risk,
            risk_band: RiskBand::containing(risk).to_string(),
            coefficient,
            signal,
            score: signal.score(coefficient),
            timestamp,
        }
    }

    /// One-line human readable summary
    pub fn summary(&self) -> String {
        format!(
            "{} @ {:.4}: risk {:.3} (band {}, coefficient {:.3}) -> {} (score {:+.2})",
            self.symbol,
            self.price,
            self.risk,
            self.risk_band,
            self.coefficient,
            self.signal,
            self.score
        )
    }
}
