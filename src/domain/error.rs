//! RiskMetric Errors
//!
//! Every failure the engine can report. All of them are local validation
//! failures: none are retryable and none leave partial state behind.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RiskMetricError {
    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("Invalid bounds for {symbol}: min_price={min_price}, max_price={max_price} (need 0 < min_price < max_price)")]
    InvalidBounds {
        symbol: String,
        min_price: f64,
        max_price: f64,
    },

    #[error("Risk {0} is outside [0, 1]")]
    InvalidRiskRange(f64),

    #[error("Invalid price {0}: must be a finite number")]
    InvalidPrice(f64),

    #[error("Degenerate band data for {0}: every time-spent percentage is zero")]
    DegenerateBandData(String),

    #[error("No time-spent band data for {0}")]
    MissingBandData(String),

    #[error("Invalid band data for {symbol}: {reason}")]
    InvalidBandData { symbol: String, reason: String },

    #[error("Invalid anchor for {symbol}: {reason}")]
    InvalidAnchor { symbol: String, reason: String },

    #[error("Risk curve needs at least 2 points, got {0}")]
    InvalidCurveResolution(usize),

    #[error("Failed to record assessment: {0}")]
    HistoryWrite(String),
}

impl RiskMetricError {
    /// Short machine-friendly name, used in batch summaries and JSON output
    pub fn kind(&self) -> &'static str {
        match self {
            RiskMetricError::UnknownSymbol(_) => "unknown_symbol",
            RiskMetricError::InvalidBounds { .. } => "invalid_bounds",
            RiskMetricError::InvalidRiskRange(_) => "invalid_risk_range",
            RiskMetricError::InvalidPrice(_) => "invalid_price",
            RiskMetricError::DegenerateBandData(_) => "degenerate_band_data",
            RiskMetricError::MissingBandData(_) => "missing_band_data",
            RiskMetricError::InvalidBandData { .. } => "invalid_band_data",
            RiskMetricError::InvalidAnchor { .. } => "invalid_anchor",
            RiskMetricError::InvalidCurveResolution(_) => "invalid_curve_resolution",
            RiskMetricError::HistoryWrite(_) => "history_write",
        }
    }
}
