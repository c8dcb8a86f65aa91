//! Symbol Bounds
//!
//! The `{min_price, max_price}` anchor pair that defines where an asset's
//! risk runs from 0.0 to 1.0. Risk is the position of `ln(price)` rescaled
//! linearly between `ln(min_price)` and `ln(max_price)`.

use serde::{Deserialize, Serialize};

use crate::domain::error::RiskMetricError;

/// Normalize a symbol for use as a store key ("btc " -> "BTC")
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_ascii_uppercase()
}

/// Price band for a single asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolBounds {
    pub symbol: String,
    pub min_price: f64,
    pub max_price: f64,
}

impl SymbolBounds {
    /// Create validated bounds
    pub fn new(
        symbol: impl AsRef<str>,
        min_price: f64,
        max_price: f64,
    ) -> Result<Self, RiskMetricError> {
        let bounds = Self {
            symbol: normalize_symbol(symbol.as_ref()),
            min_price,
            max_price,
        };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Check `0 < min_price < max_price` with both finite.
    /// Written with negated comparisons so NaN fails too.
    pub fn validate(&self) -> Result<(), RiskMetricError> {
        let valid = self.min_price > 0.0
            && self.max_price > self.min_price
            && self.max_price.is_finite();

        if !valid {
            return Err(RiskMetricError::InvalidBounds {
                symbol: self.symbol.clone(),
                min_price: self.min_price,
                max_price: self.max_price,
            });
        }
        Ok(())
    }

    /// `ln(max_price) - ln(min_price)`; finite for any valid bounds,
    /// even when the ratio itself would overflow.
    pub fn log_span(&self) -> f64 {
        self.max_price.ln() - self.min_price.ln()
    }

    /// Price on the pure log-linear curve at `risk`
    pub fn price_at(&self, risk: f64) -> f64 {
        (self.min_price.ln() + risk * self.log_span()).exp()
    }

    /// Risk on the pure log-linear curve at `price`, clamped to [0, 1]
    pub fn risk_at(&self, price: f64) -> f64 {
        if price <= self.min_price {
            return 0.0;
        }
        if price >= self.max_price {
            return 1.0;
        }
        ((price.ln() - self.min_price.ln()) / self.log_span()).clamp(0.0, 1.0)
    }

    /// Ratio of max to min price (10.0 means one decade of range)
    pub fn range_multiple(&self) -> f64 {
        self.max_price / self.min_price
    }
}
