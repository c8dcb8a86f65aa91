//! Risk Curve
//!
//! Deterministic price <-> risk lookup table for one symbol.
//!
//! Risk values are spaced evenly: `r_i = i / (N - 1)`, and each price sits on
//! the log-linear curve between the bounds:
//!
//! ```text
//! price_i = min_price * exp(r_i * ln(max_price / min_price))
//! ```
//!
//! An optional anchor forces a known `(risk, price)` pair into the table.
//! Lookups interpolate linearly between the two bracketing points and clamp
//! to the table's endpoints outside its range.

use serde::{Deserialize, Serialize};

use crate::domain::bounds::SymbolBounds;
use crate::domain::error::RiskMetricError;

/// Default table resolution (step 0.025)
pub const DEFAULT_CURVE_POINTS: usize = 41;

/// Two risk values closer than this address the same table entry
const RISK_EPSILON: f64 = 1e-9;

/// A single entry in the lookup table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskLevelPoint {
    pub risk: f64,
    pub price: f64,
}

/// A known-correct `(risk, price)` pair forced into the table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchorPoint {
    pub risk: f64,
    pub price: f64,
}

impl AnchorPoint {
    pub fn new(risk: f64, price: f64) -> Self {
        Self { risk, price }
    }

    fn validate(&self, symbol: &str) -> Result<(), RiskMetricError> {
        if !(0.0..=1.0).contains(&self.risk) {
            return Err(RiskMetricError::InvalidAnchor {
                symbol: symbol.to_string(),
                reason: format!("risk {} is outside [0, 1]", self.risk),
            });
        }
        if !(self.price > 0.0 && self.price.is_finite()) {
            return Err(RiskMetricError::InvalidAnchor {
                symbol: symbol.to_string(),
                reason: format!("price {} must be positive and finite", self.price),
            });
        }
        Ok(())
    }
}

/// Ordered lookup table, non-decreasing in both risk and price.
/// Always holds at least two points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskCurve {
    symbol: String,
    points: Vec<RiskLevelPoint>,
}

/// Build the lookup table for `bounds` with `points` evenly spaced risk levels
pub fn build_risk_table(
    bounds: &SymbolBounds,
    points: usize,
    anchor: Option<AnchorPoint>,
) -> Result<RiskCurve, RiskMetricError> {
    bounds.validate()?;
    if points < 2 {
        return Err(RiskMetricError::InvalidCurveResolution(points));
    }

    let last = points - 1;
    let mut table: Vec<RiskLevelPoint> = (0..points)
        .map(|i| {
            let risk = i as f64 / last as f64;
            // Endpoints are pinned rather than computed through exp/ln
            let price = if i == 0 {
                bounds.min_price
            } else if i == last {
                bounds.max_price
            } else {
                bounds.price_at(risk)
            };
            RiskLevelPoint { risk, price }
        })
        .collect();

    if let Some(anchor) = anchor {
        anchor.validate(&bounds.symbol)?;
        insert_anchor(&mut table, anchor);
    }

    if let Some((lo, hi)) = first_decrease(&table) {
        let reason = format!(
            "curve not monotonic between risk {} (price {:.4}) and risk {} (price {:.4})",
            lo.risk, lo.price, hi.risk, hi.price
        );
        return Err(match anchor {
            Some(anchor) => RiskMetricError::InvalidAnchor {
                symbol: bounds.symbol.clone(),
                reason: format!(
                    "anchor ({}, {}) breaks monotonicity: {}",
                    anchor.risk, anchor.price, reason
                ),
            },
            None => RiskMetricError::InvalidBounds {
                symbol: bounds.symbol.clone(),
                min_price: bounds.min_price,
                max_price: bounds.max_price,
            },
        });
    }

    tracing::debug!(
        "Built risk curve for {}: {} points, {:.4} -> {:.4}{}",
        bounds.symbol,
        table.len(),
        bounds.min_price,
        bounds.max_price,
        if anchor.is_some() { " (anchored)" } else { "" }
    );

    Ok(RiskCurve {
        symbol: bounds.symbol.clone(),
        points: table,
    })
}

/// Overwrite the entry at the anchor's risk, or insert it in order
fn insert_anchor(table: &mut Vec<RiskLevelPoint>, anchor: AnchorPoint) {
    let point = RiskLevelPoint {
        risk: anchor.risk,
        price: anchor.price,
    };

    if let Some(existing) = table
        .iter_mut()
        .find(|p| (p.risk - anchor.risk).abs() < RISK_EPSILON)
    {
        existing.price = anchor.price;
        return;
    }

    let idx = table.partition_point(|p| p.risk < anchor.risk);
    table.insert(idx, point);
}

/// First adjacent pair whose price decreases or is not finite
fn first_decrease(table: &[RiskLevelPoint]) -> Option<(RiskLevelPoint, RiskLevelPoint)> {
    table
        .windows(2)
        .find(|w| w[1].price < w[0].price || !w[1].price.is_finite())
        .map(|w| (w[0], w[1]))
}

impl RiskCurve {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[RiskLevelPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn first(&self) -> RiskLevelPoint {
        self.points[0]
    }

    fn last(&self) -> RiskLevelPoint {
        self.points[self.points.len() - 1]
    }

    /// Lowest price in the table (risk 0.0 unless anchored there)
    pub fn min_price(&self) -> f64 {
        self.first().price
    }

    /// Highest price in the table
    pub fn max_price(&self) -> f64 {
        self.last().price
    }

    /// Interpolated risk for `price`; clamps to the endpoint risks outside the table
    pub fn risk_for_price(&self, price: f64) -> Result<f64, RiskMetricError> {
        if price.is_nan() {
            return Err(RiskMetricError::InvalidPrice(price));
        }

        let (first, last) = (self.first(), self.last());
        if price <= first.price {
            return Ok(first.risk);
        }
        if price >= last.price {
            return Ok(last.risk);
        }

        for pair in self.points.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if lo.price <= price && price <= hi.price {
                let span = hi.price - lo.price;
                if span == 0.0 {
                    return Ok(lo.risk);
                }
                return Ok(lo.risk + (price - lo.price) / span * (hi.risk - lo.risk));
            }
        }

        Ok(last.risk)
    }

    /// Interpolated price for `risk`; `risk` must lie in [0, 1]
    pub fn price_for_risk(&self, risk: f64) -> Result<f64, RiskMetricError> {
        if !(0.0..=1.0).contains(&risk) {
            return Err(RiskMetricError::InvalidRiskRange(risk));
        }

        let (first, last) = (self.first(), self.last());
        if risk <= first.risk {
            return Ok(first.price);
        }
        if risk >= last.risk {
            return Ok(last.price);
        }

        for pair in self.points.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if lo.risk <= risk && risk <= hi.risk {
                let span = hi.risk - lo.risk;
                if span == 0.0 {
                    return Ok(lo.price);
                }
                return Ok(lo.price + (risk - lo.risk) / span * (hi.price - lo.price));
            }
        }

        Ok(last.price)
    }
}
