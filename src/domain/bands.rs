//! Time-in-Band Coefficients
//!
//! Risk [0, 1] is split into ten 0.1-wide bands. For each symbol we keep the
//! share of history the asset spent in each band and turn it into a
//! multiplier that rewards rarely visited bands:
//!
//! ```text
//! coefficient = 1.0 + 0.6 * (1 - percentage / max_percentage)
//! ```
//!
//! The most visited band gets exactly 1.0; a band the asset has never
//! visited gets 1.6.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::bounds::normalize_symbol;
use crate::domain::error::RiskMetricError;

/// Number of bands partitioning [0, 1]
pub const BAND_COUNT: usize = 10;

/// Width of each band
pub const BAND_WIDTH: f64 = 0.1;

/// Coefficient of the most visited band
pub const BASE_COEFFICIENT: f64 = 1.0;

/// Extra weight given to a band with zero historical occupancy
pub const RARITY_BOOST: f64 = 0.6;

/// Tolerance when checking band edges against the fixed 0.1 grid
const EDGE_EPSILON: f64 = 1e-6;

/// One of the ten fixed risk bands, by index (0 = [0.0, 0.1))
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RiskBand(u8);

impl RiskBand {
    /// Band at `index`, if it is in 0..10
    pub fn new(index: usize) -> Option<Self> {
        if index < BAND_COUNT {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    /// Band enclosing `risk`. Risk 1.0 belongs to the top band.
    pub fn containing(risk: f64) -> Self {
        let idx = (risk.clamp(0.0, 1.0) * BAND_COUNT as f64).floor() as usize;
        Self(idx.min(BAND_COUNT - 1) as u8)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn start(self) -> f64 {
        self.0 as f64 / BAND_COUNT as f64
    }

    pub fn end(self) -> f64 {
        (self.0 as f64 + 1.0) / BAND_COUNT as f64
    }

    /// All ten bands in ascending order
    pub fn all() -> impl Iterator<Item = RiskBand> {
        (0..BAND_COUNT as u8).map(RiskBand)
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}-{:.1}", self.start(), self.end())
    }
}

/// Historical share of time spent inside one band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSpentBand {
    pub band_start: f64,
    pub band_end: f64,
    pub percentage: f64,
}

/// Validated ten-band distribution for one symbol, with its coefficients.
///
/// An all-zero distribution is accepted here; asking it for a coefficient
/// fails with `DegenerateBandData`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandTable {
    symbol: String,
    bands: Vec<TimeSpentBand>,
    coefficients: Option<[f64; BAND_COUNT]>,
}

impl BandTable {
    /// Build from ten percentages in band order (0.0-0.1 first)
    pub fn from_percentages(
        symbol: impl Into<String>,
        percentages: &[f64],
    ) -> Result<Self, RiskMetricError> {
        let symbol = normalize_symbol(&symbol.into());
        if percentages.len() != BAND_COUNT {
            return Err(invalid(
                &symbol,
                format!("expected {} percentages, got {}", BAND_COUNT, percentages.len()),
            ));
        }

        let bands = RiskBand::all()
            .zip(percentages)
            .map(|(band, &percentage)| TimeSpentBand {
                band_start: band.start(),
                band_end: band.end(),
                percentage,
            })
            .collect();

        Self::from_bands(symbol, bands)
    }

    /// Build from explicit bands; they may arrive in any order
    pub fn from_bands(
        symbol: impl Into<String>,
        mut bands: Vec<TimeSpentBand>,
    ) -> Result<Self, RiskMetricError> {
        let symbol = normalize_symbol(&symbol.into());
        if bands.len() != BAND_COUNT {
            return Err(invalid(
                &symbol,
                format!("expected {} bands, got {}", BAND_COUNT, bands.len()),
            ));
        }

        bands.sort_by(|a, b| a.band_start.total_cmp(&b.band_start));

        for (band, entry) in RiskBand::all().zip(&bands) {
            let aligned = (entry.band_start - band.start()).abs() < EDGE_EPSILON
                && (entry.band_end - band.end()).abs() < EDGE_EPSILON;
            if !aligned {
                return Err(invalid(
                    &symbol,
                    format!(
                        "band [{}, {}) does not match expected [{:.1}, {:.1})",
                        entry.band_start,
                        entry.band_end,
                        band.start(),
                        band.end()
                    ),
                ));
            }
            if !(entry.percentage >= 0.0 && entry.percentage.is_finite()) {
                return Err(invalid(
                    &symbol,
                    format!("band {} has invalid percentage {}", band, entry.percentage),
                ));
            }
        }

        let coefficients = compute_coefficients(&bands);
        if coefficients.is_none() {
            tracing::warn!("Band data for {} is all zero; coefficients unavailable", symbol);
        }

        Ok(Self {
            symbol,
            bands,
            coefficients,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bands(&self) -> &[TimeSpentBand] {
        &self.bands
    }

    /// Sum of all percentages (ideally ~100)
    pub fn total_percentage(&self) -> f64 {
        self.bands.iter().map(|b| b.percentage).sum()
    }

    /// Largest single-band percentage
    pub fn max_percentage(&self) -> f64 {
        self.bands.iter().map(|b| b.percentage).fold(0.0, f64::max)
    }

    pub fn is_degenerate(&self) -> bool {
        self.coefficients.is_none()
    }

    /// Percentage recorded for `band`
    pub fn percentage(&self, band: RiskBand) -> f64 {
        self.bands[band.index()].percentage
    }

    /// Coefficient for `band`, in [1.0, 1.6]
    pub fn coefficient(&self, band: RiskBand) -> Result<f64, RiskMetricError> {
        self.coefficients
            .map(|c| c[band.index()])
            .ok_or_else(|| RiskMetricError::DegenerateBandData(self.symbol.clone()))
    }

    /// All ten coefficients in band order
    pub fn coefficients(&self) -> Result<[f64; BAND_COUNT], RiskMetricError> {
        self.coefficients
            .ok_or_else(|| RiskMetricError::DegenerateBandData(self.symbol.clone()))
    }
}

/// `None` when every percentage is zero
fn compute_coefficients(bands: &[TimeSpentBand]) -> Option<[f64; BAND_COUNT]> {
    let max = bands.iter().map(|b| b.percentage).fold(0.0, f64::max);
    if max <= 0.0 {
        return None;
    }

    let mut coefficients = [BASE_COEFFICIENT; BAND_COUNT];
    for (slot, band) in coefficients.iter_mut().zip(bands) {
        *slot = BASE_COEFFICIENT + RARITY_BOOST * (1.0 - band.percentage / max);
    }
    Some(coefficients)
}

fn invalid(symbol: &str, reason: String) -> RiskMetricError {
    RiskMetricError::InvalidBandData {
        symbol: symbol.to_string(),
        reason,
    }
}
