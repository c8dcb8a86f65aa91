//! Domain Layer - Core RiskMetric logic
//!
//! Pure types and math with no I/O. All persistence happens through the
//! ports layer.
//!
//! - `bounds`: per-symbol price band
//! - `curve`: log-linear risk <-> price lookup table
//! - `bands`: time-in-band distribution and coefficients
//! - `signal`: risk thresholds -> signal and score
//! - `assessment`: immutable assessment record
//! - `store`: explicit owner of all per-symbol tables

pub mod error;
pub mod bounds;
pub mod curve;
pub mod bands;
pub mod signal;
pub mod assessment;
pub mod store;

pub use error::RiskMetricError;
pub use bounds::{normalize_symbol, SymbolBounds};
pub use curve::{build_risk_table, AnchorPoint, RiskCurve, RiskLevelPoint, DEFAULT_CURVE_POINTS};
pub use bands::{BandTable, RiskBand, TimeSpentBand, BAND_COUNT};
pub use signal::Signal;
pub use assessment::Assessment;
pub use store::{RiskMetricStore, ValidationPolicy};
