//! RiskMetric - price/risk interpolation and scoring engine
//!
//! Maps an asset's price onto a [0, 1] risk scale between configured bounds,
//! weights signals by how rarely the asset visits each risk band, and keeps
//! an append-only history of every assessment.
//!
//! # Modules
//!
//! - `domain`: Core logic (SymbolBounds, RiskCurve, BandTable, Signal, RiskMetricStore)
//! - `ports`: Trait abstractions (AssessmentLog)
//! - `adapters`: External implementations (JSON-lines history, overrides file, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Assessor and store bootstrap

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
