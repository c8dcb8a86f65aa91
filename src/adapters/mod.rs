//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Persistence: JSON-lines assessment history, bounds override file
//! - CLI: Command-line interface handlers

pub mod persistence;
pub mod cli;

pub use persistence::{JsonlAssessmentLog, MemoryAssessmentLog, BoundsOverrideFile};
pub use cli::CliApp;
