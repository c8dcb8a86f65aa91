//! Ports Layer - Trait definitions for external dependencies
//!
//! Following hexagonal architecture, the engine only talks to storage
//! through these traits:
//! - Assessment history (append-only audit trail)

pub mod assessment_log;

pub use assessment_log::{AssessmentLog, HistoryError};

#[cfg(test)]
pub use assessment_log::MockAssessmentLog;
