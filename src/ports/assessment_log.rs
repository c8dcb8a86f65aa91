//! Assessment Log Port
//!
//! Append-only audit trail of every assessment the engine produced.

use thiserror::Error;

use crate::domain::assessment::Assessment;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HistoryError {
    #[error("History I/O error: {0}")]
    Io(String),

    #[error("Failed to serialize assessment: {0}")]
    Serialization(String),

    #[error("History corrupted at line {line}: {reason}")]
    Corrupted { line: usize, reason: String },
}

/// Append-only log of assessments. Entries are never mutated or removed.
#[cfg_attr(test, mockall::automock)]
pub trait AssessmentLog {
    /// Append one assessment to the end of the log
    fn append(&self, assessment: &Assessment) -> Result<(), HistoryError>;

    /// Read every assessment in append order
    fn read_all(&self) -> Result<Vec<Assessment>, HistoryError>;
}
