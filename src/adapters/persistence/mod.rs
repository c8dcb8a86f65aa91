//! Persistence Adapters
//!
//! File-backed implementations of the storage ports plus the bounds
//! override file.

pub mod jsonl_log;
pub mod memory_log;
pub mod overrides;

pub use jsonl_log::{JsonlAssessmentLog, DEFAULT_HISTORY_FILE};
pub use memory_log::MemoryAssessmentLog;
pub use overrides::{BoundsOverride, BoundsOverrideFile, OverrideError, DEFAULT_OVERRIDES_FILE};
