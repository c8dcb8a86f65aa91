use std::sync::{Mutex, PoisonError};

use crate::domain::assessment::Assessment;
use crate::ports::assessment_log::{AssessmentLog, HistoryError};

/// In-process assessment log
#[derive(Debug, Default)]
pub struct MemoryAssessmentLog {
    entries: Mutex<Vec<Assessment>>,
}

impl MemoryAssessmentLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every recorded assessment
    pub fn entries(&self) -> Vec<Assessment> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AssessmentLog for MemoryAssessmentLog {
    fn append(&self, assessment: &Assessment) -> Result<(), HistoryError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(assessment.clone());
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<Assessment>, HistoryError> {
        Ok(self.entries())
    }
}
