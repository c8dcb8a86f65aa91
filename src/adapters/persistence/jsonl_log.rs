//! JSON-lines Assessment Log
//!
//! One assessment per line, append-only. A missing file is an empty history.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::domain::assessment::Assessment;
use crate::ports::assessment_log::{AssessmentLog, HistoryError};

/// Default history file name
pub const DEFAULT_HISTORY_FILE: &str = "assessments.jsonl";

#[derive(Debug)]
pub struct JsonlAssessmentLog {
    path: PathBuf,
    /// Serializes appends from this process
    write_lock: Mutex<()>,
}

impl JsonlAssessmentLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Log at the default file name inside `data_dir`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(DEFAULT_HISTORY_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AssessmentLog for JsonlAssessmentLog {
    fn append(&self, assessment: &Assessment) -> Result<(), HistoryError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| HistoryError::Io(e.to_string()))?;
        }

        let mut line = serde_json::to_string(assessment)
            .map_err(|e| HistoryError::Serialization(e.to_string()))?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| HistoryError::Io(format!("{}: {}", self.path.display(), e)))?;

        file.write_all(line.as_bytes())
            .map_err(|e| HistoryError::Io(e.to_string()))?;

        tracing::debug!(
            "Recorded {} assessment in {}",
            assessment.symbol,
            self.path.display()
        );
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<Assessment>, HistoryError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| HistoryError::Io(format!("{}: {}", self.path.display(), e)))?;

        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                serde_json::from_str(line).map_err(|e| HistoryError::Corrupted {
                    line: idx + 1,
                    reason: e.to_string(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    fn assessment(symbol: &str, price: f64, risk: f64) -> Assessment {
        Assessment::new(
            symbol,
            price,
            risk,
            1.2,
            Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap(),
        )
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let log = JsonlAssessmentLog::in_dir(dir.path());
        assert!(log.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_append_and_read_in_order() {
        let dir = tempdir().unwrap();
        let log = JsonlAssessmentLog::new(dir.path().join("nested/history.jsonl"));

        log.append(&assessment("BTC", 114_222.0, 0.58)).unwrap();
        log.append(&assessment("ETH", 2_500.0, 0.45)).unwrap();

        let entries = log.read_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].symbol, "BTC");
        assert_eq!(entries[1].symbol, "ETH");

        let raw = fs::read_to_string(log.path()).unwrap();
        assert_eq!(raw.lines().count(), 2);
    }

    #[test]
    fn test_append_never_rewrites_existing_lines() {
        let dir = tempdir().unwrap();
        let log = JsonlAssessmentLog::in_dir(dir.path());

        log.append(&assessment("BTC", 50_000.0, 0.2)).unwrap();
        let first = fs::read_to_string(log.path()).unwrap();

        log.append(&assessment("BTC", 60_000.0, 0.3)).unwrap();
        let second = fs::read_to_string(log.path()).unwrap();

        assert!(second.starts_with(&first));
    }

    #[test]
    fn test_corrupted_line_reported() {
        let dir = tempdir().unwrap();
        let log = JsonlAssessmentLog::in_dir(dir.path());
        log.append(&assessment("BTC", 50_000.0, 0.2)).unwrap();

        let mut file = OpenOptions::new().append(true).open(log.path()).unwrap();
        writeln!(file, "{{not json").unwrap();

        let err = log.read_all().unwrap_err();
        assert!(matches!(err, HistoryError::Corrupted { line: 2, .. }));
    }

    #[test]
    fn test_blank_lines_skipped() {
        let dir = tempdir().unwrap();
        let log = JsonlAssessmentLog::in_dir(dir.path());
        log.append(&assessment("SOL", 150.0, 0.7)).unwrap();

        let mut file = OpenOptions::new().append(true).open(log.path()).unwrap();
        writeln!(file).unwrap();

        assert_eq!(log.read_all().unwrap().len(), 1);
    }
}
