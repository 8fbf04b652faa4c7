//! Append-only evolution history.
//!
//! Every evolution attempt that produces a record is appended to a
//! durable log, one self-contained JSON object per line. The log is
//! never rewritten or compacted; ordering is insertion order.

use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use quill_core::EvolutionRecord;

/// Errors from history persistence.
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("history I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("history record serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Append-only sink for evolution records.
pub trait HistoryLog: Send + Sync {
    /// Append one record; must be durable once this returns `Ok`.
    fn append(&self, record: &EvolutionRecord) -> Result<(), HistoryError>;
}

/// JSON-lines history log backed by a single file.
///
/// The file is opened lazily in append mode and flushed after every
/// record. Appends are serialized behind a mutex so a log can be shared
/// between engine instances.
pub struct JsonlHistoryLog {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl JsonlHistoryLog {
    /// Create a log writer for the given path. The file is created on
    /// first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
        }
    }

    /// Path of the underlying log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reload the full log, in insertion order.
    ///
    /// Not used by the engine pipeline (write path only); external
    /// viewers call this. Blank lines are skipped.
    pub fn load(path: impl AsRef<Path>) -> Result<Vec<EvolutionRecord>, HistoryError> {
        let file = File::open(path.as_ref())?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }
}

impl HistoryLog for JsonlHistoryLog {
    fn append(&self, record: &EvolutionRecord) -> Result<(), HistoryError> {
        let line = serde_json::to_string(record)?;

        let mut guard = self.file.lock();
        let file = match &mut *guard {
            Some(file) => file,
            slot => {
                if let Some(parent) = self.path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                let opened = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)?;
                slot.insert(opened)
            }
        };
        writeln!(file, "{line}")?;
        file.flush()?;

        tracing::info!(
            document_id = %record.document_id,
            path = %self.path.display(),
            "appended evolution record"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use quill_core::{ChangedLine, Document};

    fn record_for(id: &str) -> EvolutionRecord {
        let doc = Document::new(id, vec!["# T".into(), "lead".into()]);
        let (_, mut record) = quill_core::apply(&doc, "new lead");
        record.timestamp = Utc::now();
        record
    }

    #[test]
    fn test_append_and_load_preserve_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let log = JsonlHistoryLog::new(&path);

        log.append(&record_for("first")).unwrap();
        log.append(&record_for("second")).unwrap();

        let records = JsonlHistoryLog::load(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].document_id, "first");
        assert_eq!(records[1].document_id, "second");
    }

    #[test]
    fn test_append_is_one_json_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let log = JsonlHistoryLog::new(&path);

        log.append(&record_for("only")).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = raw.trim_end().split('\n').collect();
        assert_eq!(lines.len(), 1);
        let parsed: EvolutionRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.document_id, "only");
    }

    #[test]
    fn test_reopened_log_keeps_appending() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");

        JsonlHistoryLog::new(&path).append(&record_for("a")).unwrap();
        // A fresh writer simulates a process restart
        JsonlHistoryLog::new(&path).append(&record_for("b")).unwrap();

        let records = JsonlHistoryLog::load(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].document_id, "b");
    }

    #[test]
    fn test_record_fields_survive_the_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let log = JsonlHistoryLog::new(&path);

        let record = record_for("post-1");
        log.append(&record).unwrap();

        let loaded = &JsonlHistoryLog::load(&path).unwrap()[0];
        assert_eq!(loaded.suggestion, "new lead");
        assert_eq!(
            loaded.changed_lines,
            vec![ChangedLine {
                line_number: 2,
                original: "lead".to_string(),
                evolved: "new lead".to_string(),
            }]
        );
        assert_eq!(loaded.title.as_deref(), Some("# T"));
    }
}
