//! Transaction / commit log for file edits made by improve sessions
//!
//! Every accepted write is journaled with a backup of the file's previous
//! contents. The log is the authority on whether a session's writes were
//! committed or reverted.

use crate::integrity::checksum_file;
use crate::persist::{read_json, write_json_atomic};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    InProgress,
    Committed,
    RolledBack,
    PartiallyRolledBack,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProgress => write!(f, "in progress"),
            Self::Committed => write!(f, "committed"),
            Self::RolledBack => write!(f, "rolled back"),
            Self::PartiallyRolledBack => write!(f, "partially rolled back"),
        }
    }
}

/// One file write made on behalf of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteEntry {
    pub entry_id: String,
    pub filepath: String,
    pub backup_path: PathBuf,
    pub item_name: String,
    pub item_type: String,
    pub language: String,
    pub written_at: DateTime<Utc>,
    /// Checksum right after the write; used to detect later edits
    pub checksum_after: String,
    #[serde(default)]
    pub rolled_back: bool,
}

impl WriteEntry {
    pub fn new(
        filepath: impl Into<String>,
        backup_path: impl Into<PathBuf>,
        item_name: impl Into<String>,
        item_type: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            entry_id: Uuid::new_v4().to_string(),
            filepath: filepath.into(),
            backup_path: backup_path.into(),
            item_name: item_name.into(),
            item_type: item_type.into(),
            language: language.into(),
            written_at: Utc::now(),
            checksum_after: String::new(),
            rolled_back: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSummary {
    pub session_id: String,
    pub status: TransactionStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackTarget {
    /// Most recent write that is still applied
    Last,
    Entry(String),
}

impl RollbackTarget {
    pub fn parse(value: &str) -> Self {
        if value == "last" {
            RollbackTarget::Last
        } else {
            RollbackTarget::Entry(value.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackReport {
    pub success: bool,
    /// Files edited since the write, left untouched
    pub conflicts: Vec<String>,
    pub restored: Vec<String>,
}

pub trait TransactionLog: Send + Sync {
    fn begin_transaction(&self, session_id: &str) -> Result<()>;
    fn record_write(&self, session_id: &str, entry: WriteEntry) -> Result<()>;
    fn commit_transaction(&self, session_id: &str) -> Result<()>;
    fn rollback_change(&self, target: &RollbackTarget) -> Result<RollbackReport>;
    fn list_sessions(&self) -> Result<Vec<TransactionSummary>>;

    /// Status of one transaction; `None` if the log has never seen it
    fn status(&self, session_id: &str) -> Result<Option<TransactionStatus>> {
        Ok(self
            .list_sessions()?
            .into_iter()
            .find(|summary| summary.session_id == session_id)
            .map(|summary| summary.status))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TransactionRecord {
    session_id: String,
    status: TransactionStatus,
    started_at: DateTime<Utc>,
    #[serde(default)]
    committed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    entries: Vec<WriteEntry>,
}

impl TransactionRecord {
    fn refresh_status(&mut self) {
        let reverted = self.entries.iter().filter(|e| e.rolled_back).count();
        if reverted == 0 {
            return;
        }
        self.status = if reverted == self.entries.len() {
            TransactionStatus::RolledBack
        } else {
            TransactionStatus::PartiallyRolledBack
        };
    }
}

/// JSON journal: one file per transaction under `dir`
pub struct FileTransactionLog {
    dir: PathBuf,
}

impl FileTransactionLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", session_id))
    }

    fn load(&self, session_id: &str) -> Result<TransactionRecord> {
        read_json(&self.path_for(session_id))?
            .with_context(|| format!("No transaction found for session {}", session_id))
    }

    fn save(&self, record: &TransactionRecord) -> Result<()> {
        write_json_atomic(&self.path_for(&record.session_id), record)
    }

    fn load_all(&self) -> Result<Vec<TransactionRecord>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut records = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(record) = read_json::<TransactionRecord>(&path)? {
                    records.push(record);
                }
            }
        }
        Ok(records)
    }

    fn revert(entry: &mut WriteEntry) -> Result<bool> {
        let path = Path::new(&entry.filepath);
        let unchanged = match checksum_file(path) {
            Ok(current) => current == entry.checksum_after,
            Err(_) => false,
        };
        if !unchanged {
            warn!(filepath = %entry.filepath, "File changed since docpilot wrote it, not reverting");
            return Ok(false);
        }

        fs::copy(&entry.backup_path, path).with_context(|| {
            format!(
                "Failed to restore {} from {}",
                entry.filepath,
                entry.backup_path.display()
            )
        })?;
        entry.rolled_back = true;
        Ok(true)
    }
}

impl TransactionLog for FileTransactionLog {
    fn begin_transaction(&self, session_id: &str) -> Result<()> {
        if self.path_for(session_id).exists() {
            return Ok(());
        }
        self.save(&TransactionRecord {
            session_id: session_id.to_string(),
            status: TransactionStatus::InProgress,
            started_at: Utc::now(),
            committed_at: None,
            entries: Vec::new(),
        })
    }

    fn record_write(&self, session_id: &str, mut entry: WriteEntry) -> Result<()> {
        let mut record = self.load(session_id)?;
        if record.status != TransactionStatus::InProgress {
            anyhow::bail!(
                "Transaction {} is {}, cannot record more writes",
                session_id,
                record.status
            );
        }
        entry.checksum_after = checksum_file(Path::new(&entry.filepath))
            .with_context(|| format!("Failed to checksum {}", entry.filepath))?;
        record.entries.push(entry);
        self.save(&record)
    }

    fn commit_transaction(&self, session_id: &str) -> Result<()> {
        let mut record = self.load(session_id)?;
        record.status = TransactionStatus::Committed;
        record.committed_at = Some(Utc::now());
        info!(session_id, writes = record.entries.len(), "Transaction committed");
        self.save(&record)
    }

    fn rollback_change(&self, target: &RollbackTarget) -> Result<RollbackReport> {
        let mut records = self.load_all()?;

        let located = records
            .iter()
            .enumerate()
            .flat_map(|(r, record)| {
                record
                    .entries
                    .iter()
                    .enumerate()
                    .filter(|(_, entry)| !entry.rolled_back)
                    .map(move |(e, entry)| (r, e, entry))
            })
            .filter(|(_, _, entry)| match target {
                RollbackTarget::Last => true,
                RollbackTarget::Entry(id) => &entry.entry_id == id,
            })
            .max_by_key(|(_, _, entry)| entry.written_at)
            .map(|(r, e, _)| (r, e));

        let Some((r, e)) = located else {
            anyhow::bail!("Nothing to roll back for {:?}", target);
        };

        let record = &mut records[r];
        let entry = &mut record.entries[e];
        let filepath = entry.filepath.clone();
        let report = if Self::revert(entry)? {
            RollbackReport {
                success: true,
                conflicts: Vec::new(),
                restored: vec![filepath],
            }
        } else {
            RollbackReport {
                success: false,
                conflicts: vec![filepath],
                restored: Vec::new(),
            }
        };

        record.refresh_status();
        self.save(record)?;
        Ok(report)
    }

    fn list_sessions(&self) -> Result<Vec<TransactionSummary>> {
        let mut records = self.load_all()?;
        records.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(records
            .into_iter()
            .map(|record| TransactionSummary {
                session_id: record.session_id,
                status: record.status,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FileTransactionLog, PathBuf) {
        let temp = TempDir::new().unwrap();
        let log = FileTransactionLog::new(temp.path().join("transactions"));
        let source = temp.path().join("lib.py");
        fs::write(&source, "def f():\n    pass\n").unwrap();
        (temp, log, source)
    }

    /// Simulate a write: back the file up, change it, journal it
    fn write_through(log: &FileTransactionLog, session: &str, source: &Path, text: &str) -> String {
        let backup = source.with_extension(format!("{}.bak", Uuid::new_v4()));
        fs::copy(source, &backup).unwrap();
        fs::write(source, text).unwrap();
        let entry = WriteEntry::new(source.to_string_lossy(), &backup, "f", "function", "python");
        let id = entry.entry_id.clone();
        log.record_write(session, entry).unwrap();
        id
    }

    #[test]
    fn test_unknown_session_has_no_status() {
        let (_temp, log, _) = setup();
        assert_eq!(log.status("nope").unwrap(), None);
    }

    #[test]
    fn test_begin_and_commit() {
        let (_temp, log, source) = setup();
        log.begin_transaction("s1").unwrap();
        assert_eq!(log.status("s1").unwrap(), Some(TransactionStatus::InProgress));

        write_through(&log, "s1", &source, "# docs\ndef f():\n    pass\n");
        log.commit_transaction("s1").unwrap();

        assert_eq!(log.status("s1").unwrap(), Some(TransactionStatus::Committed));
        assert!(log
            .record_write("s1", WriteEntry::new("x", "y", "f", "function", "python"))
            .is_err());
    }

    #[test]
    fn test_rollback_last_restores_backup() {
        let (_temp, log, source) = setup();
        log.begin_transaction("s1").unwrap();
        write_through(&log, "s1", &source, "# docs\ndef f():\n    pass\n");

        let report = log.rollback_change(&RollbackTarget::Last).unwrap();

        assert!(report.success);
        assert_eq!(fs::read_to_string(&source).unwrap(), "def f():\n    pass\n");
        assert_eq!(log.status("s1").unwrap(), Some(TransactionStatus::RolledBack));
    }

    #[test]
    fn test_partial_rollback_status() {
        let (_temp, log, source) = setup();
        log.begin_transaction("s1").unwrap();
        let first = write_through(&log, "s1", &source, "v2");
        write_through(&log, "s1", &source, "v3");

        // Rolling back the older write conflicts: the file moved on to v3
        let report = log
            .rollback_change(&RollbackTarget::Entry(first))
            .unwrap();
        assert!(!report.success);
        assert_eq!(report.conflicts.len(), 1);

        let report = log.rollback_change(&RollbackTarget::Last).unwrap();
        assert!(report.success);
        assert_eq!(fs::read_to_string(&source).unwrap(), "v2");
        assert_eq!(
            log.status("s1").unwrap(),
            Some(TransactionStatus::PartiallyRolledBack)
        );
    }

    #[test]
    fn test_rollback_with_nothing_recorded() {
        let (_temp, log, _) = setup();
        assert!(log.rollback_change(&RollbackTarget::Last).is_err());
        assert_eq!(RollbackTarget::parse("last"), RollbackTarget::Last);
    }
}
