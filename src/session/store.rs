//! SessionStore - one JSON file per session
//!
//! Files are named `<kind>-session-<uuid>.json` inside the session directory.

use super::id::resolve_session_id;
use crate::error::WorkflowError;
use crate::models::{SessionKind, SessionRecord};
use crate::persist::write_json_atomic;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, kind: SessionKind, id: &Uuid) -> PathBuf {
        self.dir
            .join(format!("{}{}.json", kind.file_prefix(), id.hyphenated()))
    }

    fn read<R: SessionRecord>(path: &Path) -> Result<R> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let record = serde_json::from_str(&content).map_err(|e| WorkflowError::CorruptSession {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(record)
    }

    /// All sessions of type `R`, newest first
    pub fn list<R: SessionRecord>(&self) -> Result<Vec<R>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let prefix = R::KIND.file_prefix();
        let mut records = Vec::new();
        for entry in fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to list {}", self.dir.display()))?
        {
            let path = entry?.path();
            let is_session_file = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(prefix) && name.ends_with(".json"));
            if is_session_file {
                records.push(Self::read::<R>(&path)?);
            }
        }

        records.sort_by(|a, b| b.header().started_at.cmp(&a.header().started_at));
        Ok(records)
    }

    /// Load one session by full or short id
    pub fn load<R: SessionRecord>(&self, id: &str) -> Result<R> {
        let uuid = resolve_session_id(id)?;
        let path = self.path_for(R::KIND, &uuid);
        if !path.exists() {
            return Err(WorkflowError::SessionNotFound {
                kind: R::KIND,
                id: id.to_string(),
            }
            .into());
        }
        Self::read(&path)
    }

    /// Load a session record from an explicit file (`--resume-file`)
    pub fn load_file<R: SessionRecord>(&self, path: &Path) -> Result<R> {
        let record: R = Self::read(path)?;
        resolve_session_id(record.session_id())?;
        Ok(record)
    }

    /// Write the whole record, replacing any previous checkpoint
    pub fn save<R: SessionRecord>(&self, record: &R) -> Result<()> {
        let uuid = resolve_session_id(record.session_id())?;
        let path = self.path_for(R::KIND, &uuid);
        debug!(
            kind = %R::KIND,
            session_id = record.session_id(),
            current_index = record.header().current_index,
            "Checkpointing session"
        );
        write_json_atomic(&path, record)
    }

    /// Delete a session file. Returns whether one existed.
    pub fn delete<R: SessionRecord>(&self, id: &str) -> Result<bool> {
        let uuid = resolve_session_id(id)?;
        let path = self.path_for(R::KIND, &uuid);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).with_context(|| format!("Failed to delete {}", path.display()))?;
        Ok(true)
    }

    /// Most recent session that has not completed
    pub fn latest_incomplete<R: SessionRecord>(&self) -> Result<Option<R>> {
        Ok(self
            .list::<R>()?
            .into_iter()
            .find(|record| record.header().completed_at.is_none()))
    }

    /// Delete every session of type `R`; returns how many were removed
    pub fn delete_all<R: SessionRecord>(&self) -> Result<usize> {
        let records = self.list::<R>()?;
        for record in &records {
            self.delete::<R>(record.session_id())?;
        }
        Ok(records.len())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::fixtures::work_item;
    use crate::models::{AuditMark, AuditSession, ImproveSession};
    use crate::session::id::encode_short;
    use chrono::{Duration, Utc};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn setup_store() -> (TempDir, SessionStore) {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::new(temp.path().join("session-reports"));
        (temp, store)
    }

    fn audit(age_minutes: i64) -> AuditSession {
        let mut session = AuditSession::new(
            vec![work_item("a.py", "f"), work_item("a.py", "g")],
            BTreeMap::new(),
            serde_json::json!({}),
        );
        session.header.started_at = Utc::now() - Duration::minutes(age_minutes);
        session
    }

    #[test]
    fn test_save_and_load() {
        let (_temp, store) = setup_store();
        let mut session = audit(0);
        let first = session.items[0].clone();
        session.mark(&first, AuditMark::rated(3));

        store.save(&session).unwrap();
        let loaded: AuditSession = store.load(&session.header.session_id).unwrap();

        assert_eq!(loaded, session);
    }

    #[test]
    fn test_save_is_idempotent_overwrite() {
        let (_temp, store) = setup_store();
        let mut session = audit(0);
        store.save(&session).unwrap();
        session.header.current_index = 1;
        store.save(&session).unwrap();
        store.save(&session).unwrap();

        let all: Vec<AuditSession> = store.list().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].header.current_index, 1);
    }

    #[test]
    fn test_load_by_short_id() {
        let (_temp, store) = setup_store();
        let session = audit(0);
        store.save(&session).unwrap();

        let uuid = Uuid::parse_str(&session.header.session_id).unwrap();
        let loaded: AuditSession = store.load(&encode_short(&uuid)).unwrap();

        assert_eq!(loaded.header.session_id, session.header.session_id);
    }

    #[test]
    fn test_list_newest_first_and_by_kind() {
        let (_temp, store) = setup_store();
        let old = audit(30);
        let new = audit(1);
        store.save(&old).unwrap();
        store.save(&new).unwrap();
        store
            .save(&ImproveSession::new(vec![], BTreeMap::new(), serde_json::json!({})))
            .unwrap();

        let audits: Vec<AuditSession> = store.list().unwrap();
        assert_eq!(audits.len(), 2);
        assert_eq!(audits[0].header.session_id, new.header.session_id);

        let improves: Vec<ImproveSession> = store.list().unwrap();
        assert_eq!(improves.len(), 1);
    }

    #[test]
    fn test_malformed_id_fails_before_storage() {
        let (_temp, store) = setup_store();

        let err = store.load::<AuditSession>("../../secrets").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WorkflowError>(),
            Some(WorkflowError::InvalidSessionId(_))
        ));
        assert!(!store.dir().exists());
    }

    #[test]
    fn test_missing_session() {
        let (_temp, store) = setup_store();
        let err = store
            .load::<AuditSession>(&Uuid::new_v4().to_string())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WorkflowError>(),
            Some(WorkflowError::SessionNotFound { .. })
        ));
    }

    #[test]
    fn test_corrupt_session_is_fatal() {
        let (_temp, store) = setup_store();
        let session = audit(0);
        store.save(&session).unwrap();
        let uuid = Uuid::parse_str(&session.header.session_id).unwrap();
        fs::write(store.path_for(SessionKind::Audit, &uuid), "{ truncated").unwrap();

        let err = store.list::<AuditSession>().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WorkflowError>(),
            Some(WorkflowError::CorruptSession { .. })
        ));
    }

    #[test]
    fn test_latest_incomplete_and_delete_all() {
        let (_temp, store) = setup_store();
        let mut finished = audit(1);
        finished.header.completed_at = Some(Utc::now());
        let paused = audit(10);
        store.save(&finished).unwrap();
        store.save(&paused).unwrap();

        let latest: AuditSession = store.latest_incomplete().unwrap().unwrap();
        assert_eq!(latest.header.session_id, paused.header.session_id);

        assert!(store.delete::<AuditSession>(&paused.header.session_id).unwrap());
        assert!(!store.delete::<AuditSession>(&paused.header.session_id).unwrap());

        assert_eq!(store.delete_all::<AuditSession>().unwrap(), 1);
        assert!(store.list::<AuditSession>().unwrap().is_empty());
    }
}
