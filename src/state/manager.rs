//! WorkflowStateStore - workflow-state.json CRUD operations

use crate::error::WorkflowError;
use crate::models::{Stage, StageRecord, WorkflowState};
use crate::persist::write_json_atomic;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Handle on the persisted workflow state.
///
/// `load` and `save` are the only points where the file is touched; callers
/// pass the handle explicitly instead of reaching for shared global state.
pub struct WorkflowStateStore {
    path: PathBuf,
    state: WorkflowState,
}

impl WorkflowStateStore {
    /// Load state, or start empty if no stage has run yet.
    ///
    /// Unparseable content is an error; history is never reset silently.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let state = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&content).map_err(|e| WorkflowError::CorruptState {
                path: path.clone(),
                reason: e.to_string(),
            })?
        } else {
            debug!(path = %path.display(), "No workflow state yet, starting empty");
            WorkflowState::default()
        };

        Ok(Self { path, state })
    }

    /// Write state to disk (temp file + rename)
    pub fn save(&self) -> Result<()> {
        write_json_atomic(&self.path, &self.state).context("Failed to write workflow state")
    }

    /// Get current state (read-only)
    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self, stage: Stage) -> Option<&StageRecord> {
        self.state.record(stage)
    }

    /// Replace a stage's record and persist. Call only as the last step of a
    /// successful stage run.
    pub fn record_stage(
        &mut self,
        stage: Stage,
        item_count: usize,
        file_checksums: BTreeMap<String, String>,
    ) -> Result<()> {
        info!(
            %stage,
            item_count,
            files = file_checksums.len(),
            "Recording stage run"
        );
        self.state
            .set_record(stage, StageRecord::new(item_count, file_checksums));
        self.save()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SCHEMA_VERSION;
    use tempfile::TempDir;

    fn setup_state_path() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(".docpilot/workflow-state.json");
        (temp_dir, path)
    }

    fn checksums(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_load_new_state() {
        let (_temp, path) = setup_state_path();

        let store = WorkflowStateStore::load(&path).unwrap();

        assert_eq!(store.state().schema_version, SCHEMA_VERSION);
        assert!(store.record(Stage::Analyze).is_none());
        assert!(!path.exists(), "load must not create the file");
    }

    #[test]
    fn test_record_and_reload() {
        let (_temp, path) = setup_state_path();

        {
            let mut store = WorkflowStateStore::load(&path).unwrap();
            store
                .record_stage(Stage::Analyze, 5, checksums(&[("a.py", "111"), ("b.py", "222")]))
                .unwrap();
        }

        {
            let store = WorkflowStateStore::load(&path).unwrap();
            let record = store.record(Stage::Analyze).unwrap();
            assert_eq!(record.item_count, 5);
            assert_eq!(record.file_checksums.as_ref().unwrap().len(), 2);
            assert!(store.record(Stage::Plan).is_none());
        }
    }

    #[test]
    fn test_record_replaces_previous_file_set() {
        let (_temp, path) = setup_state_path();
        let mut store = WorkflowStateStore::load(&path).unwrap();

        store
            .record_stage(Stage::Analyze, 2, checksums(&[("old.py", "1"), ("kept.py", "2")]))
            .unwrap();
        store
            .record_stage(Stage::Analyze, 1, checksums(&[("kept.py", "2")]))
            .unwrap();

        let reloaded = WorkflowStateStore::load(&path).unwrap();
        let files = reloaded
            .record(Stage::Analyze)
            .unwrap()
            .file_checksums
            .clone()
            .unwrap();
        assert!(!files.contains_key("old.py"));
        assert!(files.contains_key("kept.py"));
    }

    #[test]
    fn test_corrupted_state_is_fatal() {
        let (_temp, path) = setup_state_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{\"analyze\": [broken").unwrap();

        let err = WorkflowStateStore::load(&path).err().unwrap();

        assert!(matches!(
            err.downcast_ref::<WorkflowError>(),
            Some(WorkflowError::CorruptState { .. })
        ));
        // Content left untouched for the user to inspect
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "{\"analyze\": [broken"
        );
    }
}
