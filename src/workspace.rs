//! On-disk layout of a docpilot project
//!
//! ```text
//! <root>/.docpilot/
//!   config.toml
//!   workflow-state.json
//!   analysis.json
//!   audit.json
//!   plan.json
//!   session-reports/{audit,improve}-session-<uuid>.json
//!   transactions/<uuid>.json
//!   backups/<uuid>/...
//! ```

use std::path::{Path, PathBuf};

const STATE_DIR: &str = ".docpilot";

#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join(STATE_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.state_dir().join("config.toml")
    }

    pub fn workflow_state_path(&self) -> PathBuf {
        self.state_dir().join("workflow-state.json")
    }

    pub fn analysis_path(&self) -> PathBuf {
        self.state_dir().join("analysis.json")
    }

    pub fn audit_path(&self) -> PathBuf {
        self.state_dir().join("audit.json")
    }

    pub fn plan_path(&self) -> PathBuf {
        self.state_dir().join("plan.json")
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.state_dir().join("session-reports")
    }

    pub fn transactions_dir(&self) -> PathBuf {
        self.state_dir().join("transactions")
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.state_dir().join("backups")
    }
}
