//! Pipeline stages and their persisted run records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Current on-disk format of the workflow state file
pub const SCHEMA_VERSION: &str = "1.0";

/// One phase of the documentation pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Analyze,
    Audit,
    Plan,
    Improve,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Analyze, Stage::Audit, Stage::Plan, Stage::Improve];

    /// CLI command that runs this stage
    pub fn command(&self) -> &'static str {
        match self {
            Stage::Analyze => "docpilot analyze",
            Stage::Audit => "docpilot audit",
            Stage::Plan => "docpilot plan",
            Stage::Improve => "docpilot improve",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Analyze => write!(f, "analyze"),
            Stage::Audit => write!(f, "audit"),
            Stage::Plan => write!(f, "plan"),
            Stage::Improve => write!(f, "improve"),
        }
    }
}

/// Summary of a stage's last successful run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub timestamp: DateTime<Utc>,

    pub item_count: usize,

    /// filepath → checksum of every file that contributed to `item_count`.
    /// `None` only for records written before checksums were tracked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_checksums: Option<BTreeMap<String, String>>,
}

impl StageRecord {
    pub fn new(item_count: usize, file_checksums: BTreeMap<String, String>) -> Self {
        Self {
            timestamp: Utc::now(),
            item_count,
            file_checksums: Some(file_checksums),
        }
    }
}

/// Workflow state file (.docpilot/workflow-state.json)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    #[serde(default)]
    pub analyze: Option<StageRecord>,

    #[serde(default)]
    pub audit: Option<StageRecord>,

    #[serde(default)]
    pub plan: Option<StageRecord>,

    #[serde(default)]
    pub improve: Option<StageRecord>,
}

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            analyze: None,
            audit: None,
            plan: None,
            improve: None,
        }
    }
}

impl WorkflowState {
    pub fn record(&self, stage: Stage) -> Option<&StageRecord> {
        match stage {
            Stage::Analyze => self.analyze.as_ref(),
            Stage::Audit => self.audit.as_ref(),
            Stage::Plan => self.plan.as_ref(),
            Stage::Improve => self.improve.as_ref(),
        }
    }

    pub fn set_record(&mut self, stage: Stage, record: StageRecord) {
        let slot = match stage {
            Stage::Analyze => &mut self.analyze,
            Stage::Audit => &mut self.audit,
            Stage::Plan => &mut self.plan,
            Stage::Improve => &mut self.improve,
        };
        *slot = Some(record);
    }
}
