//! Staleness between pipeline stages

use crate::error::WorkflowError;
use crate::models::{Stage, StageRecord, WorkflowState};
use std::collections::BTreeMap;

/// How a downstream stage's inputs differ from its upstream stage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StalenessReport {
    pub is_stale: bool,
    pub changed_count: usize,
    /// In both, different checksum
    pub modified: Vec<String>,
    /// Only in the newer map
    pub added: Vec<String>,
    /// Only in the older map
    pub removed: Vec<String>,
}

/// Compare two filepath → checksum maps.
///
/// `changed_count` counts modified, added, and removed files once each.
pub fn compare_file_checksums(
    newer: &BTreeMap<String, String>,
    older: &BTreeMap<String, String>,
) -> StalenessReport {
    let mut report = StalenessReport::default();

    for (path, checksum) in newer {
        match older.get(path) {
            Some(previous) if previous != checksum => report.modified.push(path.clone()),
            Some(_) => {}
            None => report.added.push(path.clone()),
        }
    }
    report.removed = older
        .keys()
        .filter(|path| !newer.contains_key(*path))
        .cloned()
        .collect();

    report.changed_count = report.modified.len() + report.added.len() + report.removed.len();
    report.is_stale = report.changed_count > 0;
    report
}

/// Compare two stage records. A record whose checksum map is missing or
/// empty cannot be compared and yields [`WorkflowError::MissingChecksums`].
pub fn compare_stage_records(
    newer_stage: Stage,
    newer: &StageRecord,
    older_stage: Stage,
    older: &StageRecord,
) -> Result<StalenessReport, WorkflowError> {
    let newer = usable_checksums(newer_stage, newer)?;
    let older = usable_checksums(older_stage, older)?;
    Ok(compare_file_checksums(newer, older))
}

fn usable_checksums(
    stage: Stage,
    record: &StageRecord,
) -> Result<&BTreeMap<String, String>, WorkflowError> {
    record
        .file_checksums
        .as_ref()
        .filter(|checksums| !checksums.is_empty())
        .ok_or(WorkflowError::MissingChecksums { stage })
}

fn is_stale_against_analyze(state: &WorkflowState, stage: Stage) -> Result<bool, WorkflowError> {
    match (state.record(Stage::Analyze), state.record(stage)) {
        (Some(analyze), Some(downstream)) => {
            Ok(compare_stage_records(Stage::Analyze, analyze, stage, downstream)?.is_stale)
        }
        _ => Ok(false),
    }
}

/// Audit ratings predate the latest analysis
pub fn is_audit_stale(state: &WorkflowState) -> Result<bool, WorkflowError> {
    is_stale_against_analyze(state, Stage::Audit)
}

/// Plan predates the latest analysis
pub fn is_plan_stale(state: &WorkflowState) -> Result<bool, WorkflowError> {
    is_stale_against_analyze(state, Stage::Plan)
}
