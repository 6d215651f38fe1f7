//! Workflow state management
//!
//! Handles persistence and evaluation of pipeline stage records:
//! - Per-stage run records with file checksums
//! - Staleness between upstream and downstream stages
//! - Prerequisite gating of stage commands

mod manager;
mod prerequisites;
mod staleness;

pub use manager::WorkflowStateStore;
pub use prerequisites::PrerequisiteGate;
pub use staleness::{
    compare_file_checksums, compare_stage_records, is_audit_stale, is_plan_stale,
    StalenessReport,
};
