//! Plan service - turn analysis and audit results into an improvement plan

use crate::analysis::{build_plan, load_analysis, load_audit_results, save_plan, Plan};
use crate::config::DocpilotConfig;
use crate::models::Stage;
use crate::state::{is_audit_stale, PrerequisiteGate, WorkflowStateStore};
use crate::workspace::Workspace;
use anyhow::{Context, Result};
use tracing::warn;

pub fn run_plan(
    workspace: &Workspace,
    config: &DocpilotConfig,
    state: &mut WorkflowStateStore,
    skip_validation: bool,
) -> Result<Plan> {
    let gate = if skip_validation {
        PrerequisiteGate::skipping_validation(state.state())
    } else {
        PrerequisiteGate::new(state.state())
    };
    gate.check(Stage::Plan)?;

    let analysis = load_analysis(workspace)?
        .context("No analysis results found. Run 'docpilot analyze' first")?;

    let audit = load_audit_results(workspace)?;
    if audit.is_some() {
        match is_audit_stale(state.state()) {
            Ok(true) => warn!("Audit ratings predate the latest analysis; re-run 'docpilot audit' to refresh them"),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "Could not compare audit with analysis"),
        }
    }

    let plan = build_plan(&analysis, audit.as_ref(), config.plan.quality_threshold);
    save_plan(workspace, &plan)?;

    // The plan is stale as soon as the analysis it was built from changes
    let checksums = state
        .record(Stage::Analyze)
        .and_then(|analyze| analyze.file_checksums.clone())
        .unwrap_or_default();
    state.record_stage(Stage::Plan, plan.items.len(), checksums)?;

    Ok(plan)
}
