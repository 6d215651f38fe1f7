//! Analyze service - full and incremental analysis runs

use crate::analysis::{load_analysis, merge_incremental, save_analysis};
use crate::collab::{analyze_files, Analyzer};
use crate::config::DocpilotConfig;
use crate::integrity::{
    checksums_of, create_snapshot, detect_checksum_changes, discover_source_files,
};
use crate::models::{AnalysisResult, Stage};
use crate::state::WorkflowStateStore;
use crate::workspace::Workspace;
use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeReport {
    pub result: AnalysisResult,
    /// Files re-analyzed by an incremental run; `None` for a full run
    pub changed_files: Option<Vec<String>>,
}

pub async fn run_analyze(
    workspace: &Workspace,
    config: &DocpilotConfig,
    state: &mut WorkflowStateStore,
    analyzer: &dyn Analyzer,
    incremental: bool,
) -> Result<AnalyzeReport> {
    let report = if incremental {
        match incremental_baseline(workspace, state)? {
            Some((previous, checksums)) => {
                run_incremental(workspace, config, analyzer, &previous, &checksums).await?
            }
            None => {
                info!("No usable previous analysis, running a full analysis");
                run_full(workspace, analyzer).await?
            }
        }
    } else {
        run_full(workspace, analyzer).await?
    };

    save_analysis(workspace, &report.result)?;

    let snapshot = create_snapshot(report.result.analyzed_files.iter().cloned()).await;
    state.record_stage(Stage::Analyze, report.result.total_items, checksums_of(&snapshot))?;

    Ok(report)
}

/// Previous result plus the checksums it was computed from
fn incremental_baseline(
    workspace: &Workspace,
    state: &WorkflowStateStore,
) -> Result<Option<(AnalysisResult, BTreeMap<String, String>)>> {
    let Some(checksums) = state
        .record(Stage::Analyze)
        .and_then(|record| record.file_checksums.clone())
    else {
        return Ok(None);
    };
    let previous = load_analysis(workspace)?;
    Ok(previous.map(|previous| (previous, checksums)))
}

async fn run_full(workspace: &Workspace, analyzer: &dyn Analyzer) -> Result<AnalyzeReport> {
    info!(root = %workspace.root().display(), "Running full analysis");
    let result = analyzer
        .analyze_path(workspace.root())
        .await
        .context("Analysis failed")?;
    Ok(AnalyzeReport {
        result,
        changed_files: None,
    })
}

async fn run_incremental(
    workspace: &Workspace,
    config: &DocpilotConfig,
    analyzer: &dyn Analyzer,
    previous: &AnalysisResult,
    checksums: &BTreeMap<String, String>,
) -> Result<AnalyzeReport> {
    let mut changed: BTreeSet<String> = detect_checksum_changes(checksums).await.into_iter().collect();

    let added = discover_source_files(workspace.root(), &config.source.extensions)
        .into_iter()
        .filter(|file| !checksums.contains_key(file));
    changed.extend(added);
    let changed: Vec<String> = changed.into_iter().collect();

    let present: Vec<String> = changed
        .iter()
        .filter(|file| std::path::Path::new(file).is_file())
        .cloned()
        .collect();

    info!(
        changed = changed.len(),
        deleted = changed.len() - present.len(),
        "Running incremental analysis"
    );

    let partials = analyze_files(analyzer, &present).await?;
    let result = merge_incremental(previous, &partials, &changed);

    Ok(AnalyzeReport {
        result,
        changed_files: Some(changed),
    })
}
