//! Audit service - rate existing documentation, one item at a time

use super::session_choice::{select_session, SessionChoice};
use crate::analysis::{load_analysis, save_audit_results, AuditResults};
use crate::collab::{Analyzer, ItemPrompt, Progress, RatingChoice};
use crate::integrity::create_snapshot;
use crate::models::{AnalysisResult, AuditMark, AuditSession, CodeItem, Stage, WorkItem};
use crate::session::{
    ItemProcessor, ItemStep, SessionDriver, SessionOutcome, SessionStart, SessionStore,
};
use crate::state::{is_audit_stale, PrerequisiteGate, WorkflowStateStore};
use crate::workspace::Workspace;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeSet;
use tracing::warn;

pub struct AuditProcessor<'a> {
    workspace: &'a Workspace,
    state: &'a mut WorkflowStateStore,
    analysis: &'a AnalysisResult,
    prompt: &'a mut dyn ItemPrompt,
}

impl<'a> AuditProcessor<'a> {
    pub fn new(
        workspace: &'a Workspace,
        state: &'a mut WorkflowStateStore,
        analysis: &'a AnalysisResult,
        prompt: &'a mut dyn ItemPrompt,
    ) -> Self {
        Self {
            workspace,
            state,
            analysis,
            prompt,
        }
    }
}

#[async_trait]
impl ItemProcessor<AuditSession> for AuditProcessor<'_> {
    fn eligible(item: &CodeItem) -> bool {
        item.has_docs
    }

    async fn process(
        &mut self,
        _record: &AuditSession,
        item: &WorkItem,
        progress: Progress,
    ) -> Result<ItemStep<AuditMark>> {
        let docstring = self
            .analysis
            .find(&item.filepath, &item.name)
            .and_then(|code| code.docstring.as_deref());

        let step = match self.prompt.rate(item, docstring, progress)? {
            RatingChoice::Rate(rating) if (1..=4).contains(&rating) => {
                ItemStep::Done(AuditMark::rated(rating))
            }
            RatingChoice::Rate(rating) => anyhow::bail!("Rating {} is outside 1-4", rating),
            RatingChoice::Skip => ItemStep::Done(AuditMark::skipped()),
            RatingChoice::Quit => ItemStep::Quit,
        };
        Ok(step)
    }

    async fn finalize(&mut self, record: &AuditSession) -> Result<()> {
        let results = AuditResults {
            session_id: record.header.session_id.clone(),
            completed_at: record.header.completed_at.unwrap_or_else(Utc::now),
            ratings: record.ratings(),
        };
        save_audit_results(self.workspace, &results)?;

        // Audit staleness is judged against the analysis it rated
        let checksums = self
            .state
            .record(Stage::Analyze)
            .and_then(|analyze| analyze.file_checksums.clone())
            .unwrap_or_default();
        self.state
            .record_stage(Stage::Audit, record.items.len(), checksums)
    }
}

/// Start or resume an audit session
pub async fn run_audit(
    workspace: &Workspace,
    state: &mut WorkflowStateStore,
    analyzer: &dyn Analyzer,
    prompt: &mut dyn ItemPrompt,
    choice: &SessionChoice,
    skip_validation: bool,
) -> Result<SessionOutcome> {
    let gate = if skip_validation {
        PrerequisiteGate::skipping_validation(state.state())
    } else {
        PrerequisiteGate::new(state.state())
    };
    gate.check(Stage::Audit)?;

    match is_audit_stale(state.state()) {
        Ok(true) => warn!("Previous audit predates the latest analysis"),
        Ok(false) => {}
        Err(e) => warn!(error = %e, "Could not compare audit with analysis"),
    }

    let analysis = load_analysis(workspace)?
        .context("No analysis results found. Run 'docpilot analyze' first")?;

    let store = SessionStore::new(workspace.sessions_dir());
    let start = match select_session::<AuditSession>(&store, choice)? {
        Some(record) => SessionStart::Resume(record),
        None => SessionStart::Fresh(fresh_session(&analysis).await),
    };

    let driver = SessionDriver::new(&store, analyzer);
    let mut processor = AuditProcessor::new(workspace, state, &analysis, prompt);
    driver.run(start, &mut processor).await
}

async fn fresh_session(analysis: &AnalysisResult) -> AuditSession {
    let items: Vec<WorkItem> = analysis
        .items
        .iter()
        .filter(|item| <AuditProcessor as ItemProcessor<AuditSession>>::eligible(item))
        .map(WorkItem::from)
        .collect();
    let files: BTreeSet<String> = items.iter().map(|item| item.filepath.clone()).collect();
    let snapshot = create_snapshot(files).await;

    AuditSession::new(
        items,
        snapshot,
        serde_json::json!({ "documented_items": analysis.documented_items }),
    )
}
