//! Improve service - draft, validate, review and write documentation
//!
//! Every accepted write goes through the transaction log under the session's
//! transaction id, so a finished session can be rolled back as a unit.

use super::session_choice::{select_session, SessionChoice};
use crate::analysis::load_plan;
use crate::collab::{
    run_validation_hooks, Analyzer, DocWriter, HookInput, ItemPrompt, Progress, ReviewChoice,
    SuggestionRequest, Suggester, TransactionLog, TransactionStatus, ValidationHook, WriteEntry,
};
use crate::config::DocpilotConfig;
use crate::error::WorkflowError;
use crate::integrity::create_snapshot;
use crate::models::{
    CodeItem, ImproveSession, ItemStatus, SessionRecord, Stage, StatusRecord, WorkItem,
};
use crate::session::{
    ItemProcessor, ItemStep, SessionDriver, SessionOutcome, SessionStart, SessionStore,
};
use crate::state::{PrerequisiteGate, WorkflowStateStore};
use crate::workspace::Workspace;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Lines of source shown to the suggester around the item
const EXCERPT_LINES: usize = 40;

/// Collaborators used by an improve session
pub struct ImproveContext<'a> {
    pub suggester: &'a dyn Suggester,
    pub hooks: &'a [Box<dyn ValidationHook>],
    pub writer: &'a dyn DocWriter,
    pub log: &'a dyn TransactionLog,
    pub prompt: &'a mut dyn ItemPrompt,
}

pub struct ImproveProcessor<'a> {
    workspace: &'a Workspace,
    config: &'a DocpilotConfig,
    state: &'a mut WorkflowStateStore,
    ctx: ImproveContext<'a>,
}

impl<'a> ImproveProcessor<'a> {
    pub fn new(
        workspace: &'a Workspace,
        config: &'a DocpilotConfig,
        state: &'a mut WorkflowStateStore,
        ctx: ImproveContext<'a>,
    ) -> Self {
        Self {
            workspace,
            config,
            state,
            ctx,
        }
    }

    fn request_for(&self, item: &WorkItem) -> SuggestionRequest {
        SuggestionRequest {
            target: describe_target(item),
            style_guide: self.config.style_guide(&item.language).to_string(),
            tone: self.config.suggester.tone.clone(),
            feedback: None,
        }
    }
}

/// Draft a suggestion and run it past the validation hooks. A rejected draft
/// is regenerated once with the rejections as feedback.
async fn validated_suggestion(
    suggester: &dyn Suggester,
    hooks: &[Box<dyn ValidationHook>],
    hook_timeout: Duration,
    item: &WorkItem,
    request: &SuggestionRequest,
) -> Result<String> {
    let draft = suggester.suggest(request).await?;
    let input = HookInput {
        item,
        suggestion: &draft,
    };
    let verdict = run_validation_hooks(hooks, &input, hook_timeout).await;
    if verdict.accepted() {
        return Ok(draft);
    }

    debug!(item = %item.name, feedback = %verdict.feedback(), "Draft rejected, regenerating");
    let retry = request.with_feedback(verdict.feedback());
    let draft = suggester.suggest(&retry).await?;
    let input = HookInput {
        item,
        suggestion: &draft,
    };
    let verdict = run_validation_hooks(hooks, &input, hook_timeout).await;
    if verdict.accepted() {
        return Ok(draft);
    }
    anyhow::bail!("Suggestion rejected by validation hooks: {}", verdict.feedback())
}

#[async_trait]
impl ItemProcessor<ImproveSession> for ImproveProcessor<'_> {
    fn eligible(item: &CodeItem) -> bool {
        !item.has_docs
    }

    async fn before_resume(&mut self, record: &mut ImproveSession) -> Result<()> {
        reconcile_transaction(record, self.ctx.log)
    }

    async fn process(
        &mut self,
        record: &ImproveSession,
        item: &WorkItem,
        progress: Progress,
    ) -> Result<ItemStep<StatusRecord>> {
        let request = self.request_for(item);
        let (suggester, hooks) = (self.ctx.suggester, self.ctx.hooks);
        let hook_timeout = self.config.hook_timeout();
        let mut suggestion =
            validated_suggestion(suggester, hooks, hook_timeout, item, &request).await?;

        let text = loop {
            match self.ctx.prompt.review(item, &suggestion, progress)? {
                ReviewChoice::Accept => break suggestion,
                ReviewChoice::Edit(edited) => break edited,
                ReviewChoice::Regenerate(feedback) => {
                    let revised = request.with_feedback(feedback);
                    suggestion =
                        validated_suggestion(suggester, hooks, hook_timeout, item, &revised)
                            .await?;
                }
                ReviewChoice::Skip => return Ok(ItemStep::Done(StatusRecord::skipped())),
                ReviewChoice::Quit => return Ok(ItemStep::Quit),
            }
        };

        let backup_dir = backup_dir_for(self.workspace, &record.transaction_id);
        let backup = self.ctx.writer.write(item, &text, &backup_dir)?;
        let entry = WriteEntry::new(
            item.filepath.clone(),
            backup.clone(),
            item.name.clone(),
            item.item_type.to_string(),
            item.language.clone(),
        );
        if let Err(e) = self.ctx.log.record_write(&record.transaction_id, entry) {
            // An unjournaled write could never be rolled back
            fs::copy(&backup, &item.filepath).with_context(|| {
                format!(
                    "Failed to journal the write to {} and to restore it from {}",
                    item.filepath,
                    backup.display()
                )
            })?;
            return Err(e.context(format!("Write to {} was undone", item.filepath)));
        }

        Ok(ItemStep::Done(StatusRecord::accepted(text)))
    }

    async fn finalize(&mut self, record: &ImproveSession) -> Result<()> {
        let accepted = record.count_status(ItemStatus::Accepted);
        let checksums = self
            .state
            .record(Stage::Analyze)
            .and_then(|analyze| analyze.file_checksums.clone())
            .unwrap_or_default();
        self.state.record_stage(Stage::Improve, accepted, checksums)?;

        // The writes are on disk either way; an uncommitted journal still rolls back
        if let Err(e) = self.ctx.log.commit_transaction(&record.transaction_id) {
            warn!(
                transaction_id = %record.transaction_id,
                error = %e,
                "Failed to commit transaction"
            );
        }
        Ok(())
    }
}

/// Align a resumed session with what the transaction log says happened
/// to its writes.
pub fn reconcile_transaction(record: &mut ImproveSession, log: &dyn TransactionLog) -> Result<()> {
    match log.status(&record.transaction_id)? {
        None => {
            warn!(
                session_id = %record.header.session_id,
                "Transaction log has no entry for this session; earlier writes cannot be rolled back"
            );
            log.begin_transaction(&record.transaction_id)?;
        }
        Some(TransactionStatus::InProgress) => {}
        Some(TransactionStatus::Committed) => {
            let previous = record.header.session_id.clone();
            let fresh = Uuid::new_v4().to_string();
            info!(%previous, session_id = %fresh, "Transaction already committed, continuing under a new session");
            record.previous_session_id = Some(previous);
            record.header.session_id = fresh.clone();
            record.transaction_id = fresh;
            log.begin_transaction(&record.transaction_id)?;
        }
        Some(status @ (TransactionStatus::RolledBack | TransactionStatus::PartiallyRolledBack)) => {
            return Err(WorkflowError::ResumeRefused {
                session_id: record.header.session_id.clone(),
                status,
            }
            .into());
        }
    }
    Ok(())
}

fn describe_target(item: &WorkItem) -> String {
    let mut target = format!(
        "{} `{}` ({}) in {} at line {}",
        item.item_type, item.name, item.language, item.filepath, item.line_number
    );
    if let Ok(source) = fs::read_to_string(&item.filepath) {
        let excerpt: Vec<&str> = source
            .lines()
            .skip(item.line_number.saturating_sub(1))
            .take(EXCERPT_LINES)
            .collect();
        target.push_str("\n\n");
        target.push_str(&excerpt.join("\n"));
    }
    target
}

/// Start or resume an improve session over the current plan
pub async fn run_improve<'a>(
    workspace: &'a Workspace,
    config: &'a DocpilotConfig,
    state: &'a mut WorkflowStateStore,
    analyzer: &dyn Analyzer,
    ctx: ImproveContext<'a>,
    choice: &SessionChoice,
    skip_validation: bool,
) -> Result<SessionOutcome> {
    let gate = if skip_validation {
        PrerequisiteGate::skipping_validation(state.state())
    } else {
        PrerequisiteGate::new(state.state())
    };
    gate.check(Stage::Improve)?;

    let store = SessionStore::new(workspace.sessions_dir());
    let start = match select_session::<ImproveSession>(&store, choice)? {
        Some(record) => SessionStart::Resume(record),
        None => {
            let plan = load_plan(workspace)?
                .context("No plan found. Run 'docpilot plan' first")?;
            let session = fresh_session(plan.work_items(), config).await;
            ctx.log.begin_transaction(&session.transaction_id)?;
            SessionStart::Fresh(session)
        }
    };

    let driver = SessionDriver::new(&store, analyzer);
    let mut processor = ImproveProcessor::new(workspace, config, state, ctx);
    driver.run(start, &mut processor).await
}

async fn fresh_session(items: Vec<WorkItem>, config: &DocpilotConfig) -> ImproveSession {
    let files: BTreeSet<String> = items.iter().map(|item| item.filepath.clone()).collect();
    let snapshot = create_snapshot(files).await;
    ImproveSession::new(
        items,
        snapshot,
        serde_json::json!({
            "tone": config.suggester.tone,
            "quality_threshold": config.plan.quality_threshold,
        }),
    )
}

/// Summary line for an improve session, used by the CLI
pub fn describe_progress(record: &ImproveSession) -> String {
    format!(
        "{} accepted, {} skipped, {} errors, {} remaining",
        record.count_status(ItemStatus::Accepted),
        record.count_status(ItemStatus::Skipped),
        record.count_status(ItemStatus::Error),
        record.items().len() - record.processed_count()
    )
}

/// Backups for a transaction live under their own directory
pub fn backup_dir_for(workspace: &Workspace, transaction_id: &str) -> PathBuf {
    workspace.backups_dir().join(transaction_id)
}
