//! `docpilot sessions` and the `--clear-session` flow

use super::flags::CommandOutcome;
use crate::models::{AuditSession, ImproveSession, SessionRecord};
use crate::session::{encode_short, SessionStore};
use crate::services::describe_progress;
use crate::workspace::Workspace;
use crate::Result;
use colored::Colorize;
use dialoguer::Confirm;
use uuid::Uuid;

pub fn run(workspace: &Workspace, json: bool) -> Result<CommandOutcome> {
    let store = SessionStore::new(workspace.sessions_dir());
    let audits: Vec<AuditSession> = store.list()?;
    let improves: Vec<ImproveSession> = store.list()?;

    if json {
        let value = serde_json::json!({
            "audit": audits.iter().map(summary_json).collect::<Vec<_>>(),
            "improve": improves.iter().map(summary_json).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(CommandOutcome::Success);
    }

    if audits.is_empty() && improves.is_empty() {
        println!("{}", "No saved sessions.".yellow());
        return Ok(CommandOutcome::AlreadyCompleted);
    }

    if !audits.is_empty() {
        println!("{}", "Audit sessions:".green().bold());
        for session in &audits {
            print_line(session, None);
        }
    }
    if !improves.is_empty() {
        println!("{}", "Improve sessions:".green().bold());
        for session in &improves {
            print_line(session, Some(describe_progress(session)));
        }
    }
    Ok(CommandOutcome::Success)
}

fn short_id(session_id: &str) -> String {
    Uuid::parse_str(session_id)
        .map(|id| encode_short(&id))
        .unwrap_or_else(|_| session_id.to_string())
}

fn print_line<R: SessionRecord>(session: &R, detail: Option<String>) {
    let header = session.header();
    let state = if header.completed_at.is_some() {
        "completed".green()
    } else {
        "paused".yellow()
    };
    println!(
        "   • {}  {}  {}/{}  {}",
        short_id(&header.session_id).bold(),
        header.started_at.format("%Y-%m-%d %H:%M"),
        session.processed_count(),
        session.items().len(),
        state
    );
    if let Some(detail) = detail {
        println!("     {}", detail.bright_black());
    }
}

fn summary_json<R: SessionRecord>(session: &R) -> serde_json::Value {
    let header = session.header();
    serde_json::json!({
        "session_id": header.session_id,
        "short_id": short_id(&header.session_id),
        "started_at": header.started_at,
        "processed": session.processed_count(),
        "total": session.items().len(),
        "current_index": header.current_index,
        "completed": header.completed_at.is_some(),
    })
}

/// Delete saved sessions of type `R`: every one with `all`, otherwise the
/// latest unfinished one. `confirm` is asked unless `force` is set.
pub fn clear_sessions<R: SessionRecord>(
    store: &SessionStore,
    all: bool,
    force: bool,
    confirm: &mut dyn FnMut(&str) -> Result<bool>,
) -> Result<CommandOutcome> {
    let targets: Vec<R> = if all {
        store.list()?
    } else {
        store.latest_incomplete()?.into_iter().collect()
    };

    if targets.is_empty() {
        println!("{}", format!("No {} sessions to clear.", R::KIND).yellow());
        return Ok(CommandOutcome::AlreadyCompleted);
    }

    let question = format!("Delete {} {} session(s)?", targets.len(), R::KIND);
    if !force && !confirm(&question)? {
        println!("{}", "Aborted.".yellow());
        return Ok(CommandOutcome::AlreadyCompleted);
    }

    for session in &targets {
        store.delete::<R>(session.session_id())?;
    }
    println!(
        "{}",
        format!("✓ Deleted {} {} session(s)", targets.len(), R::KIND).green()
    );
    Ok(CommandOutcome::Success)
}

/// dialoguer confirmation, defaulting to "no"
pub fn confirm_prompt(question: &str) -> Result<bool> {
    Ok(Confirm::new()
        .with_prompt(question)
        .default(false)
        .interact()?)
}
