use super::flags::{CommandOutcome, SessionArgs};
use super::sessions::{clear_sessions, confirm_prompt};
use crate::collab::{CommandAnalyzer, TerminalPrompt};
use crate::config::DocpilotConfig;
use crate::models::AuditSession;
use crate::services::run_audit;
use crate::session::{SessionOutcome, SessionStore};
use crate::state::WorkflowStateStore;
use crate::workspace::Workspace;
use crate::Result;
use colored::Colorize;

pub async fn run(workspace: &Workspace, args: &SessionArgs) -> Result<CommandOutcome> {
    args.validate()?;

    if args.clear_session {
        let store = SessionStore::new(workspace.sessions_dir());
        return clear_sessions::<AuditSession>(&store, args.all, args.force, &mut confirm_prompt);
    }

    let config = DocpilotConfig::load(workspace)?;
    let mut state = WorkflowStateStore::load(workspace.workflow_state_path())?;
    let analyzer = CommandAnalyzer::from_config(&config)?;
    let mut prompt = TerminalPrompt::new();

    println!("{}", "🔍 Auditing documentation quality...".cyan());
    let outcome = run_audit(
        workspace,
        &mut state,
        &analyzer,
        &mut prompt,
        &args.choice(),
        args.skip_validation,
    )
    .await?;

    match outcome {
        SessionOutcome::Completed { processed, .. } => {
            println!(
                "{}",
                format!("✅ Audit complete: {} item(s) reviewed", processed).green().bold()
            );
            println!("Next: {}", "docpilot plan".cyan());
        }
        SessionOutcome::Paused {
            session_id,
            remaining,
        } => {
            println!(
                "{}",
                format!("⏸  Audit paused with {} item(s) left", remaining).yellow()
            );
            println!("Resume with: {}", format!("docpilot audit --resume {}", session_id).cyan());
        }
    }

    Ok(CommandOutcome::Success)
}
