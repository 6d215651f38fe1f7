use super::flags::{CommandOutcome, SessionArgs};
use super::sessions::{clear_sessions, confirm_prompt};
use crate::collab::{
    CommandAnalyzer, CommandHook, CommandSuggester, CommentWriter, FileTransactionLog,
    TerminalPrompt, ValidationHook,
};
use crate::config::DocpilotConfig;
use crate::models::ImproveSession;
use crate::services::{run_improve, ImproveContext};
use crate::session::{SessionOutcome, SessionStore};
use crate::state::WorkflowStateStore;
use crate::workspace::Workspace;
use crate::Result;
use colored::Colorize;

pub async fn run(workspace: &Workspace, args: &SessionArgs) -> Result<CommandOutcome> {
    args.validate()?;

    if args.clear_session {
        let store = SessionStore::new(workspace.sessions_dir());
        return clear_sessions::<ImproveSession>(&store, args.all, args.force, &mut confirm_prompt);
    }

    let config = DocpilotConfig::load(workspace)?;
    let mut state = WorkflowStateStore::load(workspace.workflow_state_path())?;
    let analyzer = CommandAnalyzer::from_config(&config)?;
    let suggester = CommandSuggester::from_config(&config)?;
    let hooks = config
        .hooks
        .validators
        .iter()
        .map(|hook| {
            CommandHook::from_config(hook, config.hook_timeout())
                .map(|hook| Box::new(hook) as Box<dyn ValidationHook>)
        })
        .collect::<Result<Vec<_>>>()?;
    let writer = CommentWriter::new();
    let log = FileTransactionLog::new(workspace.transactions_dir());
    let mut prompt = TerminalPrompt::new();

    let ctx = ImproveContext {
        suggester: &suggester,
        hooks: &hooks,
        writer: &writer,
        log: &log,
        prompt: &mut prompt,
    };

    println!("{}", "✍️  Improving documentation...".cyan());
    let outcome = run_improve(
        workspace,
        &config,
        &mut state,
        &analyzer,
        ctx,
        &args.choice(),
        args.skip_validation,
    )
    .await?;

    match outcome {
        SessionOutcome::Completed { processed, .. } => {
            println!(
                "{}",
                format!("✅ Improve complete: {} item(s) processed", processed)
                    .green()
                    .bold()
            );
            println!("Undo the last change with: {}", "docpilot rollback".cyan());
        }
        SessionOutcome::Paused {
            session_id,
            remaining,
        } => {
            println!(
                "{}",
                format!("⏸  Improve paused with {} item(s) left", remaining).yellow()
            );
            println!(
                "Resume with: {}",
                format!("docpilot improve --resume {}", session_id).cyan()
            );
        }
    }

    Ok(CommandOutcome::Success)
}
