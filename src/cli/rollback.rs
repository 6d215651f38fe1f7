use super::flags::CommandOutcome;
use crate::collab::{FileTransactionLog, RollbackTarget, TransactionLog, TransactionStatus};
use crate::workspace::Workspace;
use crate::Result;
use colored::Colorize;

pub fn run(workspace: &Workspace, target: &str, list: bool) -> Result<CommandOutcome> {
    let log = FileTransactionLog::new(workspace.transactions_dir());

    if list {
        let sessions = log.list_sessions()?;
        if sessions.is_empty() {
            println!("{}", "No transactions recorded.".yellow());
            return Ok(CommandOutcome::AlreadyCompleted);
        }
        println!("{}", "Transactions:".green().bold());
        for summary in sessions {
            let status = match summary.status {
                TransactionStatus::InProgress => summary.status.to_string().yellow(),
                TransactionStatus::Committed => summary.status.to_string().green(),
                TransactionStatus::RolledBack | TransactionStatus::PartiallyRolledBack => {
                    summary.status.to_string().bright_black()
                }
            };
            println!("   • {}  {}", summary.session_id, status);
        }
        return Ok(CommandOutcome::Success);
    }

    let report = log.rollback_change(&RollbackTarget::parse(target))?;
    for file in &report.restored {
        println!("{}", format!("↩️  Restored {}", file).green());
    }
    for file in &report.conflicts {
        println!(
            "{}",
            format!("⚠️  {} was edited after docpilot wrote it; left unchanged", file).yellow()
        );
    }
    if !report.success {
        anyhow::bail!("Rollback could not be applied cleanly");
    }

    Ok(CommandOutcome::Success)
}
