use super::flags::CommandOutcome;
use crate::config::DocpilotConfig;
use crate::state::WorkflowStateStore;
use crate::workspace::Workspace;
use crate::Result;
use colored::Colorize;

pub fn run(workspace: &Workspace, force: bool) -> Result<CommandOutcome> {
    let config_path = workspace.config_path();
    if config_path.exists() && !force {
        println!("{}", "⚠️  docpilot is already initialized".yellow());
        println!("   Run with --force to rewrite {}", config_path.display());
        return Ok(CommandOutcome::AlreadyCompleted);
    }

    println!("{}", "🚀 Initializing docpilot...".cyan().bold());
    std::fs::create_dir_all(workspace.sessions_dir())?;
    std::fs::create_dir_all(workspace.transactions_dir())?;
    std::fs::create_dir_all(workspace.backups_dir())?;

    DocpilotConfig::default().save(workspace)?;
    println!("   ✓ {}", config_path.display());

    // Validates an existing state file; a missing one is written empty
    let store = WorkflowStateStore::load(workspace.workflow_state_path())?;
    if !store.path().exists() {
        store.save()?;
    }
    println!("   ✓ {}", workspace.workflow_state_path().display());

    println!();
    println!("Next: {}", "docpilot analyze".cyan());
    Ok(CommandOutcome::Success)
}
