use super::flags::CommandOutcome;
use crate::analysis::PlanReason;
use crate::config::DocpilotConfig;
use crate::services::run_plan;
use crate::state::WorkflowStateStore;
use crate::workspace::Workspace;
use crate::Result;
use colored::Colorize;

/// Number of plan entries printed
const PREVIEW: usize = 10;

pub fn run(workspace: &Workspace, skip_validation: bool) -> Result<CommandOutcome> {
    let config = DocpilotConfig::load(workspace)?;
    let mut state = WorkflowStateStore::load(workspace.workflow_state_path())?;

    let plan = run_plan(workspace, &config, &mut state, skip_validation)?;

    if plan.items.is_empty() {
        println!("{}", "✅ Nothing to improve".green().bold());
        return Ok(CommandOutcome::AlreadyCompleted);
    }

    println!(
        "{}",
        format!("📋 Plan: {} item(s) to improve", plan.items.len()).cyan().bold()
    );
    for entry in plan.items.iter().take(PREVIEW) {
        let reason = match (entry.reason, entry.rating) {
            (PlanReason::Undocumented, _) => "undocumented".to_string(),
            (PlanReason::LowQuality, Some(rating)) => format!("rated {}/4", rating),
            (PlanReason::LowQuality, None) => "low quality".to_string(),
        };
        println!(
            "   • {} ({}:{}) {} impact {:.1}",
            entry.item.name.bold(),
            entry.item.filepath,
            entry.item.line_number,
            reason.bright_black(),
            entry.impact_score
        );
    }
    if plan.items.len() > PREVIEW {
        println!("   … and {} more", plan.items.len() - PREVIEW);
    }
    println!();
    println!("Next: {}", "docpilot improve".cyan());

    Ok(CommandOutcome::Success)
}
