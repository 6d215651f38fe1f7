use super::flags::CommandOutcome;
use crate::collab::CommandAnalyzer;
use crate::config::DocpilotConfig;
use crate::services::run_analyze;
use crate::state::WorkflowStateStore;
use crate::workspace::Workspace;
use crate::Result;
use colored::Colorize;

pub async fn run(workspace: &Workspace, incremental: bool) -> Result<CommandOutcome> {
    let config = DocpilotConfig::load(workspace)?;
    let mut state = WorkflowStateStore::load(workspace.workflow_state_path())?;
    let analyzer = CommandAnalyzer::from_config(&config)?;

    let report = run_analyze(workspace, &config, &mut state, &analyzer, incremental).await?;
    let result = &report.result;

    if let Some(changed) = &report.changed_files {
        println!(
            "{}",
            format!("🔁 Re-analyzed {} changed file(s)", changed.len()).cyan()
        );
    }
    println!("{}", "✅ Analysis complete".green().bold());
    println!(
        "   Items:     {} ({} documented, {:.1}% coverage)",
        result.total_items, result.documented_items, result.coverage_percent
    );
    for (language, metrics) in &result.by_language {
        println!(
            "   {:<10} {} items, {:.1}% coverage, avg complexity {:.1}",
            language, metrics.total_items, metrics.coverage_percent, metrics.avg_complexity
        );
    }
    if !result.parse_failures.is_empty() {
        println!(
            "{}",
            format!("⚠️  {} file(s) could not be parsed", result.parse_failures.len()).yellow()
        );
        for failure in &result.parse_failures {
            println!("   • {}: {}", failure.filepath, failure.error);
        }
    }

    Ok(CommandOutcome::Success)
}
