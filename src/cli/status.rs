use super::flags::CommandOutcome;
use crate::integrity::detect_checksum_changes;
use crate::models::{Stage, WorkflowState};
use crate::state::{is_audit_stale, is_plan_stale, WorkflowStateStore};
use crate::workspace::Workspace;
use crate::Result;
use colored::Colorize;

/// Staleness of a downstream stage, as shown to the user
fn staleness_label(result: Result<bool, crate::WorkflowError>) -> Option<String> {
    match result {
        Ok(true) => Some("stale".to_string()),
        Ok(false) => None,
        Err(e) => Some(format!("unknown ({})", e)),
    }
}

fn stage_staleness(state: &WorkflowState, stage: Stage) -> Option<String> {
    match stage {
        Stage::Audit => staleness_label(is_audit_stale(state)),
        Stage::Plan => staleness_label(is_plan_stale(state)),
        Stage::Analyze | Stage::Improve => None,
    }
}

pub async fn run(workspace: &Workspace, json: bool) -> Result<CommandOutcome> {
    let store = WorkflowStateStore::load(workspace.workflow_state_path())?;
    let state = store.state();

    let changed_since_analyze = match state
        .record(Stage::Analyze)
        .and_then(|record| record.file_checksums.as_ref())
    {
        Some(checksums) => Some(detect_checksum_changes(checksums).await),
        None => None,
    };

    if json {
        let stages: serde_json::Map<String, serde_json::Value> = Stage::ALL
            .iter()
            .map(|stage| {
                let value = match state.record(*stage) {
                    Some(record) => serde_json::json!({
                        "timestamp": record.timestamp,
                        "item_count": record.item_count,
                        "files": record.file_checksums.as_ref().map(|c| c.len()),
                        "stale": stage_staleness(state, *stage),
                    }),
                    None => serde_json::Value::Null,
                };
                (stage.to_string(), value)
            })
            .collect();
        let value = serde_json::json!({
            "schema_version": state.schema_version,
            "stages": stages,
            "files_changed_since_analyze": changed_since_analyze,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(CommandOutcome::Success);
    }

    println!("{}", "Workflow status".cyan().bold());
    println!();
    for stage in Stage::ALL {
        match state.record(stage) {
            Some(record) => {
                let mut line = format!(
                    "   {} {:<8} {}  {} item(s)",
                    "✓".green(),
                    stage.to_string(),
                    record.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    record.item_count
                );
                if let Some(label) = stage_staleness(state, stage) {
                    line.push_str(&format!("  {}", label.yellow()));
                }
                println!("{}", line);
            }
            None => println!(
                "   {} {:<8} {}",
                "·".bright_black(),
                stage.to_string(),
                "not run".bright_black()
            ),
        }
    }

    if let Some(changed) = changed_since_analyze {
        println!();
        if changed.is_empty() {
            println!("{}", "Source files unchanged since the last analysis".green());
        } else {
            println!(
                "{}",
                format!(
                    "{} file(s) changed since the last analysis; run 'docpilot analyze --incremental'",
                    changed.len()
                )
                .yellow()
            );
        }
    }

    Ok(CommandOutcome::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StageRecord;
    use std::collections::BTreeMap;

    #[test]
    fn test_staleness_labels() {
        let mut state = WorkflowState::default();
        let checksums = |value: &str| {
            BTreeMap::from([("a.py".to_string(), value.to_string())])
        };
        state.set_record(Stage::Analyze, StageRecord::new(1, checksums("new")));
        state.set_record(Stage::Plan, StageRecord::new(1, checksums("old")));
        state.set_record(
            Stage::Audit,
            StageRecord {
                file_checksums: None,
                ..StageRecord::new(1, BTreeMap::new())
            },
        );

        assert_eq!(stage_staleness(&state, Stage::Plan), Some("stale".to_string()));
        assert!(stage_staleness(&state, Stage::Audit)
            .unwrap()
            .starts_with("unknown"));
        assert_eq!(stage_staleness(&state, Stage::Analyze), None);
    }
}
