//! Pipeline artifacts kept next to the workflow state
//!
//! `analysis.json`, `audit.json` and `plan.json` hold the latest result of
//! their stage. They are written before the stage's record so the record
//! never points at an artifact that does not exist.

use super::plan::{AuditResults, Plan};
use crate::models::AnalysisResult;
use crate::persist::{read_json, write_json_atomic};
use crate::workspace::Workspace;
use anyhow::Result;

pub fn load_analysis(workspace: &Workspace) -> Result<Option<AnalysisResult>> {
    read_json(&workspace.analysis_path())
}

pub fn save_analysis(workspace: &Workspace, result: &AnalysisResult) -> Result<()> {
    write_json_atomic(&workspace.analysis_path(), result)
}

pub fn load_audit_results(workspace: &Workspace) -> Result<Option<AuditResults>> {
    read_json(&workspace.audit_path())
}

pub fn save_audit_results(workspace: &Workspace, results: &AuditResults) -> Result<()> {
    write_json_atomic(&workspace.audit_path(), results)
}

pub fn load_plan(workspace: &Workspace) -> Result<Option<Plan>> {
    read_json(&workspace.plan_path())
}

pub fn save_plan(workspace: &Workspace, plan: &Plan) -> Result<()> {
    write_json_atomic(&workspace.plan_path(), plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::plan::build_plan;
    use crate::models::analysis::fixtures::item;
    use tempfile::TempDir;

    #[test]
    fn test_artifacts_round_trip_through_workspace() {
        let temp = TempDir::new().unwrap();
        let workspace = Workspace::new(temp.path());
        assert!(load_analysis(&workspace).unwrap().is_none());
        assert!(load_plan(&workspace).unwrap().is_none());

        let analysis =
            AnalysisResult::from_parts(vec![item("a.py", "f", "python", false)], vec![], vec![]);
        save_analysis(&workspace, &analysis).unwrap();
        let plan = build_plan(&analysis, None, 2);
        save_plan(&workspace, &plan).unwrap();

        assert_eq!(load_analysis(&workspace).unwrap(), Some(analysis));
        assert_eq!(load_plan(&workspace).unwrap(), Some(plan));
        assert!(workspace.plan_path().starts_with(workspace.state_dir()));
    }
}
