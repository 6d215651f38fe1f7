//! PrerequisiteGate - may a stage run yet?
//!
//! ```text
//! analyze ──┬──> audit
//!           └──> plan ──> improve   (plan must not be stale vs analyze)
//! ```

use super::staleness::is_plan_stale;
use crate::error::WorkflowError;
use crate::models::{Stage, WorkflowState};
use tracing::debug;

pub struct PrerequisiteGate<'a> {
    state: &'a WorkflowState,
    skip_validation: bool,
}

impl<'a> PrerequisiteGate<'a> {
    pub fn new(state: &'a WorkflowState) -> Self {
        Self {
            state,
            skip_validation: false,
        }
    }

    /// Gate that lets every stage through (force flags, tests)
    pub fn skipping_validation(state: &'a WorkflowState) -> Self {
        Self {
            state,
            skip_validation: true,
        }
    }

    /// Check that `stage` may run, returning a remediation hint if not
    pub fn check(&self, stage: Stage) -> Result<(), WorkflowError> {
        if self.skip_validation {
            debug!(%stage, "Prerequisite validation skipped");
            return Ok(());
        }

        match stage {
            Stage::Analyze => Ok(()),
            Stage::Audit | Stage::Plan => self.require(stage, Stage::Analyze),
            Stage::Improve => {
                self.require(stage, Stage::Plan)?;
                if is_plan_stale(self.state)? {
                    return Err(WorkflowError::StaleData {
                        stage,
                        reason: "the plan is out of date, files changed since it was generated"
                            .to_string(),
                        suggestion: format!(
                            "Run '{}' to regenerate the plan",
                            Stage::Plan.command()
                        ),
                    });
                }
                Ok(())
            }
        }
    }

    fn require(&self, stage: Stage, upstream: Stage) -> Result<(), WorkflowError> {
        if self.state.record(upstream).is_some() {
            return Ok(());
        }
        Err(WorkflowError::MissingPrerequisite {
            stage,
            reason: format!("{} has not been run yet", upstream),
            suggestion: format!("Run '{}' first", upstream.command()),
        })
    }
}
