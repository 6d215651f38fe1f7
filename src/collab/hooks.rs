//! Validation hooks run against every suggestion before it is shown
//!
//! Each hook is isolated: a hook that errors or runs past its timeout is
//! turned into a rejection instead of failing the session.

use super::runner::CommandRunner;
use crate::config::HookConfig;
use crate::models::WorkItem;
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::warn;

/// What a hook gets to look at (sent as JSON on stdin)
#[derive(Debug, Clone, Serialize)]
pub struct HookInput<'a> {
    pub item: &'a WorkItem,
    pub suggestion: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub hook: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookVerdict {
    pub rejections: Vec<Rejection>,
}

impl HookVerdict {
    pub fn accepted(&self) -> bool {
        self.rejections.is_empty()
    }

    /// All rejection reasons as one feedback string
    pub fn feedback(&self) -> String {
        self.rejections
            .iter()
            .map(|r| format!("{}: {}", r.hook, r.reason))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
pub trait ValidationHook: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` accepts, `Ok(Some(reason))` rejects
    async fn validate(&self, input: &HookInput<'_>) -> Result<Option<String>>;
}

/// Hook backed by an external command: exit 0 accepts, anything else rejects
/// with stderr (or stdout) as the reason
pub struct CommandHook {
    name: String,
    runner: CommandRunner,
}

impl CommandHook {
    pub fn from_config(config: &HookConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            name: config.name.clone(),
            runner: CommandRunner::new(&config.command, timeout)?,
        })
    }
}

#[async_trait]
impl ValidationHook for CommandHook {
    fn name(&self) -> &str {
        &self.name
    }

    async fn validate(&self, input: &HookInput<'_>) -> Result<Option<String>> {
        let payload = serde_json::to_string(input)?;
        let output = self.runner.run(&[], &payload).await?;
        if output.success {
            return Ok(None);
        }
        let reason = if output.stderr.trim().is_empty() {
            output.stdout.trim().to_string()
        } else {
            output.stderr.trim().to_string()
        };
        Ok(Some(reason))
    }
}

/// Run every hook in order, each under `timeout`
pub async fn run_validation_hooks(
    hooks: &[Box<dyn ValidationHook>],
    input: &HookInput<'_>,
    timeout: Duration,
) -> HookVerdict {
    let mut verdict = HookVerdict::default();

    for hook in hooks {
        let outcome = tokio::time::timeout(timeout, hook.validate(input)).await;
        let rejection = match outcome {
            Ok(Ok(None)) => None,
            Ok(Ok(Some(reason))) => Some(reason),
            Ok(Err(e)) => {
                warn!(hook = hook.name(), error = %e, "Validation hook failed");
                Some(format!("hook failed: {}", e))
            }
            Err(_) => {
                warn!(hook = hook.name(), "Validation hook timed out");
                Some(format!("hook timed out after {}s", timeout.as_secs()))
            }
        };
        if let Some(reason) = rejection {
            verdict.rejections.push(Rejection {
                hook: hook.name().to_string(),
                reason,
            });
        }
    }

    verdict
}
