use super::runner::CommandRunner;
use crate::config::DocpilotConfig;
use crate::models::AnalysisResult;
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::join_all;
use std::path::Path;
use tracing::debug;

/// Source analysis collaborator
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Analyze every source file under `root`
    async fn analyze_path(&self, root: &Path) -> Result<AnalysisResult>;

    /// Analyze a single file
    async fn analyze_file(&self, filepath: &str) -> Result<AnalysisResult>;
}

/// Analyze `files` one by one, concurrently. Results keep the input order.
pub async fn analyze_files(
    analyzer: &dyn Analyzer,
    files: &[String],
) -> Result<Vec<AnalysisResult>> {
    let results = join_all(files.iter().map(|file| async move {
        analyzer
            .analyze_file(file)
            .await
            .with_context(|| format!("Failed to re-analyze {}", file))
    }))
    .await;

    results.into_iter().collect()
}

/// Analyzer that runs an external command printing an `AnalysisResult` as JSON
pub struct CommandAnalyzer {
    runner: CommandRunner,
}

impl CommandAnalyzer {
    pub fn new(command: &[String], config: &DocpilotConfig) -> Result<Self> {
        Ok(Self {
            runner: CommandRunner::new(command, config.analyzer_timeout())?,
        })
    }

    pub fn from_config(config: &DocpilotConfig) -> Result<Self> {
        Self::new(&config.analyzer.command, config)
    }

    async fn run(&self, target: String) -> Result<AnalysisResult> {
        debug!(%target, program = self.runner.program(), "Running analyzer");
        let stdout = self.runner.run_checked(&[target.clone()], "").await?;
        let mut result: AnalysisResult = serde_json::from_str(&stdout).with_context(|| {
            format!(
                "Analyzer '{}' returned invalid JSON for {}",
                self.runner.program(),
                target
            )
        })?;
        result.recompute_aggregates();
        Ok(result)
    }
}

#[async_trait]
impl Analyzer for CommandAnalyzer {
    async fn analyze_path(&self, root: &Path) -> Result<AnalysisResult> {
        self.run(root.to_string_lossy().to_string()).await
    }

    async fn analyze_file(&self, filepath: &str) -> Result<AnalysisResult> {
        self.run(filepath.to_string()).await
    }
}
