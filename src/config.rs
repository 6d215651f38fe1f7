//! Project configuration (.docpilot/config.toml)

use crate::workspace::Workspace;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// External analyzer invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Program and arguments; the path to analyze is appended
    #[serde(default = "default_analyzer_command")]
    pub command: Vec<String>,

    #[serde(default = "default_analyzer_timeout")]
    pub timeout_secs: u64,
}

fn default_analyzer_command() -> Vec<String> {
    vec![
        "docpilot-analyzer".to_string(),
        "--format".to_string(),
        "json".to_string(),
    ]
}

fn default_analyzer_timeout() -> u64 {
    300
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            command: default_analyzer_command(),
            timeout_secs: default_analyzer_timeout(),
        }
    }
}

/// LLM CLI used to draft documentation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggesterConfig {
    /// Program and arguments; the prompt is piped to stdin
    #[serde(default = "default_suggester_command")]
    pub command: Vec<String>,

    #[serde(default = "default_suggester_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_tone")]
    pub tone: String,
}

fn default_suggester_command() -> Vec<String> {
    vec!["claude".to_string(), "-p".to_string()]
}

fn default_suggester_timeout() -> u64 {
    120
}

fn default_tone() -> String {
    "concise".to_string()
}

impl Default for SuggesterConfig {
    fn default() -> Self {
        Self {
            command: default_suggester_command(),
            timeout_secs: default_suggester_timeout(),
            tone: default_tone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanConfig {
    /// Audited items rated at or below this are planned for improvement
    #[serde(default = "default_quality_threshold")]
    pub quality_threshold: u8,
}

fn default_quality_threshold() -> u8 {
    2
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            quality_threshold: default_quality_threshold(),
        }
    }
}

/// A validation hook run against every suggestion before review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookConfig {
    pub name: String,
    pub command: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HooksConfig {
    #[serde(default)]
    pub validators: Vec<HookConfig>,

    #[serde(default = "default_hook_timeout")]
    pub timeout_secs: u64,
}

fn default_hook_timeout() -> u64 {
    10
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            validators: Vec::new(),
            timeout_secs: default_hook_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// File extensions considered source when looking for new files
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_extensions() -> Vec<String> {
    ["py", "js", "jsx", "mjs", "cjs", "ts", "tsx", "rs", "go"]
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
        }
    }
}

// =============================================================================
// Docpilot Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocpilotConfig {
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    #[serde(default)]
    pub suggester: SuggesterConfig,

    /// language → documentation style guide
    #[serde(default = "default_style_guides")]
    pub style_guides: BTreeMap<String, String>,

    #[serde(default)]
    pub plan: PlanConfig,

    #[serde(default)]
    pub hooks: HooksConfig,

    #[serde(default)]
    pub source: SourceConfig,
}

fn default_style_guides() -> BTreeMap<String, String> {
    [
        ("python", "google"),
        ("javascript", "jsdoc"),
        ("typescript", "tsdoc"),
        ("rust", "rustdoc"),
        ("go", "godoc"),
    ]
    .iter()
    .map(|(language, guide)| (language.to_string(), guide.to_string()))
    .collect()
}

impl Default for DocpilotConfig {
    fn default() -> Self {
        Self {
            analyzer: AnalyzerConfig::default(),
            suggester: SuggesterConfig::default(),
            style_guides: default_style_guides(),
            plan: PlanConfig::default(),
            hooks: HooksConfig::default(),
            source: SourceConfig::default(),
        }
    }
}

impl DocpilotConfig {
    /// Load config from .docpilot/config.toml, defaults if absent
    pub fn load(workspace: &Workspace) -> Result<Self> {
        let config_path = workspace.config_path();
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config: DocpilotConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;
        Ok(config)
    }

    /// Save config to .docpilot/config.toml
    pub fn save(&self, workspace: &Workspace) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        crate::persist::write_atomic(&workspace.config_path(), content.as_bytes())
    }

    pub fn style_guide(&self, language: &str) -> &str {
        self.style_guides
            .get(language)
            .map(String::as_str)
            .unwrap_or("conventional")
    }

    pub fn analyzer_timeout(&self) -> Duration {
        Duration::from_secs(self.analyzer.timeout_secs)
    }

    pub fn suggester_timeout(&self) -> Duration {
        Duration::from_secs(self.suggester.timeout_secs)
    }

    pub fn hook_timeout(&self) -> Duration {
        Duration::from_secs(self.hooks.timeout_secs)
    }
}
