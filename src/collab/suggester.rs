use super::runner::CommandRunner;
use crate::config::DocpilotConfig;
use anyhow::Result;
use async_trait::async_trait;

/// What to document and how
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionRequest {
    /// Description of the item plus its source excerpt
    pub target: String,
    pub style_guide: String,
    pub tone: String,
    /// Reviewer or validator feedback on a previous draft
    pub feedback: Option<String>,
}

impl SuggestionRequest {
    pub fn with_feedback(&self, feedback: impl Into<String>) -> Self {
        Self {
            feedback: Some(feedback.into()),
            ..self.clone()
        }
    }

    /// Prompt text sent to the LLM CLI
    pub fn render_prompt(&self) -> String {
        let mut prompt = format!(
            "Write documentation for the following code item.\n\
             Style guide: {}\n\
             Tone: {}\n\
             Reply with the documentation text only, without code fences.\n\n\
             {}\n",
            self.style_guide, self.tone, self.target
        );
        if let Some(feedback) = &self.feedback {
            prompt.push_str("\nRevise your previous draft using this feedback:\n");
            prompt.push_str(feedback);
            prompt.push('\n');
        }
        prompt
    }
}

/// Documentation drafting collaborator. Failures are reported, never retried
/// here.
#[async_trait]
pub trait Suggester: Send + Sync {
    async fn suggest(&self, request: &SuggestionRequest) -> Result<String>;
}

/// Suggester that pipes the rendered prompt to an LLM CLI
pub struct CommandSuggester {
    runner: CommandRunner,
}

impl CommandSuggester {
    pub fn from_config(config: &DocpilotConfig) -> Result<Self> {
        let runner = CommandRunner::new(&config.suggester.command, config.suggester_timeout())?
            .with_progress(true);
        Ok(Self { runner })
    }
}

#[async_trait]
impl Suggester for CommandSuggester {
    async fn suggest(&self, request: &SuggestionRequest) -> Result<String> {
        let output = self.runner.run_checked(&[], &request.render_prompt()).await?;
        let text = output.trim();
        if text.is_empty() {
            anyhow::bail!("'{}' returned an empty suggestion", self.runner.program());
        }
        Ok(text.to_string())
    }
}
