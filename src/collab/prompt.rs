//! Terminal interaction for the interactive stages

use crate::models::WorkItem;
use anyhow::Result;
use colored::Colorize;
use dialoguer::{Editor, Input, Select};

/// Position of the current item, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub position: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RatingChoice {
    /// 1 (terrible) to 4 (excellent)
    Rate(u8),
    Skip,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewChoice {
    Accept,
    /// Accept a hand-edited version
    Edit(String),
    /// Ask for a new draft with this feedback
    Regenerate(String),
    Skip,
    Quit,
}

/// Presentation layer used by the audit and improve sessions
pub trait ItemPrompt: Send {
    fn rate(
        &mut self,
        item: &WorkItem,
        docstring: Option<&str>,
        progress: Progress,
    ) -> Result<RatingChoice>;

    fn review(
        &mut self,
        item: &WorkItem,
        suggestion: &str,
        progress: Progress,
    ) -> Result<ReviewChoice>;
}

/// dialoguer-backed prompt
#[derive(Default)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    pub fn new() -> Self {
        Self
    }

    fn header(item: &WorkItem, progress: Progress) {
        println!();
        println!(
            "{} {} {} ({}:{})",
            format!("[{}/{}]", progress.position, progress.total).cyan(),
            item.item_type.to_string().bright_black(),
            item.name.bold(),
            item.filepath,
            item.line_number
        );
    }
}

impl ItemPrompt for TerminalPrompt {
    fn rate(
        &mut self,
        item: &WorkItem,
        docstring: Option<&str>,
        progress: Progress,
    ) -> Result<RatingChoice> {
        Self::header(item, progress);
        println!("{}", docstring.unwrap_or("(no documentation text)").dimmed());

        let options = [
            "1 - Terrible",
            "2 - OK",
            "3 - Good",
            "4 - Excellent",
            "Skip",
            "Quit (resume later)",
        ];
        let selection = Select::new()
            .with_prompt("Rate this documentation")
            .items(&options)
            .default(2)
            .interact()
            .map_err(|e| anyhow::anyhow!("Terminal not available: {}", e))?;

        Ok(match selection {
            0..=3 => RatingChoice::Rate(selection as u8 + 1),
            4 => RatingChoice::Skip,
            _ => RatingChoice::Quit,
        })
    }

    fn review(
        &mut self,
        item: &WorkItem,
        suggestion: &str,
        progress: Progress,
    ) -> Result<ReviewChoice> {
        Self::header(item, progress);
        println!("{}", suggestion.green());

        let options = ["Accept", "Edit", "Regenerate with feedback", "Skip", "Quit (resume later)"];
        let selection = Select::new()
            .with_prompt("What should happen with this suggestion?")
            .items(&options)
            .default(0)
            .interact()
            .map_err(|e| anyhow::anyhow!("Terminal not available: {}", e))?;

        match selection {
            0 => Ok(ReviewChoice::Accept),
            1 => {
                let edited = Editor::new().edit(suggestion)?;
                match edited {
                    Some(text) if !text.trim().is_empty() => {
                        Ok(ReviewChoice::Edit(text.trim_end().to_string()))
                    }
                    // Editor closed without saving
                    _ => Ok(ReviewChoice::Accept),
                }
            }
            2 => {
                let feedback: String = Input::new().with_prompt("Feedback").interact_text()?;
                Ok(ReviewChoice::Regenerate(feedback))
            }
            3 => Ok(ReviewChoice::Skip),
            _ => Ok(ReviewChoice::Quit),
        }
    }
}
