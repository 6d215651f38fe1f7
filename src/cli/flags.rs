//! Session flags shared by `audit` and `improve`

use crate::error::WorkflowError;
use crate::services::SessionChoice;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionArgs {
    /// Start a new session even if an unfinished one exists
    #[arg(long)]
    pub new: bool,

    /// Resume the latest unfinished session, or the session with this id
    #[arg(long, value_name = "SESSION_ID", num_args = 0..=1, default_missing_value = "")]
    pub resume: Option<String>,

    /// Resume from a session file (requires --resume)
    #[arg(long, value_name = "PATH")]
    pub resume_file: Option<PathBuf>,

    /// Delete the latest unfinished session instead of running
    #[arg(long)]
    pub clear_session: bool,

    /// With --clear-session, delete every saved session
    #[arg(long)]
    pub all: bool,

    /// With --clear-session, do not ask for confirmation
    #[arg(long)]
    pub force: bool,

    /// Run even if upstream stages are missing or stale
    #[arg(long)]
    pub skip_validation: bool,
}

impl SessionArgs {
    /// Reject contradictory flag combinations
    pub fn validate(&self) -> Result<(), WorkflowError> {
        let invalid = |message: &str| Err(WorkflowError::InvalidFlags(message.to_string()));

        if self.new && self.resume.is_some() {
            return invalid("--new conflicts with --resume");
        }
        if self.resume_file.is_some() && self.resume.is_none() {
            return invalid("--resume-file requires --resume");
        }
        if self.resume_file.is_some() && self.resume.as_deref().is_some_and(|id| !id.is_empty()) {
            return invalid("--resume-file cannot be combined with a session id");
        }
        if self.clear_session && (self.new || self.resume.is_some()) {
            return invalid("--clear-session cannot be combined with --new or --resume");
        }
        if (self.all || self.force) && !self.clear_session {
            return invalid("--all and --force only apply to --clear-session");
        }
        Ok(())
    }

    /// Which session to run; call after [`SessionArgs::validate`]
    pub fn choice(&self) -> SessionChoice {
        if let Some(path) = &self.resume_file {
            return SessionChoice::File(path.clone());
        }
        match self.resume.as_deref() {
            Some("") => SessionChoice::Latest,
            Some(id) => SessionChoice::Id(id.to_string()),
            None if self.new => SessionChoice::Fresh,
            None => SessionChoice::Auto,
        }
    }
}

/// How a command finished. Both map to exit code 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Success,
    /// Nothing was left to do
    AlreadyCompleted,
}

impl CommandOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            CommandOutcome::Success | CommandOutcome::AlreadyCompleted => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        session: SessionArgs,
    }

    fn parse(args: &[&str]) -> SessionArgs {
        let mut argv = vec!["docpilot"];
        argv.extend_from_slice(args);
        TestCli::parse_from(argv).session
    }

    fn rejection(args: &[&str]) -> String {
        match parse(args).validate() {
            Err(WorkflowError::InvalidFlags(message)) => message,
            other => panic!("expected InvalidFlags for {:?}, got {:?}", args, other),
        }
    }

    #[test]
    fn test_new_conflicts_with_resume() {
        assert_eq!(rejection(&["--new", "--resume"]), "--new conflicts with --resume");
    }

    #[test]
    fn test_resume_file_requires_resume() {
        assert_eq!(
            rejection(&["--resume-file", "s.json"]),
            "--resume-file requires --resume"
        );
    }

    #[test]
    fn test_clear_flags() {
        assert!(parse(&["--clear-session", "--all", "--force"]).validate().is_ok());
        rejection(&["--all"]);
        rejection(&["--clear-session", "--new"]);
    }

    #[test]
    fn test_choices() {
        assert_eq!(parse(&[]).choice(), SessionChoice::Auto);
        assert_eq!(parse(&["--new"]).choice(), SessionChoice::Fresh);
        assert_eq!(parse(&["--resume"]).choice(), SessionChoice::Latest);
        assert_eq!(
            parse(&["--resume", "abc"]).choice(),
            SessionChoice::Id("abc".to_string())
        );
        assert_eq!(
            parse(&["--resume", "--resume-file", "s.json"]).choice(),
            SessionChoice::File(PathBuf::from("s.json"))
        );
    }

    #[test]
    fn test_outcomes_exit_zero() {
        assert_eq!(CommandOutcome::Success.exit_code(), 0);
        assert_eq!(CommandOutcome::AlreadyCompleted.exit_code(), 0);
    }
}
