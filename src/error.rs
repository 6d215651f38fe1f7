//! Typed workflow errors
//!
//! Library code returns `anyhow::Result` and attaches context; these variants
//! mark the failures callers need to tell apart. Recover them at the command
//! boundary with `err.downcast_ref::<WorkflowError>()`.

use crate::collab::TransactionStatus;
use crate::models::{SessionKind, Stage};
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Cannot run {stage}: {reason}")]
    MissingPrerequisite {
        stage: Stage,
        reason: String,
        suggestion: String,
    },

    #[error("Cannot run {stage}: {reason}")]
    StaleData {
        stage: Stage,
        reason: String,
        suggestion: String,
    },

    #[error("Workflow state file {path} is corrupted: {reason}")]
    CorruptState { path: PathBuf, reason: String },

    #[error("Session file {path} is corrupted: {reason}")]
    CorruptSession { path: PathBuf, reason: String },

    #[error("Cannot determine staleness: the {stage} record has no file checksums (legacy, corrupt, or empty record)")]
    MissingChecksums { stage: Stage },

    #[error("Cannot resume session {session_id}: its transaction was {status}. Start a fresh session with --new")]
    ResumeRefused {
        session_id: String,
        status: TransactionStatus,
    },

    #[error("Invalid session id '{0}': expected a UUID or a 22-character short id")]
    InvalidSessionId(String),

    #[error("No {kind} session found with id {id}")]
    SessionNotFound { kind: SessionKind, id: String },

    #[error("{0}")]
    InvalidFlags(String),
}

impl WorkflowError {
    /// Remediation hint shown to the user, if any
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            WorkflowError::MissingPrerequisite { suggestion, .. }
            | WorkflowError::StaleData { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }
}
