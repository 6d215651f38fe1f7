// Docpilot - Documentation Pipeline Workflow Engine
// Tracks analyze → audit → plan → improve runs across interrupted, resumable invocations

pub mod analysis;
pub mod cli;
pub mod collab;
pub mod config;
pub mod error;
pub mod integrity;
pub mod logging;
pub mod models;
pub mod persist;
pub mod services;
pub mod session;
pub mod state;
pub mod workspace;

pub use anyhow::{Context, Result};
pub use colored::Colorize;

// Re-export commonly used types
pub use config::DocpilotConfig;
pub use error::WorkflowError;
pub use models::{
    AnalysisResult, AuditSession, CodeItem, FileSnapshot, ImproveSession, Stage, StageRecord,
    WorkflowState,
};
pub use session::{SessionDriver, SessionStore};
pub use state::{PrerequisiteGate, StalenessReport, WorkflowStateStore};
pub use workspace::Workspace;
