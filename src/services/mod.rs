//! Service layer for docpilot
//!
//! One service per pipeline stage. Services take their collaborators as
//! trait objects so the CLI and the tests drive the same code.

pub mod analyze_service;
pub mod audit_service;
pub mod improve_service;
pub mod plan_service;
pub mod session_choice;

// Re-export commonly used types
pub use analyze_service::{run_analyze, AnalyzeReport};
pub use audit_service::{run_audit, AuditProcessor};
pub use improve_service::{
    describe_progress, reconcile_transaction, run_improve, ImproveContext, ImproveProcessor,
};
pub use plan_service::run_plan;
pub use session_choice::{select_session, SessionChoice};
