//! Resumable interactive sessions
//!
//! - [`SessionStore`] persists one record per session id
//! - [`SessionDriver`] walks the items, checkpointing after each one
//! - [`reconcile_with_files`] re-aligns a paused session with edited files

pub mod driver;
pub mod id;
pub mod reconcile;
pub mod store;

pub use driver::{ItemProcessor, ItemStep, SessionDriver, SessionOutcome, SessionStart};
pub use id::{encode_short, resolve_session_id};
pub use reconcile::{reconcile_with_files, ReconcileReport};
pub use store::SessionStore;
