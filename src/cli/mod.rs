//! Command implementations. Each command prints its own progress and
//! returns a [`CommandOutcome`]; errors are rendered by `main`.

pub mod analyze;
pub mod audit;
pub mod flags;
pub mod improve;
pub mod init;
pub mod plan;
pub mod rollback;
pub mod sessions;
pub mod status;

pub use flags::{CommandOutcome, SessionArgs};
