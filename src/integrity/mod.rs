//! File fingerprinting and change detection
//!
//! - SHA-256 checksums over full file contents
//! - Snapshots of a file set (unreadable files are omitted)
//! - Change detection where "cannot confirm unchanged" counts as changed
//! - Source file discovery for incremental runs

mod discover;
mod tracker;

pub use discover::discover_source_files;
pub use tracker::{
    checksum_bytes, checksum_file, checksums_of, create_snapshot, detect_changes,
    detect_checksum_changes, snapshot_file,
};
