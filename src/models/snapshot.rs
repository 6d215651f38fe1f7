use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content fingerprint of a single source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSnapshot {
    pub filepath: String,

    /// SHA-256 of the full file contents, lowercase hex
    pub checksum: String,

    pub size: u64,

    /// Last modification time reported by the filesystem
    pub timestamp: DateTime<Utc>,
}
