//! FileIntegrityTracker - snapshot and change detection

use crate::models::FileSnapshot;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Hex SHA-256 of a byte slice
pub fn checksum_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Hex SHA-256 of a file's full contents
pub fn checksum_file(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(checksum_bytes(&bytes))
}

/// Snapshot one file. `Ok(None)` for anything that is not a regular file.
pub fn snapshot_file(filepath: &str) -> io::Result<Option<FileSnapshot>> {
    let path = Path::new(filepath);
    let metadata = fs::metadata(path)?;
    if !metadata.is_file() {
        return Ok(None);
    }

    let bytes = fs::read(path)?;
    let timestamp = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());

    Ok(Some(FileSnapshot {
        filepath: filepath.to_string(),
        checksum: checksum_bytes(&bytes),
        size: bytes.len() as u64,
        timestamp,
    }))
}

/// Snapshot a set of files concurrently.
///
/// Files that cannot be stat'ed or read are logged and left out; a single bad
/// file never fails the whole snapshot.
pub async fn create_snapshot<I, S>(filepaths: I) -> BTreeMap<String, FileSnapshot>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut tasks = JoinSet::new();
    for filepath in filepaths {
        let filepath: String = filepath.into();
        tasks.spawn_blocking(move || {
            let result = snapshot_file(&filepath);
            (filepath, result)
        });
    }

    let mut snapshot = BTreeMap::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((filepath, Ok(Some(entry)))) => {
                snapshot.insert(filepath, entry);
            }
            Ok((filepath, Ok(None))) => {
                debug!(%filepath, "Skipping non-regular file");
            }
            Ok((filepath, Err(e))) => {
                warn!(%filepath, error = %e, "Cannot snapshot file, omitting it");
            }
            Err(e) => {
                warn!(error = %e, "Snapshot task failed");
            }
        }
    }

    snapshot
}

/// Files in `snapshot` whose content can no longer be confirmed unchanged.
///
/// A file is changed when its hash differs, it is missing, or it cannot be
/// read. Modification time alone is ignored. Returned sorted.
pub async fn detect_changes(snapshot: &BTreeMap<String, FileSnapshot>) -> Vec<String> {
    let checksums = checksums_of(snapshot);
    detect_checksum_changes(&checksums).await
}

/// Same policy as [`detect_changes`], over a filepath → checksum map
pub async fn detect_checksum_changes(checksums: &BTreeMap<String, String>) -> Vec<String> {
    let mut tasks = JoinSet::new();
    for (filepath, expected) in checksums {
        let filepath = filepath.clone();
        let expected = expected.clone();
        tasks.spawn_blocking(move || {
            let changed = match checksum_file(Path::new(&filepath)) {
                Ok(actual) => actual != expected,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!(%filepath, "Tracked file is gone");
                    true
                }
                Err(e) => {
                    warn!(%filepath, error = %e, "Cannot read tracked file, treating as changed");
                    true
                }
            };
            (filepath, changed)
        });
    }

    let mut changed = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((filepath, true)) => changed.push(filepath),
            Ok((_, false)) => {}
            Err(e) => warn!(error = %e, "Change detection task failed"),
        }
    }

    changed.sort();
    changed
}

/// Reduce a snapshot to filepath → checksum
pub fn checksums_of(snapshot: &BTreeMap<String, FileSnapshot>) -> BTreeMap<String, String> {
    snapshot
        .iter()
        .map(|(path, entry)| (path.clone(), entry.checksum.clone()))
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
