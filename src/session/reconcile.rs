//! Bring a paused session back in line with the files on disk
//!
//! Runs before the first item of a resumed session. Files whose checksum no
//! longer matches the session snapshot are re-analyzed. Items the analyzer
//! no longer reports are dropped together with their markers. Items it still
//! reports stay, even when they no longer pass the session's eligibility
//! filter; only items new to the session are filtered. Snapshot entries are
//! refreshed or removed.

use crate::collab::{analyze_files, Analyzer};
use crate::integrity::{create_snapshot, detect_changes};
use crate::models::{CodeItem, SessionRecord, WorkItem};
use anyhow::Result;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub changed_files: Vec<String>,
    pub added_items: usize,
    pub dropped_items: usize,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.changed_files.is_empty()
    }
}

pub async fn reconcile_with_files<R: SessionRecord>(
    record: &mut R,
    analyzer: &dyn Analyzer,
    eligible: &(dyn Fn(&CodeItem) -> bool + Sync),
) -> Result<ReconcileReport> {
    let changed = detect_changes(&record.header().file_snapshot).await;
    if changed.is_empty() {
        debug!(session_id = record.session_id(), "No files changed since last checkpoint");
        record.refresh_progress();
        return Ok(ReconcileReport::default());
    }

    let (present, gone): (Vec<String>, Vec<String>) = changed
        .iter()
        .cloned()
        .partition(|file| Path::new(file).is_file());

    let fresh = analyze_files(analyzer, &present).await?;
    let reported: Vec<WorkItem> = fresh
        .iter()
        .flat_map(|result| result.items.iter())
        .map(WorkItem::from)
        .collect();

    let changed_set: BTreeSet<&str> = changed.iter().map(String::as_str).collect();
    let mut report = ReconcileReport {
        changed_files: changed.clone(),
        ..Default::default()
    };

    // Drop items in changed files that the fresh analysis no longer reports.
    // Eligibility is not rechecked here: a processed item keeps its marker.
    let stale: Vec<WorkItem> = record
        .items()
        .iter()
        .filter(|item| changed_set.contains(item.filepath.as_str()))
        .filter(|item| !reported.iter().any(|fresh| fresh.same_item(item)))
        .cloned()
        .collect();
    for item in &stale {
        record.forget(item);
    }
    record
        .items_mut()
        .retain(|item| !stale.iter().any(|s| s.same_item(item)));
    report.dropped_items = stale.len();

    // Keep surviving items current (line numbers move when files are edited)
    for item in record.items_mut().iter_mut() {
        if let Some(fresh) = reported.iter().find(|fresh| fresh.same_item(item)) {
            item.line_number = fresh.line_number;
        }
    }

    let new_items: Vec<WorkItem> = fresh
        .iter()
        .flat_map(|result| result.items.iter())
        .filter(|item| eligible(*item))
        .map(WorkItem::from)
        .filter(|item| !record.items().iter().any(|known| known.same_item(item)))
        .collect();
    for item in new_items {
        record.register(&item);
        record.items_mut().push(item);
        report.added_items += 1;
    }

    let refreshed = create_snapshot(present.iter().cloned()).await;
    let snapshot = &mut record.header_mut().file_snapshot;
    for file in &changed {
        snapshot.remove(file);
    }
    snapshot.extend(refreshed);

    record.refresh_progress();

    info!(
        session_id = record.session_id(),
        changed = report.changed_files.len(),
        deleted = gone.len(),
        added = report.added_items,
        dropped = report.dropped_items,
        "Reconciled session with modified files"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::analysis::fixtures::item;
    use crate::models::{
        AnalysisResult, AuditMark, AuditSession, ImproveSession, ItemStatus, StatusRecord,
    };
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Answers `analyze_file` from a table of function names per file
    struct TableAnalyzer {
        table: Mutex<HashMap<String, Vec<&'static str>>>,
        documented: Mutex<Vec<&'static str>>,
    }

    impl TableAnalyzer {
        fn new() -> Self {
            Self {
                table: Mutex::new(HashMap::new()),
                documented: Mutex::new(Vec::new()),
            }
        }

        fn set(&self, file: &str, names: Vec<&'static str>) {
            self.table.lock().unwrap().insert(file.to_string(), names);
        }

        fn document(&self, name: &'static str) {
            self.documented.lock().unwrap().push(name);
        }
    }

    #[async_trait]
    impl Analyzer for TableAnalyzer {
        async fn analyze_path(&self, _root: &Path) -> Result<AnalysisResult> {
            unreachable!()
        }

        async fn analyze_file(&self, filepath: &str) -> Result<AnalysisResult> {
            let names = self
                .table
                .lock()
                .unwrap()
                .get(filepath)
                .cloned()
                .unwrap_or_default();
            let documented = self.documented.lock().unwrap().clone();
            let items = names
                .into_iter()
                .map(|name| item(filepath, name, "python", documented.contains(&name)))
                .collect();
            Ok(AnalysisResult::from_parts(items, vec![], vec![filepath.to_string()]))
        }
    }

    fn path_str(temp: &TempDir, name: &str) -> String {
        temp.path().join(name).to_string_lossy().to_string()
    }

    async fn session_over(files: &[(&str, &str, Vec<&str>)]) -> AuditSession {
        let items = files
            .iter()
            .flat_map(|(path, _, names)| {
                names
                    .iter()
                    .map(|name| WorkItem::from(&item(path, name, "python", false)))
                    .collect::<Vec<_>>()
            })
            .collect();
        for (path, content, _) in files {
            fs::write(path, content).unwrap();
        }
        let snapshot = create_snapshot(files.iter().map(|(path, _, _)| path.to_string())).await;
        AuditSession::new(items, snapshot, serde_json::json!({}))
    }

    fn everything(_: &CodeItem) -> bool {
        true
    }

    #[tokio::test]
    async fn test_unchanged_files_are_a_noop() {
        let temp = TempDir::new().unwrap();
        let a = path_str(&temp, "a.py");
        let mut session = session_over(&[(a.as_str(), "def f(): pass\n", vec!["f"])]).await;
        let before = session.clone();

        let report = reconcile_with_files(&mut session, &TableAnalyzer::new(), &everything)
            .await
            .unwrap();

        assert!(report.is_noop());
        assert_eq!(session, before);
    }

    #[tokio::test]
    async fn test_new_item_appended_and_vanished_item_dropped() {
        let temp = TempDir::new().unwrap();
        let a = path_str(&temp, "a.py");
        let b = path_str(&temp, "b.py");
        let mut session = session_over(&[
            (a.as_str(), "def f(): pass\ndef g(): pass\n", vec!["f", "g"]),
            (b.as_str(), "def h(): pass\n", vec!["h"]),
        ])
        .await;
        let f = session.items[0].clone();
        session.mark(&f, AuditMark::rated(2));

        fs::write(a.as_str(), "def f(): pass\ndef k(): pass\n").unwrap();
        let analyzer = TableAnalyzer::new();
        analyzer.set(&a, vec!["f", "k"]);

        let report = reconcile_with_files(&mut session, &analyzer, &everything)
            .await
            .unwrap();

        assert_eq!(report.changed_files, vec![a.clone()]);
        assert_eq!(report.added_items, 1);
        assert_eq!(report.dropped_items, 1);

        let names: Vec<_> = session.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["f", "h", "k"]);
        assert!(session.is_processed(&f), "surviving marker is kept");
        assert!(!session.partial_ratings[&a].contains_key("g"));
        assert_eq!(session.header.total_items, 3);
        assert_eq!(session.header.current_index, 1);
        assert_eq!(
            session.header.file_snapshot[&a].checksum,
            crate::integrity::checksum_bytes(b"def f(): pass\ndef k(): pass\n")
        );
    }

    #[tokio::test]
    async fn test_deleted_file_drops_items_and_snapshot_entry() {
        let temp = TempDir::new().unwrap();
        let a = path_str(&temp, "a.py");
        let b = path_str(&temp, "b.py");
        let mut session = session_over(&[
            (a.as_str(), "def f(): pass\n", vec!["f"]),
            (b.as_str(), "def h(): pass\n", vec!["h"]),
        ])
        .await;

        fs::remove_file(&b).unwrap();

        let report = reconcile_with_files(&mut session, &TableAnalyzer::new(), &everything)
            .await
            .unwrap();

        assert_eq!(report.dropped_items, 1);
        assert_eq!(session.items.len(), 1);
        assert!(!session.header.file_snapshot.contains_key(&b));
        assert!(!session.partial_ratings.contains_key(&b));
    }

    #[tokio::test]
    async fn test_ineligible_new_items_are_ignored() {
        let temp = TempDir::new().unwrap();
        let a = path_str(&temp, "a.py");
        let mut session = session_over(&[(a.as_str(), "def f(): pass\n", vec!["f"])]).await;

        fs::write(a.as_str(), "def f(): pass\ndef _private(): pass\n").unwrap();
        let analyzer = TableAnalyzer::new();
        analyzer.set(&a, vec!["f", "_private"]);

        let public_only = |item: &CodeItem| !item.name.starts_with('_');
        let report = reconcile_with_files(&mut session, &analyzer, &public_only)
            .await
            .unwrap();

        assert_eq!(report.added_items, 0);
        assert_eq!(session.items.len(), 1);
    }

    #[tokio::test]
    async fn test_processed_item_survives_losing_eligibility() {
        let temp = TempDir::new().unwrap();
        let a = path_str(&temp, "a.py");
        fs::write(&a, "def f(): pass\ndef g(): pass\n").unwrap();
        let items: Vec<WorkItem> = ["f", "g"]
            .iter()
            .map(|name| WorkItem::from(&item(&a, name, "python", false)))
            .collect();
        let snapshot = create_snapshot([a.clone()]).await;
        let mut session = ImproveSession::new(items.clone(), snapshot, serde_json::json!({}));
        session.mark(&items[0], StatusRecord::accepted("Does f."));

        // The accepted docs are in the file now, plus an unrelated edit
        fs::write(&a, "# Does f.\ndef f(): pass\ndef g(): return 1\n").unwrap();
        let analyzer = TableAnalyzer::new();
        analyzer.set(&a, vec!["f", "g"]);
        analyzer.document("f");

        let report = reconcile_with_files(&mut session, &analyzer, &|item: &CodeItem| {
            !item.has_docs
        })
        .await
        .unwrap();

        assert_eq!(report.dropped_items, 0);
        let names: Vec<_> = session.plan_items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["f", "g"]);
        assert!(session.is_processed(&items[0]));
        assert_eq!(session.count_status(ItemStatus::Accepted), 1);
        assert_eq!(session.next_unprocessed(), Some(1));
    }
}
