//! Resumable session records for the interactive stages
//!
//! A session walks an ordered list of [`WorkItem`]s. Progress lives in a
//! marker map keyed by `filepath → item name`; an item is finished only when
//! its marker is [`Marker::Done`]. `current_index` is a resume hint and is
//! never used to decide completion.

use super::analysis::{CodeItem, ItemType};
use super::snapshot::FileSnapshot;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Which interactive stage a session belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Audit,
    Improve,
}

impl SessionKind {
    /// Prefix of the session file name
    pub fn file_prefix(&self) -> &'static str {
        match self {
            SessionKind::Audit => "audit-session-",
            SessionKind::Improve => "improve-session-",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionKind::Audit => write!(f, "audit"),
            SessionKind::Improve => write!(f, "improve"),
        }
    }
}

/// Per-item progress marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker<T> {
    Unprocessed,
    Done(T),
}

impl<T> Marker<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, Marker::Done(_))
    }

    pub fn outcome(&self) -> Option<&T> {
        match self {
            Marker::Done(outcome) => Some(outcome),
            Marker::Unprocessed => None,
        }
    }
}

/// filepath → item name → marker
pub type MarkerMap<T> = BTreeMap<String, BTreeMap<String, Marker<T>>>;

/// One unit of interactive work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub filepath: String,
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub language: String,
    pub line_number: usize,
}

impl WorkItem {
    pub fn same_item(&self, other: &WorkItem) -> bool {
        self.filepath == other.filepath && self.name == other.name
    }
}

impl From<&CodeItem> for WorkItem {
    fn from(item: &CodeItem) -> Self {
        Self {
            filepath: item.filepath.clone(),
            name: item.name.clone(),
            item_type: item.item_type,
            language: item.language.clone(),
            line_number: item.line_number,
        }
    }
}

/// Fields shared by every session record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionHeader {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub current_index: usize,
    pub total_items: usize,
    pub file_snapshot: BTreeMap<String, FileSnapshot>,
    /// Stage-specific options the session was started with
    #[serde(default)]
    pub config: serde_json::Value,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl SessionHeader {
    pub fn new(
        total_items: usize,
        file_snapshot: BTreeMap<String, FileSnapshot>,
        config: serde_json::Value,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            current_index: 0,
            total_items,
            file_snapshot,
            config,
            completed_at: None,
        }
    }
}

/// Outcome of auditing one item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditMark {
    /// Quality rating, 1 (terrible) to 4 (excellent)
    Rated { rating: u8, timestamp: DateTime<Utc> },
    Skipped { timestamp: DateTime<Utc> },
    Failed { message: String, timestamp: DateTime<Utc> },
}

impl AuditMark {
    pub fn rated(rating: u8) -> Self {
        AuditMark::Rated {
            rating,
            timestamp: Utc::now(),
        }
    }

    pub fn skipped() -> Self {
        AuditMark::Skipped {
            timestamp: Utc::now(),
        }
    }

    pub fn rating(&self) -> Option<u8> {
        match self {
            AuditMark::Rated { rating, .. } => Some(*rating),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Accepted,
    Skipped,
    Error,
}

/// Outcome of improving one item. Written once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub status: ItemStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusRecord {
    pub fn accepted(suggestion: impl Into<String>) -> Self {
        Self {
            status: ItemStatus::Accepted,
            timestamp: Utc::now(),
            suggestion: Some(suggestion.into()),
            message: None,
        }
    }

    pub fn skipped() -> Self {
        Self {
            status: ItemStatus::Skipped,
            timestamp: Utc::now(),
            suggestion: None,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ItemStatus::Error,
            timestamp: Utc::now(),
            suggestion: None,
            message: Some(message.into()),
        }
    }
}

/// Behaviour shared by audit and improve session records
pub trait SessionRecord: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    type Outcome: Clone + Send + Sync + 'static;

    const KIND: SessionKind;

    fn header(&self) -> &SessionHeader;
    fn header_mut(&mut self) -> &mut SessionHeader;
    fn items(&self) -> &[WorkItem];
    fn items_mut(&mut self) -> &mut Vec<WorkItem>;
    fn markers(&self) -> &MarkerMap<Self::Outcome>;
    fn markers_mut(&mut self) -> &mut MarkerMap<Self::Outcome>;

    /// Outcome recorded when processing an item fails
    fn failure(message: String) -> Self::Outcome;

    /// Whether the outcome means the session itself modified the item's file
    fn wrote_file(outcome: &Self::Outcome) -> bool;

    fn session_id(&self) -> &str {
        &self.header().session_id
    }

    fn is_processed(&self, item: &WorkItem) -> bool {
        self.markers()
            .get(&item.filepath)
            .and_then(|names| names.get(&item.name))
            .is_some_and(Marker::is_done)
    }

    /// Index of the first item, in list order, without a terminal marker
    fn next_unprocessed(&self) -> Option<usize> {
        self.items().iter().position(|item| !self.is_processed(item))
    }

    fn processed_count(&self) -> usize {
        self.items()
            .iter()
            .filter(|item| self.is_processed(item))
            .count()
    }

    /// Ensure an item has a marker, leaving an existing one untouched
    fn register(&mut self, item: &WorkItem) {
        self.markers_mut()
            .entry(item.filepath.clone())
            .or_default()
            .entry(item.name.clone())
            .or_insert(Marker::Unprocessed);
    }

    fn mark(&mut self, item: &WorkItem, outcome: Self::Outcome) {
        self.markers_mut()
            .entry(item.filepath.clone())
            .or_default()
            .insert(item.name.clone(), Marker::Done(outcome));
    }

    fn forget(&mut self, item: &WorkItem) {
        let markers = self.markers_mut();
        if let Some(names) = markers.get_mut(&item.filepath) {
            names.remove(&item.name);
            if names.is_empty() {
                markers.remove(&item.filepath);
            }
        }
    }

    /// Re-derive `total_items` and `current_index` after the item list changed
    fn refresh_progress(&mut self) {
        let total = self.items().len();
        let next = self.next_unprocessed().unwrap_or(total);
        let header = self.header_mut();
        header.total_items = total;
        header.current_index = next;
    }
}

/// Audit session: rates existing documentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditSession {
    #[serde(flatten)]
    pub header: SessionHeader,
    pub items: Vec<WorkItem>,
    pub partial_ratings: MarkerMap<AuditMark>,
}

impl AuditSession {
    pub fn new(
        items: Vec<WorkItem>,
        file_snapshot: BTreeMap<String, FileSnapshot>,
        config: serde_json::Value,
    ) -> Self {
        let mut session = Self {
            header: SessionHeader::new(items.len(), file_snapshot, config),
            items: Vec::new(),
            partial_ratings: BTreeMap::new(),
        };
        for item in &items {
            session.register(item);
        }
        session.items = items;
        session
    }

    /// filepath → name → rating (`None` for skipped or failed items)
    pub fn ratings(&self) -> BTreeMap<String, BTreeMap<String, Option<u8>>> {
        self.partial_ratings
            .iter()
            .map(|(file, names)| {
                let rated = names
                    .iter()
                    .filter_map(|(name, marker)| {
                        marker.outcome().map(|mark| (name.clone(), mark.rating()))
                    })
                    .collect();
                (file.clone(), rated)
            })
            .collect()
    }
}

impl SessionRecord for AuditSession {
    type Outcome = AuditMark;

    const KIND: SessionKind = SessionKind::Audit;

    fn header(&self) -> &SessionHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut SessionHeader {
        &mut self.header
    }

    fn items(&self) -> &[WorkItem] {
        &self.items
    }

    fn items_mut(&mut self) -> &mut Vec<WorkItem> {
        &mut self.items
    }

    fn markers(&self) -> &MarkerMap<AuditMark> {
        &self.partial_ratings
    }

    fn markers_mut(&mut self) -> &mut MarkerMap<AuditMark> {
        &mut self.partial_ratings
    }

    fn failure(message: String) -> AuditMark {
        AuditMark::Failed {
            message,
            timestamp: Utc::now(),
        }
    }

    fn wrote_file(_outcome: &AuditMark) -> bool {
        false
    }
}

/// Improve session: writes accepted documentation into source files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImproveSession {
    #[serde(flatten)]
    pub header: SessionHeader,
    pub transaction_id: String,
    /// Resume order
    pub plan_items: Vec<WorkItem>,
    pub partial_improvements: MarkerMap<StatusRecord>,
    #[serde(default)]
    pub previous_session_id: Option<String>,
}

impl ImproveSession {
    pub fn new(
        plan_items: Vec<WorkItem>,
        file_snapshot: BTreeMap<String, FileSnapshot>,
        config: serde_json::Value,
    ) -> Self {
        let header = SessionHeader::new(plan_items.len(), file_snapshot, config);
        let mut session = Self {
            transaction_id: header.session_id.clone(),
            header,
            plan_items: Vec::new(),
            partial_improvements: BTreeMap::new(),
            previous_session_id: None,
        };
        for item in &plan_items {
            session.register(item);
        }
        session.plan_items = plan_items;
        session
    }

    pub fn count_status(&self, status: ItemStatus) -> usize {
        self.partial_improvements
            .values()
            .flat_map(|names| names.values())
            .filter_map(Marker::outcome)
            .filter(|record| record.status == status)
            .count()
    }
}

impl SessionRecord for ImproveSession {
    type Outcome = StatusRecord;

    const KIND: SessionKind = SessionKind::Improve;

    fn header(&self) -> &SessionHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut SessionHeader {
        &mut self.header
    }

    fn items(&self) -> &[WorkItem] {
        &self.plan_items
    }

    fn items_mut(&mut self) -> &mut Vec<WorkItem> {
        &mut self.plan_items
    }

    fn markers(&self) -> &MarkerMap<StatusRecord> {
        &self.partial_improvements
    }

    fn markers_mut(&mut self) -> &mut MarkerMap<StatusRecord> {
        &mut self.partial_improvements
    }

    fn failure(message: String) -> StatusRecord {
        StatusRecord::error(message)
    }

    fn wrote_file(outcome: &StatusRecord) -> bool {
        outcome.status == ItemStatus::Accepted
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::work_item;
    use super::*;

    fn three_item_audit() -> AuditSession {
        AuditSession::new(
            vec![
                work_item("a.py", "first"),
                work_item("b.py", "second"),
                work_item("c.py", "third"),
            ],
            BTreeMap::new(),
            serde_json::json!({}),
        )
    }

    #[test]
    fn test_new_session_registers_every_item() {
        let session = three_item_audit();

        assert_eq!(session.header.total_items, 3);
        assert_eq!(session.header.current_index, 0);
        assert!(session.header.completed_at.is_none());
        assert_eq!(session.next_unprocessed(), Some(0));
        assert_eq!(
            session.partial_ratings["b.py"]["second"],
            Marker::Unprocessed
        );
    }

    #[test]
    fn test_resume_point_ignores_current_index() {
        let mut session = three_item_audit();
        let items = session.items.clone();
        session.mark(&items[0], AuditMark::rated(3));
        session.mark(&items[2], AuditMark::rated(1));
        session.header.current_index = 3;

        assert_eq!(session.next_unprocessed(), Some(1));
        assert_eq!(session.processed_count(), 2);

        session.refresh_progress();
        assert_eq!(session.header.current_index, 1);
    }

    #[test]
    fn test_missing_marker_counts_as_unprocessed() {
        let mut session = three_item_audit();
        session.partial_ratings.remove("a.py");
        assert!(!session.is_processed(&work_item("a.py", "first")));
    }

    #[test]
    fn test_ratings_exclude_unprocessed_items() {
        let mut session = three_item_audit();
        let items = session.items.clone();
        session.mark(&items[0], AuditMark::rated(4));
        session.mark(&items[1], AuditMark::skipped());

        let ratings = session.ratings();
        assert_eq!(ratings["a.py"]["first"], Some(4));
        assert_eq!(ratings["b.py"]["second"], None);
        assert!(ratings["c.py"].is_empty());
    }

    #[test]
    fn test_improve_session_uses_session_id_as_transaction() {
        let session = ImproveSession::new(
            vec![work_item("a.py", "first")],
            BTreeMap::new(),
            serde_json::json!({"tone": "concise"}),
        );
        assert_eq!(session.transaction_id, session.header.session_id);
        assert!(session.previous_session_id.is_none());
    }

    #[test]
    fn test_marker_json_shape() {
        let mut session = ImproveSession::new(
            vec![work_item("a.py", "first"), work_item("a.py", "second")],
            BTreeMap::new(),
            serde_json::Value::Null,
        );
        let first = session.plan_items[0].clone();
        session.mark(&first, StatusRecord::accepted("\"\"\"Docs.\"\"\""));

        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["partial_improvements"]["a.py"]["second"], "unprocessed");
        assert_eq!(
            json["partial_improvements"]["a.py"]["first"]["done"]["status"],
            "accepted"
        );
        assert_eq!(json["session_id"], session.header.session_id.as_str());

        let back: ImproveSession = serde_json::from_value(json).unwrap();
        assert_eq!(back, session);
    }

    #[test]
    fn test_forget_drops_empty_files() {
        let mut session = three_item_audit();
        session.forget(&work_item("a.py", "first"));
        assert!(!session.partial_ratings.contains_key("a.py"));
    }
}
