pub mod analysis;
pub mod session;
pub mod snapshot;
pub mod stage;

pub use analysis::{AnalysisResult, CodeItem, ItemType, LanguageMetrics, ParseFailure};
pub use session::{
    AuditMark, AuditSession, ImproveSession, ItemStatus, Marker, MarkerMap, SessionHeader,
    SessionKind, SessionRecord, StatusRecord, WorkItem,
};
pub use snapshot::FileSnapshot;
pub use stage::{Stage, StageRecord, WorkflowState, SCHEMA_VERSION};
