//! Analysis results and the artifacts derived from them

pub mod merge;
pub mod plan;
pub mod store;

pub use merge::merge_incremental;
pub use plan::{build_plan, AuditResults, Plan, PlanItem, PlanReason, Ratings};
pub use store::{
    load_analysis, load_audit_results, load_plan, save_analysis, save_audit_results, save_plan,
};
