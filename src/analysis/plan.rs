//! Improvement plan generation
//!
//! The plan lists every item that is undocumented or whose documentation
//! was rated at or below the quality threshold, highest impact first.

use crate::models::{AnalysisResult, CodeItem, WorkItem};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Audit ratings: filepath → item name → rating (`None` when skipped)
pub type Ratings = BTreeMap<String, BTreeMap<String, Option<u8>>>;

/// Persisted outcome of a completed audit session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditResults {
    pub session_id: String,
    pub completed_at: DateTime<Utc>,
    pub ratings: Ratings,
}

impl AuditResults {
    pub fn rating(&self, filepath: &str, name: &str) -> Option<u8> {
        self.ratings
            .get(filepath)
            .and_then(|names| names.get(name))
            .copied()
            .flatten()
    }

    pub fn rated_count(&self) -> usize {
        self.ratings
            .values()
            .flat_map(|names| names.values())
            .filter(|rating| rating.is_some())
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanReason {
    Undocumented,
    LowQuality,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanItem {
    #[serde(flatten)]
    pub item: WorkItem,
    pub reason: PlanReason,
    #[serde(default)]
    pub rating: Option<u8>,
    pub impact_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub generated_at: DateTime<Utc>,
    pub quality_threshold: u8,
    pub items: Vec<PlanItem>,
}

impl Plan {
    pub fn work_items(&self) -> Vec<WorkItem> {
        self.items.iter().map(|entry| entry.item.clone()).collect()
    }
}

fn reason_for(
    item: &CodeItem,
    audit: Option<&AuditResults>,
    threshold: u8,
) -> Option<(PlanReason, Option<u8>)> {
    if !item.has_docs {
        return Some((PlanReason::Undocumented, None));
    }
    let rating = audit.and_then(|audit| audit.rating(&item.filepath, &item.name))?;
    (rating <= threshold).then_some((PlanReason::LowQuality, Some(rating)))
}

/// Build the plan; ties on impact keep analysis order
pub fn build_plan(analysis: &AnalysisResult, audit: Option<&AuditResults>, threshold: u8) -> Plan {
    let mut items: Vec<PlanItem> = analysis
        .items
        .iter()
        .filter_map(|item| {
            reason_for(item, audit, threshold).map(|(reason, rating)| PlanItem {
                item: WorkItem::from(item),
                reason,
                rating,
                impact_score: item.impact_score,
            })
        })
        .collect();

    items.sort_by(|a, b| {
        b.impact_score
            .partial_cmp(&a.impact_score)
            .unwrap_or(Ordering::Equal)
    });

    Plan {
        generated_at: Utc::now(),
        quality_threshold: threshold,
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::analysis::fixtures::item;

    fn audit(ratings: &[(&str, &str, Option<u8>)]) -> AuditResults {
        let mut map = Ratings::new();
        for (file, name, rating) in ratings {
            map.entry(file.to_string())
                .or_default()
                .insert(name.to_string(), *rating);
        }
        AuditResults {
            session_id: "s".to_string(),
            completed_at: Utc::now(),
            ratings: map,
        }
    }

    #[test]
    fn test_selects_undocumented_and_low_rated() {
        let mut low = item("a.py", "low", "python", true);
        low.impact_score = 5.0;
        let mut missing = item("a.py", "missing", "python", false);
        missing.impact_score = 50.0;
        let analysis = AnalysisResult::from_parts(
            vec![
                low,
                missing,
                item("a.py", "good", "python", true),
                item("a.py", "unrated", "python", true),
            ],
            vec![],
            vec!["a.py".to_string()],
        );
        let audit = audit(&[("a.py", "low", Some(2)), ("a.py", "good", Some(4))]);

        let plan = build_plan(&analysis, Some(&audit), 2);

        let names: Vec<_> = plan.items.iter().map(|p| p.item.name.as_str()).collect();
        assert_eq!(names, vec!["missing", "low"]);
        assert_eq!(plan.items[0].reason, PlanReason::Undocumented);
        assert_eq!(plan.items[1].reason, PlanReason::LowQuality);
        assert_eq!(plan.items[1].rating, Some(2));
    }

    #[test]
    fn test_without_audit_only_undocumented() {
        let analysis = AnalysisResult::from_parts(
            vec![item("a.py", "f", "python", true), item("b.py", "g", "python", false)],
            vec![],
            vec![],
        );

        let plan = build_plan(&analysis, None, 2);
        assert_eq!(plan.work_items().len(), 1);
        assert_eq!(plan.items[0].item.name, "g");
    }

    #[test]
    fn test_skipped_rating_is_not_low_quality() {
        let analysis =
            AnalysisResult::from_parts(vec![item("a.py", "f", "python", true)], vec![], vec![]);
        let audit = audit(&[("a.py", "f", None)]);

        assert!(build_plan(&analysis, Some(&audit), 4).items.is_empty());
        assert_eq!(audit.rated_count(), 0);
    }
}
