//! Fold per-file re-analysis results back into a full analysis result

use crate::models::AnalysisResult;
use std::collections::BTreeSet;
use tracing::debug;

/// Merge `partials` (fresh results for `changed_files`) into `previous`.
///
/// Items and parse failures recorded for changed files are replaced by what
/// the partials report; every aggregate is recomputed from the merged items.
/// `previous` is not modified.
pub fn merge_incremental(
    previous: &AnalysisResult,
    partials: &[AnalysisResult],
    changed_files: &[String],
) -> AnalysisResult {
    let changed: BTreeSet<&str> = changed_files.iter().map(String::as_str).collect();

    let items = previous
        .items
        .iter()
        .filter(|item| !changed.contains(item.filepath.as_str()))
        .chain(partials.iter().flat_map(|partial| partial.items.iter()))
        .cloned()
        .collect();

    let parse_failures = previous
        .parse_failures
        .iter()
        .filter(|failure| !changed.contains(failure.filepath.as_str()))
        .chain(partials.iter().flat_map(|partial| partial.parse_failures.iter()))
        .cloned()
        .collect();

    let analyzed_files: BTreeSet<String> = previous
        .analyzed_files
        .iter()
        .filter(|file| !changed.contains(file.as_str()))
        .chain(partials.iter().flat_map(|partial| partial.analyzed_files.iter()))
        .cloned()
        .collect();

    let merged = AnalysisResult::from_parts(
        items,
        parse_failures,
        analyzed_files.into_iter().collect(),
    );
    debug!(
        changed = changed.len(),
        partials = partials.len(),
        total_items = merged.total_items,
        "Merged incremental analysis"
    );
    merged
}
