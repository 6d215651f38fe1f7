//! Analysis result data model
//!
//! Produced by the external analyzer and reshaped by docpilot. The aggregate
//! fields (`total_items`, `documented_items`, `coverage_percent`,
//! `by_language`) are always derivable from `items`; see
//! [`AnalysisResult::recompute_aggregates`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of documentable item reported by the analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Function,
    Method,
    Class,
    Struct,
    Enum,
    Interface,
    Module,
    Constant,
    Type,
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function => write!(f, "function"),
            Self::Method => write!(f, "method"),
            Self::Class => write!(f, "class"),
            Self::Struct => write!(f, "struct"),
            Self::Enum => write!(f, "enum"),
            Self::Interface => write!(f, "interface"),
            Self::Module => write!(f, "module"),
            Self::Constant => write!(f, "constant"),
            Self::Type => write!(f, "type"),
        }
    }
}

/// A single documentable item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeItem {
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub filepath: String,
    pub line_number: usize,
    #[serde(default)]
    pub end_line: usize,
    pub language: String,
    #[serde(default)]
    pub complexity: u32,
    #[serde(default)]
    pub impact_score: f64,
    pub has_docs: bool,
    #[serde(default)]
    pub docstring: Option<String>,
}

/// Per-language coverage breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageMetrics {
    pub language: String,
    pub total_items: usize,
    pub documented_items: usize,
    pub coverage_percent: f64,
    pub avg_complexity: f64,
    pub avg_impact_score: f64,
}

/// A file the analyzer could not parse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseFailure {
    pub filepath: String,
    pub error: String,
}

/// Result of analyzing a codebase, or a subset of its files
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub items: Vec<CodeItem>,
    #[serde(default)]
    pub total_items: usize,
    #[serde(default)]
    pub documented_items: usize,
    #[serde(default)]
    pub coverage_percent: f64,
    #[serde(default)]
    pub by_language: BTreeMap<String, LanguageMetrics>,
    #[serde(default)]
    pub parse_failures: Vec<ParseFailure>,
    #[serde(default)]
    pub analyzed_files: Vec<String>,
}

impl AnalysisResult {
    /// Build a result from raw parts, computing every aggregate
    pub fn from_parts(
        items: Vec<CodeItem>,
        parse_failures: Vec<ParseFailure>,
        analyzed_files: Vec<String>,
    ) -> Self {
        let mut result = Self {
            items,
            parse_failures,
            analyzed_files,
            ..Self::default()
        };
        result.recompute_aggregates();
        result
    }

    /// Recompute totals, coverage and the language breakdown from `items`
    pub fn recompute_aggregates(&mut self) {
        self.total_items = self.items.len();
        self.documented_items = self.items.iter().filter(|i| i.has_docs).count();
        self.coverage_percent = coverage(self.documented_items, self.total_items);

        let mut grouped: BTreeMap<&str, Vec<&CodeItem>> = BTreeMap::new();
        for item in &self.items {
            grouped.entry(item.language.as_str()).or_default().push(item);
        }

        self.by_language = grouped
            .into_iter()
            .map(|(language, items)| {
                let total = items.len();
                let documented = items.iter().filter(|i| i.has_docs).count();
                let complexity: f64 = items.iter().map(|i| f64::from(i.complexity)).sum();
                let impact: f64 = items.iter().map(|i| i.impact_score).sum();
                let metrics = LanguageMetrics {
                    language: language.to_string(),
                    total_items: total,
                    documented_items: documented,
                    coverage_percent: coverage(documented, total),
                    avg_complexity: complexity / total as f64,
                    avg_impact_score: impact / total as f64,
                };
                (language.to_string(), metrics)
            })
            .collect();
    }

    /// Find an item by its identity
    pub fn find(&self, filepath: &str, name: &str) -> Option<&CodeItem> {
        self.items
            .iter()
            .find(|i| i.filepath == filepath && i.name == name)
    }
}

fn coverage(documented: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        documented as f64 / total as f64 * 100.0
    }
}
