//! Scripted collaborators for driving docpilot end to end

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use docpilot::collab::{
    Analyzer, FileTransactionLog, ItemPrompt, Progress, RatingChoice, ReviewChoice,
    RollbackReport, RollbackTarget, SuggestionRequest, Suggester, TransactionLog,
    TransactionSummary, WriteEntry,
};
use docpilot::integrity::discover_source_files;
use docpilot::models::{AnalysisResult, CodeItem, ItemType, ParseFailure, WorkItem};
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::{Builder, TempDir};

/// Treats every `def name(` line as a function, documented when the line
/// above is a `#` comment. Files containing `!!` fail to parse.
#[derive(Default)]
pub struct LineAnalyzer {
    pub file_calls: AtomicUsize,
}

impl LineAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_calls(&self) -> usize {
        self.file_calls.load(Ordering::SeqCst)
    }

    fn parse(filepath: &str) -> Result<AnalysisResult> {
        let source = fs::read_to_string(filepath)?;
        if source.contains("!!") {
            return Ok(AnalysisResult::from_parts(
                vec![],
                vec![ParseFailure {
                    filepath: filepath.to_string(),
                    error: "unexpected '!!'".to_string(),
                }],
                vec![],
            ));
        }

        let lines: Vec<&str> = source.lines().collect();
        let items = lines
            .iter()
            .enumerate()
            .filter_map(|(index, line)| {
                let name = line.trim_start().strip_prefix("def ")?.split('(').next()?;
                let has_docs = index > 0 && lines[index - 1].trim_start().starts_with('#');
                Some(CodeItem {
                    name: name.to_string(),
                    item_type: ItemType::Function,
                    filepath: filepath.to_string(),
                    line_number: index + 1,
                    end_line: index + 2,
                    language: "python".to_string(),
                    complexity: 1,
                    impact_score: (name.len() * 10) as f64,
                    has_docs,
                    docstring: has_docs.then(|| lines[index - 1].to_string()),
                })
            })
            .collect();
        Ok(AnalysisResult::from_parts(
            items,
            vec![],
            vec![filepath.to_string()],
        ))
    }
}

#[async_trait]
impl Analyzer for LineAnalyzer {
    async fn analyze_path(&self, root: &Path) -> Result<AnalysisResult> {
        let mut items = Vec::new();
        let mut failures = Vec::new();
        let mut files = Vec::new();
        for file in discover_source_files(root, &["py".to_string()]) {
            let result = Self::parse(&file)?;
            items.extend(result.items);
            failures.extend(result.parse_failures);
            files.extend(result.analyzed_files);
        }
        Ok(AnalysisResult::from_parts(items, failures, files))
    }

    async fn analyze_file(&self, filepath: &str) -> Result<AnalysisResult> {
        self.file_calls.fetch_add(1, Ordering::SeqCst);
        Self::parse(filepath)
    }
}

/// Prompt that replays canned answers and records what it was shown
#[derive(Default)]
pub struct ScriptedPrompt {
    pub ratings: VecDeque<RatingChoice>,
    pub reviews: VecDeque<ReviewChoice>,
    pub shown: Vec<String>,
}

impl ScriptedPrompt {
    pub fn rating(choices: Vec<RatingChoice>) -> Self {
        Self {
            ratings: choices.into(),
            ..Self::default()
        }
    }

    pub fn reviews(choices: Vec<ReviewChoice>) -> Self {
        Self {
            reviews: choices.into(),
            ..Self::default()
        }
    }
}

impl ItemPrompt for ScriptedPrompt {
    fn rate(
        &mut self,
        item: &WorkItem,
        _docstring: Option<&str>,
        _progress: Progress,
    ) -> Result<RatingChoice> {
        self.shown.push(item.name.clone());
        Ok(self.ratings.pop_front().unwrap_or(RatingChoice::Quit))
    }

    fn review(
        &mut self,
        item: &WorkItem,
        _suggestion: &str,
        _progress: Progress,
    ) -> Result<ReviewChoice> {
        self.shown.push(item.name.clone());
        Ok(self.reviews.pop_front().unwrap_or(ReviewChoice::Quit))
    }
}

/// Suggests a one-line comment naming the item
pub struct EchoSuggester;

#[async_trait]
impl Suggester for EchoSuggester {
    async fn suggest(&self, request: &SuggestionRequest) -> Result<String> {
        let name = request
            .target
            .split('`')
            .nth(1)
            .unwrap_or("item")
            .to_string();
        Ok(format!("Does {}.", name))
    }
}

/// Journal that cannot record writes; everything else goes to a real log
pub struct UnwritableJournal {
    pub inner: FileTransactionLog,
}

impl TransactionLog for UnwritableJournal {
    fn begin_transaction(&self, session_id: &str) -> Result<()> {
        self.inner.begin_transaction(session_id)
    }

    fn record_write(&self, _session_id: &str, _entry: WriteEntry) -> Result<()> {
        anyhow::bail!("journal is read-only")
    }

    fn commit_transaction(&self, session_id: &str) -> Result<()> {
        self.inner.commit_transaction(session_id)
    }

    fn rollback_change(&self, target: &RollbackTarget) -> Result<RollbackReport> {
        self.inner.rollback_change(target)
    }

    fn list_sessions(&self) -> Result<Vec<TransactionSummary>> {
        self.inner.list_sessions()
    }
}

/// A project directory with `.py` files
pub struct Project {
    pub dir: TempDir,
}

impl Project {
    pub fn new(files: &[(&str, &str)]) -> Self {
        let dir = Builder::new().prefix("project").tempdir().unwrap();
        let project = Self { dir };
        for (name, content) in files {
            project.write(name, content);
        }
        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, name: &str) -> String {
        self.dir.path().join(name).to_string_lossy().to_string()
    }

    pub fn write(&self, name: &str, content: &str) {
        fs::write(self.dir.path().join(name), content).unwrap();
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.dir.path().join(name)).unwrap()
    }

    pub fn remove(&self, name: &str) {
        fs::remove_file(self.dir.path().join(name)).unwrap();
    }
}
