//! SessionDriver - runs an interactive session item by item
//!
//! ```text
//! Fresh ──┐
//!         ├──> Running ──> Completed (record deleted)
//! Resume ─┘        ├─────> Paused    (record kept, completed_at unset)
//!                  └─────> finalize failed (record kept, completed_at unset)
//! ```
//!
//! The record is checkpointed after every item so a crash loses at most the
//! item in flight. Stage-specific work lives behind [`ItemProcessor`].

use super::reconcile::reconcile_with_files;
use super::store::SessionStore;
use crate::collab::{Analyzer, Progress};
use crate::integrity::snapshot_file;
use crate::models::{CodeItem, SessionRecord, WorkItem};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

/// What happened to one item
#[derive(Debug, Clone, PartialEq)]
pub enum ItemStep<T> {
    Done(T),
    /// Stop here; the current item stays unprocessed
    Quit,
}

#[async_trait]
pub trait ItemProcessor<R: SessionRecord>: Send {
    /// Whether a newly discovered item joins a resumed session
    fn eligible(item: &CodeItem) -> bool
    where
        Self: Sized;

    /// Hook run on a resumed record before any item is processed.
    /// May change the session id.
    async fn before_resume(&mut self, _record: &mut R) -> Result<()> {
        Ok(())
    }

    async fn process(
        &mut self,
        record: &R,
        item: &WorkItem,
        progress: Progress,
    ) -> Result<ItemStep<R::Outcome>>;

    /// Called once after the last item received its marker. An error keeps
    /// the record on disk, unfinished, so a resume retries finalization.
    /// Best-effort steps should log their own failures instead.
    async fn finalize(&mut self, record: &R) -> Result<()>;
}

pub enum SessionStart<R> {
    Fresh(R),
    Resume(R),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed { session_id: String, processed: usize },
    Paused { session_id: String, remaining: usize },
}

impl SessionOutcome {
    pub fn session_id(&self) -> &str {
        match self {
            SessionOutcome::Completed { session_id, .. }
            | SessionOutcome::Paused { session_id, .. } => session_id,
        }
    }
}

pub struct SessionDriver<'a> {
    store: &'a SessionStore,
    analyzer: &'a dyn Analyzer,
}

impl<'a> SessionDriver<'a> {
    pub fn new(store: &'a SessionStore, analyzer: &'a dyn Analyzer) -> Self {
        Self { store, analyzer }
    }

    pub async fn run<R, P>(&self, start: SessionStart<R>, processor: &mut P) -> Result<SessionOutcome>
    where
        R: SessionRecord,
        P: ItemProcessor<R>,
    {
        let mut record = match start {
            SessionStart::Fresh(record) => {
                info!(
                    kind = %R::KIND,
                    session_id = record.session_id(),
                    items = record.items().len(),
                    "Starting session"
                );
                record
            }
            SessionStart::Resume(record) => self.prepare_resume(record, processor).await?,
        };
        self.store.save(&record)?;

        while let Some(index) = record.next_unprocessed() {
            let item = record.items()[index].clone();
            let progress = Progress {
                position: record.processed_count() + 1,
                total: record.items().len(),
            };

            let outcome = match processor.process(&record, &item, progress).await {
                Ok(ItemStep::Done(outcome)) => outcome,
                Ok(ItemStep::Quit) => {
                    record.refresh_progress();
                    self.store.save(&record)?;
                    let remaining = record.items().len() - record.processed_count();
                    info!(
                        kind = %R::KIND,
                        session_id = record.session_id(),
                        remaining,
                        "Session paused"
                    );
                    return Ok(SessionOutcome::Paused {
                        session_id: record.session_id().to_string(),
                        remaining,
                    });
                }
                Err(e) => {
                    warn!(item = %item.name, file = %item.filepath, error = %e, "Item failed");
                    R::failure(format!("{:#}", e))
                }
            };

            let wrote_file = R::wrote_file(&outcome);
            record.mark(&item, outcome);
            record.refresh_progress();
            if wrote_file {
                refresh_snapshot_entry(&mut record, &item.filepath);
            }
            self.store.save(&record)?;
        }

        record.header_mut().completed_at = Some(Utc::now());
        if let Err(e) = processor.finalize(&record).await {
            warn!(session_id = record.session_id(), error = %e, "Failed to finalize session");
            record.header_mut().completed_at = None;
            self.store.save(&record)?;
            return Err(e.context(format!(
                "Session {} was kept; resume it to retry",
                record.session_id()
            )));
        }
        self.store.delete::<R>(record.session_id())?;

        let processed = record.processed_count();
        info!(kind = %R::KIND, session_id = record.session_id(), processed, "Session completed");
        Ok(SessionOutcome::Completed {
            session_id: record.session_id().to_string(),
            processed,
        })
    }

    async fn prepare_resume<R, P>(&self, mut record: R, processor: &mut P) -> Result<R>
    where
        R: SessionRecord,
        P: ItemProcessor<R>,
    {
        let original_id = record.session_id().to_string();
        info!(
            kind = %R::KIND,
            session_id = %original_id,
            processed = record.processed_count(),
            total = record.items().len(),
            "Resuming session"
        );

        processor.before_resume(&mut record).await?;
        reconcile_with_files(&mut record, self.analyzer, &P::eligible).await?;

        if record.session_id() != original_id {
            // Persist under the new id first so the work is never unreferenced
            self.store.save(&record)?;
            self.store.delete::<R>(&original_id)?;
            debug!(from = %original_id, to = record.session_id(), "Session re-keyed");
        }
        Ok(record)
    }
}

fn refresh_snapshot_entry<R: SessionRecord>(record: &mut R, filepath: &str) {
    let snapshot = &mut record.header_mut().file_snapshot;
    match snapshot_file(filepath) {
        Ok(Some(entry)) => {
            snapshot.insert(filepath.to_string(), entry);
        }
        Ok(None) => {
            snapshot.remove(filepath);
        }
        Err(e) => {
            warn!(file = filepath, error = %e, "Failed to refresh snapshot entry");
            snapshot.remove(filepath);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
