use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

use crate::error::{Error, Result};
use crate::ingest::{Ingestor, Normalizer};
use crate::record::{RecordSet, RecordStatus};
use crate::scoring::{
    BatchScheduler, CancelHandle, Progress, RunOutcome, SchedulerConfig, ScoringClient,
};

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub total: usize,
    pub scored: usize,
    pub failed: usize,
    pub pending: usize,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

pub struct RunOutput {
    /// Full, unfiltered collection in canonical order; collaborators filter
    /// this before export.
    pub records: RecordSet,
    pub summary: RunSummary,
}

/// Drives the whole pipeline: ingest, normalize, batch-score, merge. One
/// sequential control flow; the scheduler owns the only suspension points.
pub struct Pipeline {
    scheduler: BatchScheduler,
}

impl Pipeline {
    #[must_use]
    pub fn new(client: Arc<dyn ScoringClient>) -> Self {
        Self::with_config(SchedulerConfig::default(), client)
    }

    #[must_use]
    pub fn with_config(config: SchedulerConfig, client: Arc<dyn ScoringClient>) -> Self {
        Self {
            scheduler: BatchScheduler::new(config, client),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        self.scheduler.config()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.scheduler.subscribe()
    }

    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.scheduler.cancel_handle()
    }

    /// Runs the pipeline over raw uploaded text. Fatal errors (syntax,
    /// empty dataset) abort before any scoring and leave the pipeline idle;
    /// batch-level scoring failures only surface in record statuses.
    pub async fn run(&mut self, content: &str) -> Result<RunOutput> {
        let started_at = Utc::now();
        let timer = Instant::now();

        let raw = Ingestor::ingest(content)?;

        self.scheduler.mark_cleaning();
        let normalized = Normalizer::normalize(raw);
        if normalized.is_empty() {
            self.scheduler.reset();
            return Err(Error::EmptyDataset);
        }

        tracing::info!(records = normalized.len(), "dataset normalized");
        let mut records = RecordSet::from_normalized(normalized);
        let outcome = self.scheduler.run(&mut records).await;

        let summary = RunSummary {
            total: records.len(),
            scored: records.count_with_status(RecordStatus::Scored),
            failed: records.count_with_status(RecordStatus::Failed),
            pending: records.count_with_status(RecordStatus::Pending),
            cancelled: outcome == RunOutcome::Cancelled,
            started_at,
            duration_ms: timer.elapsed().as_millis() as u64,
        };

        tracing::info!(
            total = summary.total,
            scored = summary.scored,
            failed = summary.failed,
            cancelled = summary.cancelled,
            duration_ms = summary.duration_ms,
            "pipeline run finished"
        );

        Ok(RunOutput { records, summary })
    }
}
