use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use super::client::{ScoreRequest, ScoringClient};
use super::merger::{MergeStats, ResultMerger};
use crate::record::RecordSet;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Records per external scoring request.
    pub batch_size: usize,
    /// Fixed pause between consecutive requests. Deliberate backpressure
    /// for the external rate limit, constant regardless of outcome.
    pub inter_batch_delay: Duration,
    /// Text sent to the scorer is truncated (not rejected) at this many
    /// characters.
    pub max_text_length: usize,
}

impl SchedulerConfig {
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    #[must_use]
    pub fn with_inter_batch_delay(mut self, delay: Duration) -> Self {
        self.inter_batch_delay = delay;
        self
    }

    #[must_use]
    pub fn with_max_text_length(mut self, max_text_length: usize) -> Self {
        self.max_text_length = max_text_length;
        self
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            inter_batch_delay: Duration::from_millis(5000),
            max_text_length: 2000,
        }
    }
}

/// Where a run currently is. Observable through the progress channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Cleaning,
    Scoring(usize),
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub phase: RunPhase,
    pub processed: usize,
    pub total: usize,
}

impl Progress {
    #[must_use]
    pub fn idle() -> Self {
        Self {
            phase: RunPhase::Idle,
            processed: 0,
            total: 0,
        }
    }
}

/// Clonable handle to request cancellation of an in-flight run. The
/// scheduler honors it between batches and during the inter-batch delay;
/// unscored records are left `Pending`.
#[derive(Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send_replace(true);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Cancelled,
}

/// Drives sequential, rate-limited scoring over the pending record set:
/// contiguous batches in canonical order, at most one outstanding external
/// call, a fixed sleep between calls, each outcome handed straight to the
/// merger.
pub struct BatchScheduler {
    config: SchedulerConfig,
    client: Arc<dyn ScoringClient>,
    progress_tx: watch::Sender<Progress>,
    cancel_tx: Arc<watch::Sender<bool>>,
    cancel_rx: watch::Receiver<bool>,
}

impl BatchScheduler {
    #[must_use]
    pub fn new(config: SchedulerConfig, client: Arc<dyn ScoringClient>) -> Self {
        let (progress_tx, _) = watch::channel(Progress::idle());
        let (cancel_tx, cancel_rx) = watch::channel(false);

        Self {
            config,
            client,
            progress_tx,
            cancel_tx: Arc::new(cancel_tx),
            cancel_rx,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Observes run progress without sharing any mutable state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.progress_tx.subscribe()
    }

    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            tx: Arc::clone(&self.cancel_tx),
        }
    }

    /// Returns the scheduler to its idle state, clearing any pending
    /// cancellation request.
    pub fn reset(&mut self) {
        let _ = self.cancel_tx.send_replace(false);
        self.progress_tx.send_replace(Progress::idle());
    }

    /// Publishes the normalization phase; called by the pipeline before the
    /// record set exists.
    pub fn mark_cleaning(&self) {
        self.progress_tx.send_replace(Progress {
            phase: RunPhase::Cleaning,
            processed: 0,
            total: 0,
        });
    }

    /// Scores every record in `records`, batch by batch. All records are
    /// expected to be `Pending`; ids are snapshotted up front so batch
    /// membership is fixed for the whole run.
    pub async fn run(&mut self, records: &mut RecordSet) -> RunOutcome {
        let total = records.len();
        let ids = records.ids();
        let batch_count = ids.chunks(self.config.batch_size.max(1)).count();
        let mut processed = 0usize;
        let mut totals = MergeStats::default();

        for (index, batch) in ids.chunks(self.config.batch_size.max(1)).enumerate() {
            if self.is_cancelled() {
                return self.finish_cancelled(processed, total);
            }

            self.publish(RunPhase::Scoring(index), processed, total);

            let requests = self.build_requests(records, batch);
            let outcome = self.client.score_batch(&requests).await;

            let stats = ResultMerger::apply(records, batch, outcome);
            totals.scored += stats.scored;
            totals.failed += stats.failed;

            processed = (processed + batch.len()).min(total);
            self.publish(RunPhase::Scoring(index), processed, total);

            if index + 1 < batch_count {
                tokio::select! {
                    () = tokio::time::sleep(self.config.inter_batch_delay) => {}
                    changed = self.cancel_rx.changed() => {
                        if changed.is_ok() && *self.cancel_rx.borrow() {
                            return self.finish_cancelled(processed, total);
                        }
                    }
                }
            }
        }

        tracing::info!(
            total,
            scored = totals.scored,
            failed = totals.failed,
            "scoring run complete"
        );
        self.publish(RunPhase::Done, processed, total);
        RunOutcome::Completed
    }

    fn build_requests(&self, records: &RecordSet, batch: &[String]) -> Vec<ScoreRequest> {
        batch
            .iter()
            .filter_map(|id| records.get(id))
            .map(|record| ScoreRequest {
                id: record.id().to_string(),
                text: truncate_chars(&record.record.text_clean, self.config.max_text_length)
                    .to_string(),
            })
            .collect()
    }

    fn is_cancelled(&self) -> bool {
        *self.cancel_rx.borrow()
    }

    fn finish_cancelled(&self, processed: usize, total: usize) -> RunOutcome {
        tracing::info!(processed, total, "scoring run cancelled");
        self.publish(RunPhase::Done, processed, total);
        RunOutcome::Cancelled
    }

    fn publish(&self, phase: RunPhase, processed: usize, total: usize) {
        self.progress_tx.send_replace(Progress {
            phase,
            processed,
            total,
        });
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((offset, _)) => &text[..offset],
        None => text,
    }
}
