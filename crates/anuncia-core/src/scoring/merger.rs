use std::collections::{HashMap, HashSet};

use super::client::{ScoreResponse, ScoringResult};
use crate::record::RecordSet;

/// Per-batch merge tally, accumulated into the run summary.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeStats {
    pub scored: usize,
    pub failed: usize,
}

/// Reconciles one batch's scoring outcome with the shared record
/// collection. The merger is the only writer of terminal statuses; each id
/// belongs to exactly one batch, so each is updated at most once per run.
pub struct ResultMerger;

impl ResultMerger {
    /// Applies a batch outcome. A transport error, a non-parseable body, or
    /// any schema violation fails the entire batch; other batches are
    /// unaffected.
    pub fn apply(
        records: &mut RecordSet,
        batch_ids: &[String],
        outcome: ScoringResult<Vec<ScoreResponse>>,
    ) -> MergeStats {
        match outcome {
            Ok(items) => match Self::validate(batch_ids, &items) {
                Ok(by_id) => Self::apply_scores(records, batch_ids, &by_id),
                Err(reason) => {
                    tracing::warn!(%reason, "scoring response rejected, failing batch");
                    Self::fail_batch(records, batch_ids)
                }
            },
            Err(error) => {
                tracing::warn!(%error, "batch scoring failed");
                Self::fail_batch(records, batch_ids)
            }
        }
    }

    /// Strict all-or-nothing validation: every response id must have been
    /// requested, appear at most once, and carry in-range dimensions.
    fn validate<'a>(
        batch_ids: &[String],
        items: &'a [ScoreResponse],
    ) -> Result<HashMap<&'a str, &'a ScoreResponse>, String> {
        let requested: HashSet<&str> = batch_ids.iter().map(String::as_str).collect();
        let mut by_id = HashMap::with_capacity(items.len());

        for item in items {
            if !requested.contains(item.id.as_str()) {
                return Err(format!("response id {} was not requested", item.id));
            }
            if !item.scores.in_range() {
                return Err(format!("dimension score out of range for id {}", item.id));
            }
            if by_id.insert(item.id.as_str(), item).is_some() {
                return Err(format!("duplicate response id {}", item.id));
            }
        }

        Ok(by_id)
    }

    fn apply_scores(
        records: &mut RecordSet,
        batch_ids: &[String],
        by_id: &HashMap<&str, &ScoreResponse>,
    ) -> MergeStats {
        let mut stats = MergeStats::default();

        for id in batch_ids {
            let Some(record) = records.get_mut(id) else {
                tracing::warn!(%id, "batch id missing from record set");
                continue;
            };

            match by_id.get(id.as_str()) {
                Some(item) => {
                    if record.mark_scored(item.scores, item.comentario.clone()) {
                        stats.scored += 1;
                    }
                }
                None => {
                    if record.mark_failed() {
                        stats.failed += 1;
                    }
                }
            }
        }

        stats
    }

    fn fail_batch(records: &mut RecordSet, batch_ids: &[String]) -> MergeStats {
        let mut stats = MergeStats::default();

        for id in batch_ids {
            if let Some(record) = records.get_mut(id) {
                if record.mark_failed() {
                    stats.failed += 1;
                }
            }
        }

        stats
    }
}
