use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Pending,
    Scored,
    Failed,
}

impl RecordStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Scored => "scored",
            Self::Failed => "failed",
        }
    }

    /// Scored and Failed are terminal; a record never leaves them.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Scored | Self::Failed)
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecordStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "scored" => Ok(Self::Scored),
            "failed" => Ok(Self::Failed),
            _ => Err(crate::Error::InvalidStatus(s.to_string())),
        }
    }
}

/// An announcement as it appears in the uploaded dump: every field optional,
/// identifier and author buried inside nested wrappers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub id: Option<String>,
    pub title: Option<String>,
    pub community: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
}

impl RawRecord {
    /// Extracts a record from one array element. Non-objects yield `None`;
    /// fields with unexpected types are treated as absent.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;

        let id = obj
            .get("_id")
            .and_then(|v| v.get("$oid"))
            .and_then(Value::as_str)
            .map(String::from);
        let author = obj
            .get("author")
            .and_then(|v| v.get("name"))
            .and_then(Value::as_str)
            .map(String::from);

        let field = |name: &str| obj.get(name).and_then(Value::as_str).map(String::from);

        Some(Self {
            id,
            title: field("title"),
            community: field("community"),
            author,
            description: field("description"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub id: String,
    pub title: String,
    pub community: String,
    pub author: String,
    pub text_clean: String,
    pub word_count: usize,
}

/// The six ratings returned by the external scorer, each in `[0, 10]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionScores {
    pub clareza: f64,
    pub empatia: f64,
    pub coerencia: f64,
    pub formalidade: f64,
    pub eficacia: f64,
    pub linguistica: f64,
}

impl DimensionScores {
    const WEIGHTS: [f64; 6] = [0.20, 0.20, 0.20, 0.15, 0.15, 0.10];

    #[must_use]
    pub fn values(&self) -> [f64; 6] {
        [
            self.clareza,
            self.empatia,
            self.coerencia,
            self.formalidade,
            self.eficacia,
            self.linguistica,
        ]
    }

    #[must_use]
    pub fn in_range(&self) -> bool {
        self.values().iter().all(|v| (0.0..=10.0).contains(v))
    }

    /// Fixed-weight aggregate, rounded to 2 decimal places.
    #[must_use]
    pub fn weighted_total(&self) -> f64 {
        let total: f64 = self
            .values()
            .iter()
            .zip(Self::WEIGHTS.iter())
            .map(|(value, weight)| value * weight)
            .sum();
        (total * 100.0).round() / 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub record: NormalizedRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<DimensionScores>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comentario: Option<String>,
    pub status: RecordStatus,
}

impl ScoredRecord {
    #[must_use]
    pub fn pending(record: NormalizedRecord) -> Self {
        Self {
            record,
            scores: None,
            quality_score: None,
            comentario: None,
            status: RecordStatus::Pending,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.record.id
    }

    /// Applies the scorer's result and moves the record to `Scored`.
    /// Returns `false` without touching the record if it is already terminal.
    pub fn mark_scored(&mut self, scores: DimensionScores, comentario: String) -> bool {
        if self.status.is_terminal() {
            tracing::warn!(id = %self.record.id, status = %self.status, "refusing to rescore terminal record");
            return false;
        }
        self.quality_score = Some(scores.weighted_total());
        self.scores = Some(scores);
        self.comentario = Some(comentario);
        self.status = RecordStatus::Scored;
        true
    }

    /// Moves the record to `Failed` with a zero quality score and no
    /// dimension scores. Returns `false` if the record is already terminal.
    pub fn mark_failed(&mut self) -> bool {
        if self.status.is_terminal() {
            tracing::warn!(id = %self.record.id, status = %self.status, "refusing to fail terminal record");
            return false;
        }
        self.scores = None;
        self.comentario = None;
        self.quality_score = Some(0.0);
        self.status = RecordStatus::Failed;
        true
    }
}

/// Ordered, id-indexed record collection. Insertion order is the canonical
/// order for display and export; it only grows at ingestion and mutates
/// per-id when batch results are merged.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: Vec<ScoredRecord>,
    index: HashMap<String, usize>,
}

impl RecordSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_normalized(records: Vec<NormalizedRecord>) -> Self {
        let mut set = Self::new();
        for record in records {
            set.push(ScoredRecord::pending(record));
        }
        set
    }

    pub fn push(&mut self, record: ScoredRecord) {
        debug_assert!(
            !self.index.contains_key(record.id()),
            "duplicate record id in set"
        );
        self.index.insert(record.id().to_string(), self.records.len());
        self.records.push(record);
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ScoredRecord> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ScoredRecord> {
        self.index.get(id).map(|&i| &mut self.records[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoredRecord> {
        self.records.iter()
    }

    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.records.iter().map(|r| r.record.id.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn count_with_status(&self, status: RecordStatus) -> usize {
        self.records.iter().filter(|r| r.status == status).count()
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a ScoredRecord;
    type IntoIter = std::slice::Iter<'a, ScoredRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
