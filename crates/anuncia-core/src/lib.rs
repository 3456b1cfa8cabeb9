pub mod error;
pub mod export;
pub mod filter;
pub mod ingest;
pub mod pipeline;
pub mod record;
pub mod scoring;

pub use error::{Error, Result};
pub use export::{CsvExporter, ExportError, CSV_COLUMNS};
pub use filter::RecordFilter;
pub use ingest::{IngestError, Ingestor, Normalizer};
pub use pipeline::{Pipeline, RunOutput, RunSummary};
pub use record::{
    DimensionScores, NormalizedRecord, RawRecord, RecordSet, RecordStatus, ScoredRecord,
};
pub use scoring::{
    BatchScheduler, CancelHandle, HttpScoringClient, MergeStats, Progress, ResultMerger,
    RunOutcome, RunPhase, SchedulerConfig, ScoreRequest, ScoreResponse, ScoringClient,
    ScoringConfig, ScoringError,
};
