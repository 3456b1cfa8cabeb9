mod client;
mod merger;
mod scheduler;

pub use client::{
    HttpScoringClient, ScoreRequest, ScoreResponse, ScoringClient, ScoringConfig, ScoringError,
    ScoringResult,
};
pub use merger::{MergeStats, ResultMerger};
pub use scheduler::{
    BatchScheduler, CancelHandle, Progress, RunOutcome, RunPhase, SchedulerConfig,
};
