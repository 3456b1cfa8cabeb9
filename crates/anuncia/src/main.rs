use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use url::Url;

use anuncia_core::{
    CsvExporter, HttpScoringClient, Pipeline, RecordFilter, RunPhase, SchedulerConfig,
    ScoringConfig,
};

#[derive(Parser)]
#[command(
    name = "anuncia",
    about = "Announcement quality scoring through an external scoring service",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score an announcement dump and export the results as CSV
    Score {
        /// Input file: a JSON array of announcement objects
        #[arg(short, long)]
        input: PathBuf,
        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,
        /// Scoring service endpoint
        #[arg(long)]
        endpoint: Url,
        /// Bearer token for the scoring service
        #[arg(long)]
        token: Option<String>,
        /// Records per scoring request
        #[arg(long, default_value_t = 10)]
        batch_size: usize,
        /// Pause between scoring requests, in milliseconds
        #[arg(long, default_value_t = 5000)]
        delay_ms: u64,
        /// Truncate text sent to the scorer at this many characters
        #[arg(long, default_value_t = 2000)]
        max_text_length: usize,
        /// Keep only records whose title contains this text
        #[arg(long)]
        title: Option<String>,
        /// Keep only records whose community contains this text
        #[arg(long)]
        community: Option<String>,
        /// Keep only records whose author contains this text
        #[arg(long)]
        author: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Score {
            input,
            output,
            endpoint,
            token,
            batch_size,
            delay_ms,
            max_text_length,
            title,
            community,
            author,
        } => {
            let filter = RecordFilter {
                title,
                community,
                author,
            };
            let config = SchedulerConfig::default()
                .with_batch_size(batch_size)
                .with_inter_batch_delay(Duration::from_millis(delay_ms))
                .with_max_text_length(max_text_length);

            run_score(&input, &output, endpoint, token, config, &filter).await
        }
    }
}

async fn run_score(
    input: &Path,
    output: &Path,
    endpoint: Url,
    token: Option<String>,
    config: SchedulerConfig,
    filter: &RecordFilter,
) -> Result<()> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("reading input file {}", input.display()))?;

    let mut scoring_config = ScoringConfig::new(endpoint);
    if let Some(token) = token {
        scoring_config = scoring_config.with_bearer_token(token);
    }
    let client = HttpScoringClient::new(scoring_config).context("building scoring client")?;

    let mut pipeline = Pipeline::with_config(config, Arc::new(client));

    let cancel = pipeline.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling after current batch");
            cancel.cancel();
        }
    });

    let mut progress = pipeline.subscribe();
    tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let snapshot = *progress.borrow();
            if let RunPhase::Scoring(batch) = snapshot.phase {
                tracing::info!(
                    batch,
                    processed = snapshot.processed,
                    total = snapshot.total,
                    "scoring"
                );
            }
        }
    });

    let result = pipeline.run(&content).await?;

    let filtered = filter.apply(&result.records);
    let exported = filtered.len();
    let csv_text = CsvExporter::export(filtered.into_iter())?;
    std::fs::write(output, csv_text)
        .with_context(|| format!("writing output file {}", output.display()))?;

    tracing::info!(
        total = result.summary.total,
        scored = result.summary.scored,
        failed = result.summary.failed,
        pending = result.summary.pending,
        cancelled = result.summary.cancelled,
        exported,
        duration_ms = result.summary.duration_ms,
        "done"
    );

    Ok(())
}
