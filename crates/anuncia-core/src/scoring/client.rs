use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::record::DimensionScores;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Scoring service returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("Invalid scoring response: {0}")]
    InvalidResponse(String),
}

pub type ScoringResult<T> = Result<T, ScoringError>;

/// One record's worth of a batch request: stable id plus the (already
/// truncated) cleaned text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreRequest {
    pub id: String,
    pub text: String,
}

/// One scored item as returned by the service. Missing fields make the
/// whole response undeserializable, which downstream treats as a failed
/// batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub id: String,
    #[serde(flatten)]
    pub scores: DimensionScores,
    pub comentario: String,
}

/// The external quality-scoring capability. One call per batch, no retries.
#[async_trait::async_trait]
pub trait ScoringClient: Send + Sync {
    async fn score_batch(&self, batch: &[ScoreRequest]) -> ScoringResult<Vec<ScoreResponse>>;
}

#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub endpoint: Url,
    pub bearer_token: Option<String>,
    pub request_timeout: Duration,
}

impl ScoringConfig {
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            bearer_token: None,
            request_timeout: Duration::from_secs(60),
        }
    }

    #[must_use]
    pub fn with_bearer_token(mut self, token: String) -> Self {
        self.bearer_token = Some(token);
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// HTTP implementation: POSTs the batch as a JSON list to the configured
/// endpoint and expects a JSON list of scored items back.
pub struct HttpScoringClient {
    config: ScoringConfig,
    inner: reqwest::Client,
}

impl HttpScoringClient {
    pub fn new(config: ScoringConfig) -> ScoringResult<Self> {
        let inner = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { config, inner })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl ScoringClient for HttpScoringClient {
    async fn score_batch(&self, batch: &[ScoreRequest]) -> ScoringResult<Vec<ScoreResponse>> {
        let mut request = self.inner.post(self.config.endpoint.clone()).json(&batch);

        if let Some(ref token) = self.config.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScoringError::Status(status));
        }

        response
            .json::<Vec<ScoreResponse>>()
            .await
            .map_err(|e| ScoringError::InvalidResponse(e.to_string()))
    }
}
