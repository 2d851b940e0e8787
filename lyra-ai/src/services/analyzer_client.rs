//! Analysis service client
//!
//! Two layers:
//! - [`LyricAnalyzer`]: one request for one batch, returning raw completion
//!   text or an [`AnalysisError`]. [`ChatCompletionClient`] implements it
//!   against an OpenAI-compatible `/chat/completions` endpoint; tests plug in
//!   their own implementations.
//! - [`AnalyzerClient`]: what the batch orchestrator calls. Applies retries,
//!   cleans the text, converts failures into sentinels and records the batch
//!   with the progress tracker. It never returns an error.

use crate::config::{AnalyzerConfig, RetryPolicy};
use crate::error::AnalysisError;
use crate::models::{AnalysisResult, Batch};
use crate::prompt::user_message;
use crate::services::progress_tracker::ProgressTracker;
use crate::services::text_cleanup::ClosingPhraseFilter;
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

const USER_AGENT: &str = concat!("lyra-ai/", env!("CARGO_PKG_VERSION"));

/// One request to the analysis service for one batch
#[async_trait]
pub trait LyricAnalyzer: Send + Sync {
    /// Submit the batch and return the raw completion text
    async fn analyze(&self, batch: &Batch) -> Result<String, AnalysisError>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

type DirectRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// OpenAI-compatible chat completion client
pub struct ChatCompletionClient {
    http_client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    model: String,
    system_prompt: String,
    timeout: Duration,
    /// Shared by every worker holding this client
    rate_limiter: Option<DirectRateLimiter>,
}

impl ChatCompletionClient {
    pub fn new(config: &AnalyzerConfig) -> Result<Self, AnalysisError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .connect_timeout(config.timeout.min(Duration::from_secs(10)))
            .build()
            .map_err(|e| AnalysisError::Network(e.to_string()))?;

        let rate_limiter = config
            .requests_per_minute
            .map(|rpm| RateLimiter::direct(Quota::per_minute(rpm)));

        Ok(Self {
            http_client,
            url: format!("{}/chat/completions", config.endpoint.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
            timeout: config.timeout,
            rate_limiter,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn map_transport_error(&self, e: reqwest::Error) -> AnalysisError {
        if e.is_timeout() {
            AnalysisError::Timeout(self.timeout)
        } else {
            AnalysisError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl LyricAnalyzer for ChatCompletionClient {
    async fn analyze(&self, batch: &Batch) -> Result<String, AnalysisError> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        let user_content = user_message(&batch.joined());
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &user_content,
                },
            ],
        };

        debug!(batch = batch.index, lines = batch.len(), url = %self.url, "Sending analysis request");

        let mut request = self.http_client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(AnalysisError::Unauthorized(status.as_u16()));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Api(status.as_u16(), error_text));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                AnalysisError::Timeout(self.timeout)
            } else {
                AnalysisError::Parse(e.to_string())
            }
        })?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(AnalysisError::EmptyResponse)
    }
}

/// Batch-level analyzer used by the orchestrators
///
/// Cheap to clone; clones share the backend (and its rate limiter).
#[derive(Clone)]
pub struct AnalyzerClient {
    backend: Arc<dyn LyricAnalyzer>,
    filter: Arc<ClosingPhraseFilter>,
    retry: RetryPolicy,
}

impl AnalyzerClient {
    pub fn new(backend: Arc<dyn LyricAnalyzer>, filter: ClosingPhraseFilter, retry: RetryPolicy) -> Self {
        Self {
            backend,
            filter: Arc::new(filter),
            retry,
        }
    }

    /// Build the HTTP-backed client from resolved configuration
    pub fn from_config(config: &AnalyzerConfig, retry: RetryPolicy) -> lyra_common::Result<Self> {
        let backend = ChatCompletionClient::new(config)
            .map_err(|e| lyra_common::Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        let filter = ClosingPhraseFilter::new(&config.closing_patterns)
            .map_err(|e| lyra_common::Error::Config(format!("Invalid closing pattern: {}", e)))?;
        Ok(Self::new(Arc::new(backend), filter, retry))
    }

    /// Analyse one batch; always settles to an [`AnalysisResult`]
    ///
    /// Records exactly one batch with `progress`, whatever the outcome.
    pub async fn analyze_batch(
        &self,
        batch: &Batch,
        song_name: &str,
        progress: &ProgressTracker,
        cancel: &CancellationToken,
    ) -> AnalysisResult {
        let outcome = self.analyze_with_retries(batch, song_name, cancel).await;
        progress.record_batch();

        match outcome {
            Ok(text) => AnalysisResult::Analyzed(self.filter.clean(&text)),
            Err(AnalysisError::Cancelled) => {
                debug!(song = %song_name, batch = batch.index, "Batch abandoned on cancellation");
                AnalysisResult::Failed { index: batch.index }
            }
            Err(e) => {
                error!(
                    song = %song_name,
                    batch = batch.index,
                    error = %e,
                    "Error occurred while processing batch {} of {}",
                    batch.index,
                    song_name
                );
                AnalysisResult::Failed { index: batch.index }
            }
        }
    }

    async fn analyze_with_retries(
        &self,
        batch: &Batch,
        song_name: &str,
        cancel: &CancellationToken,
    ) -> Result<String, AnalysisError> {
        let max_attempts = self.retry.max_attempts();
        let mut attempt = 1;

        loop {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(AnalysisError::Cancelled),
                result = self.backend.analyze(batch) => result,
            };

            match outcome {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    warn!(
                        song = %song_name,
                        batch = batch.index,
                        attempt,
                        max_attempts,
                        error = %e,
                        "Batch request failed, retrying in {:?}",
                        self.retry.backoff
                    );
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(AnalysisError::Cancelled),
                        _ = tokio::time::sleep(self.retry.backoff) => {}
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
