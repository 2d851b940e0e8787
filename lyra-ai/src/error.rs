//! Error types for lyra-ai
//!
//! Each pipeline boundary has its own error enum, and each is recovered at a
//! different level:
//! - [`AnalysisError`] never leaves the analyzer client; it becomes a failure
//!   sentinel in the song's output.
//! - [`SongError`] stops one song; sibling songs continue.
//! - [`DiscoveryError`] on the input root is the only error that ends a run.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure of one request to the analysis service
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Connection, DNS or TLS failure
    #[error("Network error: {0}")]
    Network(String),

    /// No response within the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Credential missing or rejected (401/403)
    #[error("Authentication rejected (HTTP {0})")]
    Unauthorized(u16),

    /// Any other non-success status
    #[error("API error {0}: {1}")]
    Api(u16, String),

    /// Response body was not a chat completion
    #[error("Parse error: {0}")]
    Parse(String),

    /// Response parsed but carried no completion text
    #[error("Response contained no completion")]
    EmptyResponse,

    /// Run was cancelled while the request was in flight
    #[error("Cancelled")]
    Cancelled,
}

impl AnalysisError {
    /// Whether another attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            AnalysisError::Network(_) | AnalysisError::Timeout(_) | AnalysisError::EmptyResponse => {
                true
            }
            AnalysisError::Api(status, _) => *status == 429 || *status >= 500,
            AnalysisError::Unauthorized(_) | AnalysisError::Parse(_) | AnalysisError::Cancelled => {
                false
            }
        }
    }
}

/// Failure that aborts a single song
#[derive(Debug, Error)]
pub enum SongError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: lyra_common::Error,
    },

    #[error("Cancelled before output was written")]
    Cancelled,
}

/// Failure while enumerating the input tree
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Input folder not found: {0}")]
    RootNotFound(PathBuf),

    #[error("Input path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Cannot read {0}: {1}")]
    Unreadable(PathBuf, String),

    /// The blocking scan task panicked or was cancelled
    #[error("Scan task failed: {0}")]
    ScanTask(String),
}
