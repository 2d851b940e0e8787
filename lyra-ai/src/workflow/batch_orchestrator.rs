//! Per-song batch orchestration
//!
//! Runs one song's batches through the analyzer with at most
//! `batch_concurrency` requests in flight, then reassembles the results by
//! batch index. Completion order never affects the output.

use crate::error::SongError;
use crate::models::{AnalysisResult, Batch};
use crate::services::{AnalyzerClient, ProgressTracker};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Separator written after every batch's text
pub const BATCH_SEPARATOR: &str = "\n\n";

/// Assembled output of one song
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongAnalysis {
    pub text: String,
    pub batches: usize,
    pub failed_batches: usize,
}

/// Inner worker pool: one song, many batches
#[derive(Clone)]
pub struct BatchOrchestrator {
    client: AnalyzerClient,
    concurrency: usize,
}

impl BatchOrchestrator {
    pub fn new(client: AnalyzerClient, concurrency: usize) -> Self {
        Self {
            client,
            concurrency: concurrency.max(1),
        }
    }

    /// Analyse every batch of one song and return the assembled text
    ///
    /// A failed batch appears as its sentinel in the correct position. The only
    /// error is cancellation, in which case nothing should be written.
    pub async fn process_song(
        &self,
        song_name: &str,
        batches: Vec<Batch>,
        progress: &ProgressTracker,
        cancel: &CancellationToken,
    ) -> Result<SongAnalysis, SongError> {
        let batch_count = batches.len();
        debug!(song = %song_name, batch_count, concurrency = self.concurrency, "Dispatching batches");

        let completed: Vec<(usize, AnalysisResult)> = stream::iter(batches)
            .map(|batch| async move {
                let result = self
                    .client
                    .analyze_batch(&batch, song_name, progress, cancel)
                    .await;
                (batch.index, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        if cancel.is_cancelled() {
            return Err(SongError::Cancelled);
        }

        let failed_batches = completed.iter().filter(|(_, r)| r.is_failure()).count();
        let results: HashMap<usize, AnalysisResult> = completed.into_iter().collect();
        Ok(SongAnalysis {
            text: assemble(results, batch_count),
            batches: batch_count,
            failed_batches,
        })
    }
}

/// Concatenate results for indices `1..=batch_count`, each followed by a blank
/// line
///
/// A missing index is rendered as that batch's failure sentinel.
pub fn assemble(mut results: HashMap<usize, AnalysisResult>, batch_count: usize) -> String {
    let mut output = String::new();
    for index in 1..=batch_count {
        let text = results
            .remove(&index)
            .unwrap_or(AnalysisResult::Failed { index })
            .into_text();
        output.push_str(&text);
        output.push_str(BATCH_SEPARATOR);
    }
    output
}
