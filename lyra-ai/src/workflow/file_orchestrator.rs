//! Run-level orchestration
//!
//! Discovers pending songs, then drives them through an outer worker pool of
//! `song_concurrency` songs. Each song gets a fresh inner pool from the
//! [`BatchOrchestrator`]. One song failing never affects its siblings; only a
//! missing or unreadable input root ends the run.

use crate::config::{AppConfig, PipelineConfig};
use crate::error::{DiscoveryError, SongError};
use crate::models::{RunSummary, SongOutcome, SongState, SongTask};
use crate::services::{
    chunk_lines, estimate_batches, parse_lyric_lines, AnalyzerClient, ProgressTracker, SongScanner,
};
use crate::workflow::batch_orchestrator::{BatchOrchestrator, SongAnalysis};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use lyra_common::config::write_atomic;
use lyra_common::human_time::format_duration_secs;
use std::path::PathBuf;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Lifecycle bookkeeping for one task, logged at debug level
struct Lifecycle<'a> {
    song: &'a str,
    state: SongState,
}

impl<'a> Lifecycle<'a> {
    fn new(song: &'a str) -> Self {
        Self {
            song,
            state: SongState::Discovered,
        }
    }

    fn advance(&mut self, next: SongState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {} for {}",
            self.state,
            next,
            self.song
        );
        debug!(song = %self.song, from = %self.state, to = %next, "Song state change");
        self.state = next;
    }
}

/// Outer worker pool over all pending songs
pub struct FileOrchestrator {
    config: PipelineConfig,
    scanner: SongScanner,
    batches: BatchOrchestrator,
}

impl FileOrchestrator {
    pub fn new(config: PipelineConfig, client: AnalyzerClient) -> Self {
        let scanner = SongScanner::new(
            config.input_root.clone(),
            config.output_root.clone(),
            config.extensions.clone(),
        );
        let batches = BatchOrchestrator::new(client, config.batch_concurrency);
        Self {
            config,
            scanner,
            batches,
        }
    }

    /// Build the HTTP-backed orchestrator from resolved configuration
    pub fn from_config(config: &AppConfig) -> lyra_common::Result<Self> {
        let client = AnalyzerClient::from_config(&config.analyzer, config.pipeline.retry)?;
        Ok(Self::new(config.pipeline.clone(), client))
    }

    /// Pending songs, in scan order
    pub fn discover(&self) -> Result<Vec<SongTask>, DiscoveryError> {
        self.scanner.discover()
    }

    /// Discover pending songs and estimate their batch total on the blocking
    /// pool
    async fn scan(&self) -> Result<(Vec<SongTask>, usize), DiscoveryError> {
        let scanner = self.scanner.clone();
        let batch_size = self.config.batch_size;

        tokio::task::spawn_blocking(move || -> Result<(Vec<SongTask>, usize), DiscoveryError> {
            let tasks = scanner.discover()?;
            let estimated = tasks
                .iter()
                .map(|task| estimate_batches(&task.input_path, batch_size))
                .sum();
            Ok((tasks, estimated))
        })
        .await
        .map_err(|e| DiscoveryError::ScanTask(e.to_string()))?
    }

    /// Process every pending song and report what happened
    ///
    /// # Errors
    ///
    /// Only when the input root itself is missing, not a directory, or
    /// unreadable. Per-song failures are counted in the summary instead.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<RunSummary, DiscoveryError> {
        let started_at = Utc::now();
        let start = Instant::now();

        let (tasks, estimated_batches) = self.scan().await?;
        if tasks.is_empty() {
            info!("No new songs to process!");
            return Ok(RunSummary::empty(started_at, start.elapsed()));
        }

        info!(
            songs = tasks.len(),
            estimated_batches,
            "Found {} songs to process, estimated {} total batches",
            tasks.len(),
            estimated_batches
        );
        info!(
            song_concurrency = self.config.song_concurrency,
            batch_concurrency = self.config.batch_concurrency,
            batch_size = self.config.batch_size,
            "Using {} song workers and {} batch workers per song",
            self.config.song_concurrency,
            self.config.batch_concurrency
        );

        let progress = ProgressTracker::new(tasks.len(), estimated_batches);
        let progress = &progress;

        let outcomes: Vec<SongOutcome> = stream::iter(tasks.iter())
            .map(|task| async move { self.process_task(task, progress, cancel).await })
            .buffer_unordered(self.config.song_concurrency)
            .collect()
            .await;

        let mut summary = RunSummary::empty(started_at, start.elapsed());
        summary.songs_discovered = tasks.len();
        summary.estimated_batches = estimated_batches;
        for outcome in &outcomes {
            summary.record(outcome);
        }

        info!(
            written = summary.songs_written,
            skipped = summary.songs_skipped,
            failed = summary.songs_failed,
            cancelled = summary.songs_cancelled,
            "All songs processed! Total time: {}",
            format_duration_secs(summary.elapsed.as_secs_f64())
        );
        info!("Average speed: {:.1} batches/second", summary.batches_per_second());
        if summary.failed_batches > 0 {
            warn!(
                "{} batches failed and were written as error placeholders",
                summary.failed_batches
            );
        }

        Ok(summary)
    }

    /// Settle one song; never returns an error
    async fn process_task(
        &self,
        task: &SongTask,
        progress: &ProgressTracker,
        cancel: &CancellationToken,
    ) -> SongOutcome {
        let mut lifecycle = Lifecycle::new(&task.song_name);

        if cancel.is_cancelled() {
            debug!(song = %task.song_name, "Not started, run cancelled");
            return SongOutcome::Cancelled;
        }

        // Another run may have produced it since discovery
        let output_exists = tokio::fs::try_exists(&task.output_path)
            .await
            .unwrap_or(false);
        if output_exists {
            lifecycle.advance(SongState::Skipped);
            info!(
                song = %task.song_name,
                "Skipping {}/{} (already processed)",
                task.folder_label(),
                task.song_name
            );
            return SongOutcome::Skipped;
        }

        lifecycle.advance(SongState::Dispatched);
        info!(
            song = %task.song_name,
            "Processing {} in {}...",
            task.song_name,
            task.folder_label()
        );
        match self.analyze_and_write(task, progress, cancel, &mut lifecycle).await {
            Ok(analysis) => {
                lifecycle.advance(SongState::ReportedComplete);
                info!(
                    song = %task.song_name,
                    batches = analysis.batches,
                    failed_batches = analysis.failed_batches,
                    "Completed {}/{}",
                    task.folder_label(),
                    task.song_name
                );
                SongOutcome::Completed {
                    batches: analysis.batches,
                    failed_batches: analysis.failed_batches,
                }
            }
            Err(SongError::Cancelled) => {
                warn!(song = %task.song_name, "Cancelled {}, no output written", task.song_name);
                SongOutcome::Cancelled
            }
            Err(e) => {
                lifecycle.advance(SongState::Failed);
                error!(
                    song = %task.song_name,
                    error = %e,
                    "Error processing {}/{}: {}",
                    task.folder_label(),
                    task.song_name,
                    e
                );
                SongOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn analyze_and_write(
        &self,
        task: &SongTask,
        progress: &ProgressTracker,
        cancel: &CancellationToken,
        lifecycle: &mut Lifecycle<'_>,
    ) -> Result<SongAnalysis, SongError> {
        let content = tokio::fs::read_to_string(&task.input_path)
            .await
            .map_err(|source| SongError::Read {
                path: task.input_path.clone(),
                source,
            })?;

        let lines = parse_lyric_lines(&content);
        let batches = chunk_lines(&lines, self.config.batch_size);
        debug!(
            song = %task.song_name,
            lines = lines.len(),
            batches = batches.len(),
            "Lyrics chunked"
        );

        lifecycle.advance(SongState::BatchesInFlight);
        let analysis = self
            .batches
            .process_song(&task.song_name, batches, progress, cancel)
            .await?;
        lifecycle.advance(SongState::Assembled);

        write_output(task.output_path.clone(), analysis.text.clone()).await?;
        lifecycle.advance(SongState::Written);

        progress.record_file(&task.song_name);
        Ok(analysis)
    }
}

/// Atomic write on the blocking pool; parent directories are created
async fn write_output(path: PathBuf, text: String) -> Result<(), SongError> {
    let target = path.clone();
    let outcome = tokio::task::spawn_blocking(move || write_atomic(&target, text.as_bytes())).await;

    match outcome {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(SongError::Write { path, source }),
        Err(join_error) => Err(SongError::Write {
            path,
            source: lyra_common::Error::Io(std::io::Error::other(join_error.to_string())),
        }),
    }
}
