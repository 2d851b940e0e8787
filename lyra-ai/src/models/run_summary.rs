//! Result of a whole pipeline run

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Final state of one song task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SongOutcome {
    /// Output written; `failed_batches` of `batches` are sentinels
    Completed { batches: usize, failed_batches: usize },
    /// Output already existed when the task started
    Skipped,
    /// Read or write failed; no output written
    Failed { reason: String },
    /// Run cancelled before the output was written
    Cancelled,
}

/// Aggregate counters reported at the end of a run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub songs_discovered: usize,
    pub songs_written: usize,
    pub songs_skipped: usize,
    pub songs_failed: usize,
    pub songs_cancelled: usize,
    pub estimated_batches: usize,
    /// Batches of written songs, including failed ones
    pub processed_batches: usize,
    pub failed_batches: usize,
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
}

impl RunSummary {
    /// Summary for a run that found nothing to do
    pub fn empty(started_at: DateTime<Utc>, elapsed: Duration) -> Self {
        Self {
            started_at,
            finished_at: Utc::now(),
            songs_discovered: 0,
            songs_written: 0,
            songs_skipped: 0,
            songs_failed: 0,
            songs_cancelled: 0,
            estimated_batches: 0,
            processed_batches: 0,
            failed_batches: 0,
            elapsed,
        }
    }

    /// Fold one song's outcome into the counters
    pub fn record(&mut self, outcome: &SongOutcome) {
        match outcome {
            SongOutcome::Completed {
                batches,
                failed_batches,
            } => {
                self.songs_written += 1;
                self.processed_batches += batches;
                self.failed_batches += failed_batches;
            }
            SongOutcome::Skipped => self.songs_skipped += 1,
            SongOutcome::Failed { .. } => self.songs_failed += 1,
            SongOutcome::Cancelled => self.songs_cancelled += 1,
        }
    }

    /// Estimated batches per wall-clock second
    pub fn batches_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.estimated_batches as f64 / secs
        } else {
            0.0
        }
    }

    pub fn was_cancelled(&self) -> bool {
        self.songs_cancelled > 0
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }
}
