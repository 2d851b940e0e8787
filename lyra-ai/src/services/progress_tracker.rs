//! Thread-safe progress tracking for a pipeline run
//!
//! All counters live behind one mutex. Each update increments, derives
//! throughput/ETA and emits its log line while holding the lock, so lines from
//! concurrent workers never interleave and no increment is lost.

use lyra_common::human_time::format_duration_secs;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug)]
struct ProgressState {
    processed_batches: usize,
    processed_files: usize,
    total_batches: usize,
    total_files: usize,
}

/// Point-in-time copy of the tracker's counters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    pub processed_batches: usize,
    pub processed_files: usize,
    pub total_batches: usize,
    pub total_files: usize,
    pub elapsed: Duration,
}

impl ProgressSnapshot {
    /// Batches done as a percentage of the estimate (may exceed 100)
    pub fn percent(&self) -> f64 {
        if self.total_batches == 0 {
            return 0.0;
        }
        self.processed_batches as f64 / self.total_batches as f64 * 100.0
    }

    /// Batches per second since the tracker was created
    pub fn batches_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.processed_batches as f64 / secs
        } else {
            0.0
        }
    }

    /// Seconds until the estimated total is reached; 0 with no throughput yet
    pub fn eta_secs(&self) -> f64 {
        let rate = self.batches_per_second();
        if rate > 0.0 {
            let remaining = self.total_batches.saturating_sub(self.processed_batches);
            remaining as f64 / rate
        } else {
            0.0
        }
    }
}

/// Progress counters shared by every worker in a run
#[derive(Debug)]
pub struct ProgressTracker {
    state: Mutex<ProgressState>,
    started: Instant,
}

impl ProgressTracker {
    /// `total_batches` is an estimate; it only affects the displayed
    /// percentage and ETA.
    pub fn new(total_files: usize, total_batches: usize) -> Self {
        Self {
            state: Mutex::new(ProgressState {
                processed_batches: 0,
                processed_files: 0,
                total_batches,
                total_files,
            }),
            started: Instant::now(),
        }
    }

    /// Count one settled batch (success or failure) and log progress
    pub fn record_batch(&self) {
        let mut state = self.lock();
        state.processed_batches += 1;

        let snapshot = self.snapshot_of(&state);
        info!(
            processed = snapshot.processed_batches,
            total = snapshot.total_batches,
            "Progress: {}/{} batches ({:.1}%) - ETA: {}",
            snapshot.processed_batches,
            snapshot.total_batches,
            snapshot.percent(),
            format_duration_secs(snapshot.eta_secs())
        );
    }

    /// Count one written song and log its completion
    pub fn record_file(&self, name: &str) {
        let mut state = self.lock();
        state.processed_files += 1;

        info!(
            song = %name,
            "✓ Completed {} ({}/{} files)",
            name,
            state.processed_files,
            state.total_files
        );
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let state = self.lock();
        self.snapshot_of(&state)
    }

    fn snapshot_of(&self, state: &ProgressState) -> ProgressSnapshot {
        ProgressSnapshot {
            processed_batches: state.processed_batches,
            processed_files: state.processed_files,
            total_batches: state.total_batches,
            total_files: state.total_files,
            elapsed: self.started.elapsed(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ProgressState> {
        // Counters stay consistent even if a logging call panicked mid-update
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
