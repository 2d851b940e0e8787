//! Per-song unit of work and its lifecycle

use std::fmt;
use std::path::PathBuf;

/// One lyric file awaiting analysis
///
/// Immutable once discovered. `subfolder` is relative to both the input and
/// output roots; an empty path means the root itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongTask {
    /// File name of the lyric file (e.g. `song1.txt`)
    pub song_name: String,
    /// Subfolder relative to the input root (empty for the root)
    pub subfolder: PathBuf,
    /// Absolute or root-relative path of the lyric file
    pub input_path: PathBuf,
    /// Where the analysis will be written
    pub output_path: PathBuf,
}

impl SongTask {
    /// Human label for the containing folder
    pub fn folder_label(&self) -> String {
        if self.subfolder.as_os_str().is_empty() {
            "root".to_string()
        } else {
            self.subfolder.display().to_string()
        }
    }
}

/// Lifecycle of a song task
///
/// `Discovered → Skipped`, or
/// `Discovered → Dispatched → BatchesInFlight → Assembled → Written → ReportedComplete`.
/// Any I/O failure between `Dispatched` and `Written` moves to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SongState {
    Discovered,
    Skipped,
    Dispatched,
    BatchesInFlight,
    Assembled,
    Written,
    ReportedComplete,
    Failed,
}

impl SongState {
    /// Whether `next` is a legal successor of `self`
    pub fn can_transition_to(self, next: SongState) -> bool {
        use SongState::*;
        matches!(
            (self, next),
            (Discovered, Skipped)
                | (Discovered, Dispatched)
                | (Dispatched, Skipped)
                | (Dispatched, BatchesInFlight)
                | (BatchesInFlight, Assembled)
                | (Assembled, Written)
                | (Written, ReportedComplete)
                | (Dispatched, Failed)
                | (BatchesInFlight, Failed)
                | (Assembled, Failed)
        )
    }
}

impl fmt::Display for SongState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SongState::Discovered => "DISCOVERED",
            SongState::Skipped => "SKIPPED",
            SongState::Dispatched => "DISPATCHED",
            SongState::BatchesInFlight => "BATCHES_IN_FLIGHT",
            SongState::Assembled => "ASSEMBLED",
            SongState::Written => "WRITTEN",
            SongState::ReportedComplete => "REPORTED_COMPLETE",
            SongState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}
