//! Data models for the lyric analysis pipeline

pub mod batch;
pub mod run_summary;
pub mod song_task;

pub use batch::{AnalysisResult, Batch};
pub use run_summary::{RunSummary, SongOutcome};
pub use song_task::{SongState, SongTask};
