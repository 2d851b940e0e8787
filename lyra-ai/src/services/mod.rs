//! Leaf services used by the workflow orchestrators

pub mod analyzer_client;
pub mod chunker;
pub mod progress_tracker;
pub mod song_scanner;
pub mod text_cleanup;

pub use analyzer_client::{AnalyzerClient, ChatCompletionClient, LyricAnalyzer};
pub use chunker::{chunk_lines, parse_lyric_lines};
pub use progress_tracker::{ProgressSnapshot, ProgressTracker};
pub use song_scanner::{estimate_batches, SongScanner};
pub use text_cleanup::ClosingPhraseFilter;
