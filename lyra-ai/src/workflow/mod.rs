//! Two-level worker pools: songs, then batches within a song

pub mod batch_orchestrator;
pub mod file_orchestrator;

pub use batch_orchestrator::{assemble, BatchOrchestrator, SongAnalysis, BATCH_SEPARATOR};
pub use file_orchestrator::FileOrchestrator;
