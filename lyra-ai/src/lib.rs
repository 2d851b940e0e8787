//! # lyra-ai Library
//!
//! Batch lyric analysis: reads lyric files, sends them to an OpenAI-compatible
//! chat completion service in small batches, and writes one analysis file per
//! song. Library target for integration tests; the binary lives in `main.rs`.

pub mod config;
pub mod error;
pub mod models;
pub mod prompt;
pub mod services;
pub mod workflow;

pub use config::{AppConfig, ConfigOverrides, TomlConfig};
pub use error::{AnalysisError, DiscoveryError, SongError};
pub use workflow::FileOrchestrator;
