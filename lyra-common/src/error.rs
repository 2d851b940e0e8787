//! Common error types for lyra

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for lyra operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by lyra crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML file could not be parsed
    #[error("Failed to parse {path}: {source}")]
    TomlParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
