//! Tracing subscriber initialisation
//!
//! Level priority: `RUST_LOG` (if set) → `[logging] level` from TOML → "info".

use crate::config::LoggingConfig;
use crate::{Error, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Build the filter used by [`init_tracing`]
pub fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| Error::Config(format!("Invalid log level '{}': {}", config.level, e))),
    }
}

/// Install the global tracing subscriber
///
/// Logs go to stderr unless `config.file` is set, in which case they are
/// appended to that file without ANSI colouring.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = build_env_filter(config)?;

    let result = match &config.file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    result.map_err(|e| Error::Config(format!("Failed to install tracing subscriber: {}", e)))
}
