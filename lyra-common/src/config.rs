//! Configuration file loading and atomic file writes
//!
//! lyra tools resolve their settings in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! This module owns tier 3: locating and parsing the TOML file. Tiers 1 and 2
//! are handled by each binary's argument parser.
//!
//! A missing TOML file is not an error. The tool continues with compiled
//! defaults and reports that through [`ConfigSource`]. A file that exists but
//! cannot be parsed IS an error.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Directory name under the platform config dir (`~/.config/lyra` on Linux)
pub const CONFIG_DIR_NAME: &str = "lyra";

/// Logging configuration shared by all lyra binaries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Default TOML path for a module: `<config_dir>/lyra/<module>.toml`
///
/// Returns `None` when the platform has no notion of a config directory.
pub fn default_config_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(format!("{}.toml", module_name)))
}

/// Decide which TOML file to read, if any
///
/// An explicit path (from `--config`) is returned as-is so that a missing file
/// surfaces as an error later. The default location is only returned if the
/// file actually exists.
pub fn resolve_config_file(explicit: Option<&Path>, module_name: &str) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    match default_config_path(module_name) {
        Some(path) if path.exists() => Some(path),
        Some(path) => {
            debug!("No config file at {}", path.display());
            None
        }
        None => None,
    }
}

/// Parse a TOML file into `T`
pub fn load_toml_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file {}: {}", path.display(), e)))?;

    toml::from_str(&content).map_err(|source| Error::TomlParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Where a module's TOML settings came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from this file
    File(PathBuf),
    /// No file; compiled defaults. `searched` is the default location, if the
    /// platform has one.
    Defaults { searched: Option<PathBuf> },
}

impl ConfigSource {
    /// Report the source once tracing is up
    ///
    /// Configuration is loaded before the subscriber exists (the log level
    /// lives in the file), so loading itself stays silent.
    pub fn log(&self, module_name: &str) {
        match self {
            ConfigSource::File(path) => {
                info!("Loaded TOML configuration from {}", path.display());
            }
            ConfigSource::Defaults { searched } => {
                warn!(
                    "No TOML config found for {} (looked in {}), using defaults",
                    module_name,
                    searched
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "<no config dir>".to_string())
                );
            }
        }
    }
}

/// Load the module's TOML configuration, falling back to `T::default()`
///
/// - explicit path given and unreadable → error
/// - no explicit path and no default file → defaults, [`ConfigSource::Defaults`]
pub fn load_or_default<T>(explicit: Option<&Path>, module_name: &str) -> Result<(T, ConfigSource)>
where
    T: DeserializeOwned + Default,
{
    match resolve_config_file(explicit, module_name) {
        Some(path) => {
            let config = load_toml_config(&path)?;
            Ok((config, ConfigSource::File(path)))
        }
        None => Ok((
            T::default(),
            ConfigSource::Defaults {
                searched: default_config_path(module_name),
            },
        )),
    }
}

/// Write `contents` to `path` so that readers see either the old file or the
/// complete new file, never a partial write.
///
/// The data goes to a uniquely named temporary file in the target directory,
/// is flushed to disk and then renamed over `path`. Rename within one directory
/// is atomic on the platforms lyra supports. Missing parent directories are
/// created.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".lyra-")
        .suffix(".tmp")
        .tempfile_in(parent)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;

    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    debug!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}
