//! Configuration resolution for lyra-ai
//!
//! **Priority:** CLI → ENV → TOML → compiled default
//!
//! CLI and ENV arrive together in [`ConfigOverrides`] (the argument parser reads
//! both). The TOML layer is [`TomlConfig`]. [`AppConfig::resolve`] merges them
//! once at startup; the result is passed by reference into the analyzer client
//! and both orchestrators. Nothing here is global.

use crate::prompt::{DEFAULT_CLOSING_PATTERNS, DEFAULT_SYSTEM_PROMPT};
use lyra_common::config::LoggingConfig;
use lyra_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Module name used for the TOML file (`<config_dir>/lyra/lyra-ai.toml`)
pub const MODULE_NAME: &str = "lyra-ai";

pub const DEFAULT_INPUT_ROOT: &str = "original_song";
pub const DEFAULT_OUTPUT_ROOT: &str = "output";
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-5";
pub const DEFAULT_BATCH_SIZE: usize = 4;
pub const DEFAULT_SONG_CONCURRENCY: usize = 4;
pub const DEFAULT_BATCH_CONCURRENCY: usize = 4;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MAX_RETRIES: u32 = 0;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 2000;
pub const OUTPUT_SUFFIX: &str = "_analysis";

/// `lyra-ai.toml` contents. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_root: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_root: Option<PathBuf>,

    #[serde(default)]
    pub analyzer: AnalyzerToml,

    #[serde(default)]
    pub pipeline: PipelineToml,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[analyzer]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzerToml {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
    pub requests_per_minute: Option<u32>,
    /// File whose contents replace the built-in system prompt
    pub system_prompt_file: Option<PathBuf>,
    pub closing_patterns: Option<Vec<String>>,
}

/// `[pipeline]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineToml {
    pub batch_size: Option<usize>,
    pub song_concurrency: Option<usize>,
    pub batch_concurrency: Option<usize>,
    pub max_retries: Option<u32>,
    pub retry_backoff_ms: Option<u64>,
    pub extensions: Option<Vec<String>>,
}

/// Values supplied on the command line or through environment variables
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub input_root: Option<PathBuf>,
    pub output_root: Option<PathBuf>,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub batch_size: Option<usize>,
    pub song_concurrency: Option<usize>,
    pub batch_concurrency: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub requests_per_minute: Option<u32>,
}

/// Settings for the outbound analysis service
#[derive(Clone)]
pub struct AnalyzerConfig {
    /// Base URL; `/chat/completions` is appended
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Client-side limit across all workers; `None` = unlimited
    pub requests_per_minute: Option<NonZeroU32>,
    pub system_prompt: String,
    pub closing_patterns: Vec<String>,
}

impl std::fmt::Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyzerConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("requests_per_minute", &self.requests_per_minute)
            .field("system_prompt_len", &self.system_prompt.len())
            .field("closing_patterns", &self.closing_patterns)
            .finish()
    }
}

/// How many times a failed batch is re-sent before becoming a sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
        }
    }
}

/// Settings for discovery and both worker pools
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    /// Lines per batch
    pub batch_size: usize,
    /// Outer pool: songs in flight
    pub song_concurrency: usize,
    /// Inner pool: batches in flight per song
    pub batch_concurrency: usize,
    pub retry: RetryPolicy,
    /// Lyric file extensions, lowercase, without the dot
    pub extensions: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_root: PathBuf::from(DEFAULT_INPUT_ROOT),
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            batch_size: DEFAULT_BATCH_SIZE,
            song_concurrency: DEFAULT_SONG_CONCURRENCY,
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
            retry: RetryPolicy::default(),
            extensions: vec!["txt".to_string()],
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".to_string()));
        }
        if self.song_concurrency == 0 {
            return Err(Error::Config("song_concurrency must be at least 1".to_string()));
        }
        if self.batch_concurrency == 0 {
            return Err(Error::Config("batch_concurrency must be at least 1".to_string()));
        }
        if self.extensions.is_empty() {
            return Err(Error::Config("at least one lyric file extension is required".to_string()));
        }
        Ok(())
    }
}

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub analyzer: AnalyzerConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Merge CLI/ENV overrides over TOML values over compiled defaults
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if a system prompt file cannot be read, a
    /// closing pattern is not a valid regex, or a numeric setting is zero.
    pub fn resolve(overrides: ConfigOverrides, toml: TomlConfig) -> Result<Self> {
        let TomlConfig {
            input_root,
            output_root,
            analyzer,
            pipeline,
            logging,
        } = toml;

        let system_prompt = match &analyzer.system_prompt_file {
            Some(path) => {
                let prompt = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("Failed to read system prompt {}: {}", path.display(), e))
                })?;
                info!("System prompt loaded from {}", path.display());
                prompt
            }
            None => DEFAULT_SYSTEM_PROMPT.to_string(),
        };

        let closing_patterns = analyzer.closing_patterns.unwrap_or_else(|| {
            DEFAULT_CLOSING_PATTERNS.iter().map(|p| p.to_string()).collect()
        });

        let requests_per_minute = overrides
            .requests_per_minute
            .or(analyzer.requests_per_minute)
            .and_then(NonZeroU32::new);

        let analyzer = AnalyzerConfig {
            endpoint: overrides
                .endpoint
                .or(analyzer.endpoint)
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            api_key: overrides
                .api_key
                .or(analyzer.api_key)
                .filter(|k| !k.trim().is_empty()),
            model: overrides
                .model
                .or(analyzer.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout: Duration::from_secs(
                overrides
                    .timeout_secs
                    .or(analyzer.timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            requests_per_minute,
            system_prompt,
            closing_patterns,
        };

        let extensions = pipeline
            .extensions
            .unwrap_or_else(|| vec!["txt".to_string()])
            .into_iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        let pipeline = PipelineConfig {
            input_root: overrides
                .input_root
                .or(input_root)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_ROOT)),
            output_root: overrides
                .output_root
                .or(output_root)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_ROOT)),
            batch_size: overrides
                .batch_size
                .or(pipeline.batch_size)
                .unwrap_or(DEFAULT_BATCH_SIZE),
            song_concurrency: overrides
                .song_concurrency
                .or(pipeline.song_concurrency)
                .unwrap_or(DEFAULT_SONG_CONCURRENCY),
            batch_concurrency: overrides
                .batch_concurrency
                .or(pipeline.batch_concurrency)
                .unwrap_or(DEFAULT_BATCH_CONCURRENCY),
            retry: RetryPolicy {
                max_retries: overrides
                    .max_retries
                    .or(pipeline.max_retries)
                    .unwrap_or(DEFAULT_MAX_RETRIES),
                backoff: Duration::from_millis(
                    pipeline.retry_backoff_ms.unwrap_or(DEFAULT_RETRY_BACKOFF_MS),
                ),
            },
            extensions,
        };

        let config = Self {
            analyzer,
            pipeline,
            logging,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.pipeline.validate()?;

        if self.analyzer.endpoint.trim().is_empty() {
            return Err(Error::Config("analyzer endpoint must not be empty".to_string()));
        }
        if self.analyzer.model.trim().is_empty() {
            return Err(Error::Config("analyzer model must not be empty".to_string()));
        }
        if self.analyzer.timeout.is_zero() {
            return Err(Error::Config("analyzer timeout must be at least 1 second".to_string()));
        }
        for pattern in &self.analyzer.closing_patterns {
            regex::Regex::new(pattern).map_err(|e| {
                Error::Config(format!("Invalid closing pattern '{}': {}", pattern, e))
            })?;
        }
        Ok(())
    }
}
