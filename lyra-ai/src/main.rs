//! lyra-ai - Batch lyric analysis
//!
//! Reads lyric files from the input tree, analyses them in small batches
//! through an OpenAI-compatible chat completion service, and writes one
//! `<song>_analysis.txt` per song into a mirrored output tree. Songs whose
//! output already exists are skipped, so an interrupted run can simply be
//! restarted.
//!
//! Exit codes: 0 completed, 1 configuration or startup error, 2 input root
//! missing or unreadable, 130 cancelled with Ctrl+C.

use anyhow::{Context, Result};
use clap::Parser;
use lyra_ai::config::{AppConfig, ConfigOverrides, TomlConfig, MODULE_NAME};
use lyra_ai::models::RunSummary;
use lyra_ai::FileOrchestrator;
use lyra_common::config::{load_or_default, write_atomic};
use lyra_common::logging::init_tracing;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const EXIT_CONFIG: u8 = 1;
const EXIT_INPUT_ROOT: u8 = 2;
const EXIT_CANCELLED: u8 = 130;

/// Command-line arguments for lyra-ai
#[derive(Parser, Debug)]
#[command(name = "lyra-ai")]
#[command(about = "Batch Japanese lyric analysis through a chat completion API")]
#[command(version)]
struct Args {
    /// TOML configuration file (default: <config_dir>/lyra/lyra-ai.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Folder containing lyric files, optionally one level of subfolders
    #[arg(short, long, env = "LYRA_INPUT_ROOT")]
    input: Option<PathBuf>,

    /// Folder receiving the analysis files
    #[arg(short, long, env = "LYRA_OUTPUT_ROOT")]
    output: Option<PathBuf>,

    /// Base URL of the chat completion API
    #[arg(long, env = "BASE_URL")]
    endpoint: Option<String>,

    /// API key sent as a bearer token
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model name
    #[arg(long, env = "MODEL_NAME")]
    model: Option<String>,

    /// Lyric lines per request
    #[arg(long, env = "LYRA_BATCH_SIZE")]
    batch_size: Option<usize>,

    /// Songs processed concurrently
    #[arg(long, env = "LYRA_SONG_CONCURRENCY")]
    song_concurrency: Option<usize>,

    /// Requests in flight per song
    #[arg(long, env = "LYRA_BATCH_CONCURRENCY")]
    batch_concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Retries per failed batch before writing an error placeholder
    #[arg(long)]
    max_retries: Option<u32>,

    /// Client-side request limit across all workers (0 = unlimited)
    #[arg(long)]
    requests_per_minute: Option<u32>,

    /// Write the run summary as JSON to this file
    #[arg(long)]
    summary_json: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            input_root: self.input.clone(),
            output_root: self.output.clone(),
            endpoint: self.endpoint.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            batch_size: self.batch_size,
            song_concurrency: self.song_concurrency,
            batch_concurrency: self.batch_concurrency,
            timeout_secs: self.timeout_secs,
            max_retries: self.max_retries,
            requests_per_minute: self.requests_per_minute,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env must be loaded before clap reads the environment
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: failed to load .env: {}", e);
        }
    }

    let args = Args::parse();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_CONFIG)
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let (toml_config, config_source): (TomlConfig, _) =
        load_or_default(args.config.as_deref(), MODULE_NAME)
            .context("Failed to load configuration file")?;

    init_tracing(&toml_config.logging).context("Failed to initialize logging")?;

    info!(
        "Starting lyra-ai v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    config_source.log(MODULE_NAME);

    let config = AppConfig::resolve(args.overrides(), toml_config).context("Invalid configuration")?;

    info!("Input folder: {}", config.pipeline.input_root.display());
    info!("Output folder: {}", config.pipeline.output_root.display());
    info!("Model: {} via {}", config.analyzer.model, config.analyzer.endpoint);
    if config.analyzer.api_key.is_none() {
        warn!("No API key configured, requests will be sent unauthenticated");
    }

    let orchestrator =
        FileOrchestrator::from_config(&config).context("Failed to initialize analyzer client")?;

    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received Ctrl+C, abandoning in-flight songs without writing output");
            watcher.cancel();
        }
    });

    let summary = match orchestrator.run(&cancel).await {
        Ok(summary) => summary,
        Err(e) => {
            error!("{}", e);
            return Ok(ExitCode::from(EXIT_INPUT_ROOT));
        }
    };

    if let Some(path) = &args.summary_json {
        write_summary(path, &summary)?;
        info!("Run summary written to {}", path.display());
    }

    if summary.was_cancelled() {
        warn!(
            "Run cancelled: {} songs written, {} not finished",
            summary.songs_written, summary.songs_cancelled
        );
        return Ok(ExitCode::from(EXIT_CANCELLED));
    }

    Ok(ExitCode::SUCCESS)
}

fn write_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    let json = serde_json::to_vec_pretty(summary).context("Failed to serialize run summary")?;
    write_atomic(path, &json)
        .with_context(|| format!("Failed to write run summary to {}", path.display()))
}
