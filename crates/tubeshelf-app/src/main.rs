//! Tubeshelf - headless driver for the playlist library.
//!
//! Enriches a playlist catalog through the YouTube Data API, or imports a
//! spreadsheet export, and prints the resulting library with the default
//! selection marked.

mod commands;
mod error;
mod logging;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{debug, error, info};
use tubeshelf_core::{API_KEY_ENV, AppConfig};

use crate::commands::OutputFormat;
use crate::error::AppError;
use crate::logging::LoggingConfig;

#[derive(Parser)]
#[command(name = "tubeshelf", version)]
#[command(about = "Browse YouTube playlists from a catalog or a spreadsheet", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the per-user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Do not write the JSON log file
    #[arg(long, global = true)]
    no_log_file: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Enrich a playlist catalog and list it
    Catalog {
        /// Catalog file (defaults to catalog_path from the config)
        path: Option<PathBuf>,
    },
    /// Import playlists from a JSON, CSV, TSV or XLSX sheet
    Import {
        /// Sheet file
        file: PathBuf,
        /// Merge fetched video metadata over the imported rows
        #[arg(long)]
        enrich: bool,
    },
    /// Convert an ISO-8601 duration such as PT1H2M3S
    Duration {
        /// Duration string
        value: String,
    },
    /// Extract the video ID from a URL or bare ID
    VideoId {
        /// URL or ID
        input: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::Logging(e)) => {
            eprintln!("tubeshelf: {e}");
            ExitCode::FAILURE
        }
        Err(_) => ExitCode::FAILURE,
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let logging = LoggingConfig::auto().with_file_output(!cli.no_log_file);
    let _guard = logging::init(&logging)?;

    let result = execute(cli).await;
    if let Err(e) = &result {
        error!("{e}");
    }
    result
}

async fn execute(cli: Cli) -> Result<(), AppError> {
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    match cli.command {
        Command::Catalog { path } => {
            let config = load_config(cli.config.as_deref())?;
            commands::catalog(&config, path, format).await
        }
        Command::Import { file, enrich } => {
            let config = load_config(cli.config.as_deref())?;
            commands::import(&config, &file, enrich, format).await
        }
        Command::Duration { value } => commands::duration(&value, format),
        Command::VideoId { input } => commands::video_id(&input, format),
    }
}

fn load_config(path: Option<&Path>) -> Result<AppConfig, AppError> {
    let config = match path {
        Some(path) => {
            let mut config = AppConfig::load_from(path)?;
            config.apply_api_key_override(std::env::var(API_KEY_ENV).ok());
            config.validate()?;
            config
        }
        None => {
            debug!("Config file: {}", AppConfig::config_file_path().display());
            AppConfig::load()?
        }
    };

    info!(
        "Failure policy: {:?}, default video index: {}",
        config.failure_policy, config.default_video_index
    );
    Ok(config)
}
