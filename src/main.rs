// Command-line entry point for song-names

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use song_names::api::SongsApi;
use song_names::catalog::DEFAULT_SUGGESTION_LIMIT;
use song_names::{extract, ApiConfig, AppError, ExtractConfig, SongCatalog};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "song-names")]
#[command(about = "Build and query a deduplicated song-name catalog")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream the dataset into a full copy and a distinct song-name table
    Extract {
        /// Source dataset CSV
        #[arg(long)]
        source: Option<PathBuf>,
        /// Rows per chunk
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Column to deduplicate
        #[arg(long)]
        column: Option<String>,
        /// Destination of the full copy
        #[arg(long)]
        full_copy: Option<PathBuf>,
        /// Destination of the distinct names
        #[arg(long)]
        distinct: Option<PathBuf>,
        /// Extra value to treat as null (repeatable)
        #[arg(long = "null-marker")]
        null_markers: Vec<String>,
    },

    /// Print the songs currently selected in the playlist backend
    CurrentSongs {
        /// Backend base URL
        #[arg(long)]
        api_url: Option<String>,
        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Check whether a song is in the catalog
    Check {
        song: String,
        /// Distinct-names CSV to search
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Suggest catalog songs starting with a prefix
    Suggest {
        query: String,
        /// Distinct-names CSV to search
        #[arg(long)]
        catalog: Option<PathBuf>,
        #[arg(long, default_value_t = DEFAULT_SUGGESTION_LIMIT)]
        limit: usize,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,song_names=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Extract {
            source,
            chunk_size,
            column,
            full_copy,
            distinct,
            null_markers,
        } => {
            let mut config = ExtractConfig::from_env()?;
            if let Some(source) = source {
                config = config.source_path(source);
            }
            if let Some(rows) = chunk_size {
                config = config.chunk_size(rows);
            }
            if let Some(column) = column {
                config = config.target_column(column);
            }
            if let Some(path) = full_copy {
                config = config.full_copy_path(path);
            }
            if let Some(path) = distinct {
                config = config.distinct_path(path);
            }
            if !null_markers.is_empty() {
                config = config.null_markers(null_markers);
            }

            let summary = extract(&config)?;
            println!(
                "Saved {} unique song names to {}",
                summary.stats.distinct_count,
                summary.distinct_path.display()
            );
            Ok(ExitCode::SUCCESS)
        }

        Commands::CurrentSongs { api_url, timeout } => {
            let mut config = ApiConfig::from_env()?;
            if let Some(url) = api_url {
                config = config.base_url(url);
            }
            if let Some(secs) = timeout {
                config = config.timeout_secs(secs);
            }

            let api = SongsApi::from_config(&config)?;
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("Failed to start async runtime")?;
            let songs = runtime.block_on(api.current_songs())?;

            println!("Current songs: {:?}", songs);
            Ok(ExitCode::SUCCESS)
        }

        Commands::Check { song, catalog } => {
            let catalog = load_catalog(catalog)?;
            if catalog.contains(&song) {
                println!("'{}' is in the catalog", song);
                Ok(ExitCode::SUCCESS)
            } else {
                println!("'{}' was not found in the catalog", song);
                Ok(ExitCode::FAILURE)
            }
        }

        Commands::Suggest {
            query,
            catalog,
            limit,
        } => {
            let catalog = load_catalog(catalog)?;
            for suggestion in catalog.suggestions(&query, limit) {
                println!("{}", suggestion);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_catalog(path: Option<PathBuf>) -> Result<SongCatalog> {
    let path = match path {
        Some(path) => path,
        None => ExtractConfig::from_env()?.distinct_path,
    };
    Ok(SongCatalog::load(path)?)
}

fn report(err: &anyhow::Error) {
    tracing::debug!("command failed: {:#}", err);
    match err.downcast_ref::<AppError>() {
        Some(app_err) => {
            let presentation = app_err.to_presentation();
            eprintln!("{}: {}", presentation.title, presentation.message);
            if let Some(action) = presentation.action {
                eprintln!("  -> {}", action);
            }
        }
        None => eprintln!("Error: {:#}", err),
    }
}
