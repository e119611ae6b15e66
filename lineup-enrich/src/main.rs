//! lineup-enrich - festival artist table enrichment
//!
//! Subcommands:
//! - `track`: record hand-edited protected fields as user-owned
//! - `sync-lineup`: add newly announced artists from the lineup page
//! - `scrape`: fetch festival bios, social links and Spotify links
//! - `enrich`: fill missing fields through the AI provider

use anyhow::{Context, Result};
use chrono::Datelike;
use clap::{Parser, Subcommand};
use lineup_common::config::{
    load_toml_config, resolve_config_path, resolve_data_root, LoggingConfig, DEFAULT_FESTIVAL,
};
use lineup_common::TomlConfig;
use lineup_enrich::ai::{ChatCompletionsProvider, EnrichmentProvider};
use lineup_enrich::config::resolve_provider_settings;
use lineup_enrich::extraction::{ExtractionEngine, InteractiveResolver, NullResolver, SelectorResolver};
use lineup_enrich::festival_data::ScrapeOptions;
use lineup_enrich::fetch::HttpFetcher;
use lineup_enrich::merge::{BatchOptions, RateLimitPolicy};
use lineup_enrich::Pipeline;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for lineup-enrich
#[derive(Parser, Debug)]
#[command(name = "lineup-enrich")]
#[command(about = "Scrape and AI-enrich festival artist tables")]
#[command(version)]
struct Cli {
    /// TOML config file (default: LINEUP_CONFIG, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Festival slug
    #[arg(long, global = true, default_value = DEFAULT_FESTIVAL, env = "LINEUP_FESTIVAL")]
    festival: String,

    /// Festival year (default: current year)
    #[arg(long, global = true, env = "LINEUP_YEAR")]
    year: Option<u16>,

    /// Directory holding the festival tables
    #[arg(long, global = true)]
    data_root: Option<PathBuf>,

    /// Ask for a CSS selector when extraction fails
    #[arg(long, global = true)]
    interactive: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record current protected values as user-owned
    Track,
    /// Add artists newly listed on the lineup page
    SyncLineup,
    /// Scrape festival artist pages
    Scrape {
        /// Re-scrape rows that already have festival data
        #[arg(long)]
        force: bool,
        /// Only this artist
        #[arg(long)]
        artist: Option<String>,
    },
    /// Fill missing fields with the AI provider
    Enrich {
        /// Overwrite non-empty fields (never user-owned ones)
        #[arg(long)]
        force: bool,
        /// Only this artist
        #[arg(long)]
        artist: Option<String>,
        /// Concurrent provider calls (default: 5 for Azure, 2 otherwise)
        #[arg(long)]
        workers: Option<usize>,
    },
}

fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

fn build_engine(cli: &Cli, toml_config: &TomlConfig) -> ExtractionEngine {
    let resolver: Box<dyn SelectorResolver> = if cli.interactive || toml_config.scraper.interactive {
        info!("Interactive selector learning enabled");
        Box::new(InteractiveResolver::stdio())
    } else {
        Box::new(NullResolver)
    };
    ExtractionEngine::new(resolver)
}

/// Cancel `token` on Ctrl+C
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received Ctrl+C, finishing in-flight requests and stopping");
            token.cancel();
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = resolve_config_path(cli.config.as_deref());
    let toml_config = load_toml_config(config_path.as_deref()).context("Failed to load config")?;
    init_logging(&toml_config.logging)?;

    info!("Starting lineup-enrich v{}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &config_path {
        info!(config = %path.display(), "Using config file");
    }

    let festival = toml_config
        .festival(&cli.festival)
        .context("Unknown festival")?;
    let year = cli.year.unwrap_or_else(|| chrono::Utc::now().year() as u16);
    let data_root = resolve_data_root(cli.data_root.as_deref(), &toml_config);
    info!(festival = %festival.name, year, data_root = %data_root.display(), "Festival selected");

    let pipeline = Pipeline::new(
        &data_root,
        festival,
        year,
        toml_config.protection.fields.clone(),
    );

    match &cli.command {
        Command::Track => {
            let tracked = pipeline.track().context("Tracking failed")?;
            info!(tracked, "Done");
        }
        Command::SyncLineup => {
            let fetcher = HttpFetcher::new(&toml_config.scraper)?;
            let mut engine = build_engine(&cli, &toml_config);
            let summary = pipeline
                .sync_lineup(&fetcher, &mut engine)
                .await
                .context("Lineup sync failed")?;
            info!(
                found = summary.found,
                added = summary.added,
                restored = summary.restored,
                "Lineup sync done"
            );
        }
        Command::Scrape { force, artist } => {
            let fetcher = HttpFetcher::new(&toml_config.scraper)?;
            let mut engine = build_engine(&cli, &toml_config);
            let translator: Option<Box<dyn EnrichmentProvider>> =
                match resolve_provider_settings(&toml_config.provider) {
                    Ok(settings) => Some(Box::new(ChatCompletionsProvider::new(settings)?)),
                    Err(_) => {
                        info!("No AI provider configured, Dutch bios will not be translated");
                        None
                    }
                };
            let options = ScrapeOptions {
                force: *force,
                artist_filter: artist.clone(),
            };
            let summary = pipeline
                .scrape(&fetcher, &mut engine, translator.as_deref(), &options)
                .await
                .context("Scrape failed")?;
            info!(
                scraped = summary.scraped,
                updated = summary.updated,
                unavailable = summary.unavailable,
                "Scrape done"
            );
        }
        Command::Enrich {
            force,
            artist,
            workers,
        } => {
            let settings = resolve_provider_settings(&toml_config.provider)?;
            let workers = workers.unwrap_or(settings.workers);
            let provider: Arc<dyn EnrichmentProvider> = Arc::new(ChatCompletionsProvider::new(settings)?);

            let options = BatchOptions {
                force: *force,
                artist_filter: artist.clone(),
                workers,
                rating_boost: pipeline.festival().rating_boost,
                rate_limit: RateLimitPolicy {
                    max_wait: Duration::from_secs(toml_config.provider.max_rate_limit_wait_secs),
                    abandon_batch: toml_config.provider.abandon_batch_on_long_wait,
                },
            };
            if *force {
                warn!("Force mode enabled: non-empty fields will be overwritten (user-owned fields excepted)");
            }

            let cancel = CancellationToken::new();
            cancel_on_ctrl_c(cancel.clone());
            let summary = pipeline
                .enrich(provider, &options, cancel)
                .await
                .context("Enrichment failed")?;
            info!(%summary, "Enrichment done");
            if summary.enriched > 0 {
                warn!("Please review and verify AI-generated content");
            }
        }
    }

    Ok(())
}
