//! # slotcatalog_scrape
//!
//! Archives slotcatalog.com as raw HTML and turns the archive into data.
//!
//! ## Features
//!
//! - Pages through every provider's game listing until the listing runs dry
//! - Fetches the per-country "best slots" rankings
//! - Downloads every game's detail page in concurrent, fixed-size batches,
//!   never fetching a page that is already on disk
//! - Fetches the provider directory
//! - Extracts slot cards, country codes and provider attributes from the
//!   saved HTML, and summarises the country rankings as JSON and CSV
//!
//! ## Usage
//!
//! ```sh
//! slotcatalog_scrape --config config.yaml game-details --start 6146
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching** ([`scrapers`]): throttled requests through a [`client::Fetcher`],
//!    raw responses written to disk
//! 2. **Extraction** ([`extract`]): offline HTML parsing of the saved pages
//! 3. **Output** ([`outputs`], [`catalog`]): JSON/CSV files feeding the next step

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod catalog;
mod cli;
mod client;
mod config;
mod extract;
mod models;
mod outputs;
mod scrapers;
mod utils;

use cli::{Cli, Command};
use client::HttpFetcher;
use config::Config;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("slotcatalog_scrape starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = Config::load(args.config.as_deref()).await?;
    if args.command.fetches() && config.cookies == Default::default() {
        warn!("No session cookies configured; Cloudflare may reject requests");
    }

    if let Err(e) = dispatch(args.command, config).await {
        error!(error = %e, "Command failed");
        return Err(e);
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

async fn dispatch(command: Command, config: Config) -> Result<(), Box<dyn Error>> {
    match command {
        Command::ProviderGames {
            providers,
            provider,
            output_dir,
            max_pages,
        } => {
            let options = scrapers::provider_games::ProviderGamesOptions {
                providers_file: providers,
                provider,
                output_dir,
                max_pages,
            };
            let fetcher = HttpFetcher::new(&config)?;
            let report = scrapers::provider_games::run(&fetcher, &config, &options).await?;
            info!(%report, "Fetch summary");
        }
        Command::Best {
            countries,
            output_dir,
            pages,
        } => {
            let options = scrapers::best_games::BestGamesOptions {
                countries_file: countries,
                output_dir,
                pages,
            };
            let fetcher = HttpFetcher::new(&config)?;
            let report = scrapers::best_games::run(&fetcher, &config, &options).await?;
            info!(%report, "Fetch summary");
        }
        Command::GameDetails {
            urls,
            output_dir,
            start,
            batch_size,
        } => {
            let config = config.with_batch_size(batch_size)?;
            let options = scrapers::game_details::GameDetailsOptions {
                urls_file: urls,
                output_dir,
                start,
            };
            let fetcher = HttpFetcher::new(&config)?;
            let report = scrapers::game_details::run(&fetcher, &config, &options).await?;
            info!(%report, "Fetch summary");
        }
        Command::Providers {
            output_dir,
            pages,
            country,
        } => {
            let options = scrapers::provider_list::ProviderListOptions {
                output_dir,
                pages,
                country,
            };
            let fetcher = HttpFetcher::new(&config)?;
            let report = scrapers::provider_list::run(&fetcher, &config, &options).await?;
            info!(%report, "Fetch summary");
        }
        Command::ParseGames { games_dir, combined } => {
            let combined = combined.unwrap_or_else(|| extract::games::default_combined_path(&games_dir));
            let parsed = extract::games::parse_game_files(&games_dir, &combined).await?;
            if let Some(sample) = parsed.games.first() {
                info!(?sample, "Sample game data");
            }
        }
        Command::ParseBest { games_dir, output } => {
            let by_country = extract::games::parse_best_files(&games_dir).await?;
            outputs::json::write_pretty(&output, &by_country).await?;
        }
        Command::Countries { html, output } => {
            let countries = extract::countries::save_countries(&html, &output).await?;
            info!(count = countries.len(), "Found countries");
        }
        Command::ProviderDetails { details_dir, output } => {
            let details = extract::provider_details::parse_provider_details(&details_dir).await?;
            outputs::json::write_pretty(&output, &details).await?;
        }
        Command::GameUrls { input, output } => {
            catalog::collect_game_urls(&input, &output).await?;
        }
        Command::Missing {
            urls,
            details_dir,
            output,
        } => {
            let missing = catalog::find_missing(&urls, &details_dir, &output).await?;
            info!(total = missing.len(), "Total missing URLs");
        }
        Command::Rank { input, output_dir } => {
            outputs::rankings::summarize(&input, &output_dir).await?;
        }
        Command::RankCsv { input, output } => {
            let output = output.unwrap_or_else(|| outputs::rankings::default_csv_path(&input));
            outputs::rankings::export_csv(&input, &output).await?;
        }
    }
    Ok(())
}
