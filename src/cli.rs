//! Command-line interface definitions.
//!
//! One subcommand per flow. Fetch subcommands talk to the site; the others
//! work offline on files a fetch produced. Every path flag defaults to the
//! file name the pipeline uses, so a full run needs no flags at all:
//!
//! ```sh
//! slotcatalog_scrape providers
//! slotcatalog_scrape provider-games
//! slotcatalog_scrape parse-games
//! slotcatalog_scrape game-urls
//! slotcatalog_scrape game-details
//! slotcatalog_scrape missing
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a config.yaml file (cookies, delays, batch size)
    #[arg(short, long, global = true, env = "SLOTCATALOG_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Page through every provider's game listing into <slug>_games.html
    ProviderGames {
        /// JSON array of {title, href} provider entries
        #[arg(long, default_value = "providers.json")]
        providers: PathBuf,
        /// Fetch a single provider slug instead of the providers file
        #[arg(long)]
        provider: Option<String>,
        #[arg(short, long, default_value = "games_data")]
        output_dir: PathBuf,
        /// Stop each provider after this many pages
        #[arg(long)]
        max_pages: Option<usize>,
    },

    /// Fetch the best-games ranking for every country in the countries file
    Best {
        #[arg(long, default_value = "countries.txt")]
        countries: PathBuf,
        #[arg(short, long, default_value = "games_data")]
        output_dir: PathBuf,
        /// Ranking pages per country
        #[arg(long, default_value_t = 2)]
        pages: usize,
    },

    /// Download game detail pages in concurrent batches, skipping ones already saved
    GameDetails {
        /// JSON array of site-relative game paths
        #[arg(long, default_value = "game_urls.json")]
        urls: PathBuf,
        #[arg(short, long, default_value = "game_details")]
        output_dir: PathBuf,
        /// Index of the first URL to process
        #[arg(long, default_value_t = 0)]
        start: usize,
        /// Override the configured batch size
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Fetch the provider directory pages into page_<n>.html
    Providers {
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
        #[arg(long, default_value_t = crate::scrapers::provider_list::DEFAULT_PAGES)]
        pages: usize,
        /// Country the provider ranking is computed for
        #[arg(long, default_value = "CA")]
        country: String,
    },

    /// Extract slot cards from <slug>_games.html files into JSON
    ParseGames {
        #[arg(long, default_value = "games_data")]
        games_dir: PathBuf,
        /// Combined output; defaults to games_combined.json next to the games dir
        #[arg(long)]
        combined: Option<PathBuf>,
    },

    /// Extract rankings from best_slots_<country>.html files
    ParseBest {
        #[arg(long, default_value = "games_data")]
        games_dir: PathBuf,
        #[arg(short, long, default_value = "games_data/all_games_by_country.json")]
        output: PathBuf,
    },

    /// Extract the country codes from a saved best-slots page
    Countries {
        #[arg(long, default_value = "games_data/best_slots.html")]
        html: PathBuf,
        #[arg(short, long, default_value = "countries.txt")]
        output: PathBuf,
    },

    /// Extract attribute tables from saved provider pages
    ProviderDetails {
        #[arg(long, default_value = "details")]
        details_dir: PathBuf,
        #[arg(short, long, default_value = "provider_details.json")]
        output: PathBuf,
    },

    /// Collect game paths from the combined listing
    GameUrls {
        #[arg(long, default_value = "games_combined.json")]
        input: PathBuf,
        #[arg(short, long, default_value = "game_urls.json")]
        output: PathBuf,
    },

    /// List game paths whose detail page has not been downloaded
    Missing {
        #[arg(long, default_value = "game_urls.json")]
        urls: PathBuf,
        #[arg(long, default_value = "game_details")]
        details_dir: PathBuf,
        #[arg(short, long, default_value = "missing_game_urls.json")]
        output: PathBuf,
    },

    /// Write simplified rankings and report the distinct ones
    Rank {
        #[arg(long, default_value = "games_data/all_games_by_country.json")]
        input: PathBuf,
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Export a game-by-country position matrix as CSV
    RankCsv {
        #[arg(long, default_value = "games_data/all_games_by_country.json")]
        input: PathBuf,
        /// Defaults to <input stem>_rankings.csv next to the input
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Command {
    /// Whether this subcommand makes network requests.
    pub fn fetches(&self) -> bool {
        matches!(
            self,
            Command::ProviderGames { .. } | Command::Best { .. } | Command::GameDetails { .. } | Command::Providers { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_details_defaults() {
        let cli = Cli::parse_from(["slotcatalog_scrape", "game-details"]);
        assert_eq!(cli.config, None);
        assert_eq!(
            cli.command,
            Command::GameDetails {
                urls: PathBuf::from("game_urls.json"),
                output_dir: PathBuf::from("game_details"),
                start: 0,
                batch_size: None,
            }
        );
        assert!(cli.command.fetches());
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::parse_from([
            "slotcatalog_scrape",
            "provider-games",
            "--provider",
            "NetEnt",
            "--config",
            "conf.yaml",
            "-o",
            "/tmp/games",
        ]);
        assert_eq!(cli.config.as_deref(), Some("conf.yaml"));
        match cli.command {
            Command::ProviderGames {
                provider, output_dir, ..
            } => {
                assert_eq!(provider.as_deref(), Some("NetEnt"));
                assert_eq!(output_dir, PathBuf::from("/tmp/games"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_providers_defaults_to_29_pages() {
        let cli = Cli::parse_from(["slotcatalog_scrape", "providers"]);
        assert_eq!(
            cli.command,
            Command::Providers {
                output_dir: PathBuf::from("."),
                pages: 29,
                country: "CA".to_string(),
            }
        );
    }

    #[test]
    fn test_offline_commands_do_not_fetch() {
        let cli = Cli::parse_from(["slotcatalog_scrape", "rank-csv", "--input", "x.json"]);
        assert!(!cli.command.fetches());
        assert_eq!(
            cli.command,
            Command::RankCsv {
                input: PathBuf::from("x.json"),
                output: None,
            }
        );
    }

    #[test]
    fn test_best_pages_flag() {
        let cli = Cli::parse_from(["slotcatalog_scrape", "best", "--pages", "3"]);
        assert!(matches!(cli.command, Command::Best { pages: 3, .. }));
    }
}
