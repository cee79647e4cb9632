//! Output generation for extracted data.
//!
//! # Submodules
//!
//! - [`json`]: pretty-printed JSON files
//! - [`rankings`]: per-country ranking summaries and the ranking matrix CSV
//!
//! # Output Structure
//!
//! ```text
//! games_data/
//! ├── <slug>_games.html          # provider-games
//! ├── <slug>_games.json          # parse-games
//! ├── best_slots_<country>.html  # best
//! └── all_games_by_country.json  # parse-best
//! games_combined.json            # parse-games
//! game_urls.json                 # game-urls
//! missing_game_urls.json         # missing
//! games_simplified.json          # rank
//! games_names_only.json          # rank
//! all_games_by_country_rankings.csv  # rank-csv
//! ```

pub mod json;
pub mod rankings;
