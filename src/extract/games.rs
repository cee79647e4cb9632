//! Slot card extraction.
//!
//! Listing pages render each game as:
//!
//! ```html
//! <div class="slotCard">
//!   <div class="slotCardImage"><a href="/en/slots/X"><img data-src="..."></a></div>
//!   <a class="slotCardName">X</a>
//!   <div class="propTable">
//!     <div class="propTableLine">RTP: 96.5%</div>
//!   </div>
//! </div>
//! ```
//!
//! Both the provider listings (`<slug>_games.html`) and the best-games
//! rankings (`best_slots_<country>.html`) use that markup.

use super::element_text;
use crate::models::{GameCard, RankedGame};
use crate::outputs::json::write_pretty;
use crate::utils::files_with_extension;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument, warn};

static SLOT_CARD: Lazy<Selector> = Lazy::new(|| Selector::parse("div.slotCard").expect("valid selector"));
static CARD_NAME: Lazy<Selector> = Lazy::new(|| Selector::parse("a.slotCardName").expect("valid selector"));
static CARD_IMAGE: Lazy<Selector> = Lazy::new(|| Selector::parse("div.slotCardImage").expect("valid selector"));
static IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img").expect("valid selector"));
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("valid selector"));
static PROP_TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("div.propTable").expect("valid selector"));
static PROP_LINE: Lazy<Selector> = Lazy::new(|| Selector::parse("div.propTableLine").expect("valid selector"));

const GAMES_SUFFIX: &str = "_games";
const BEST_PREFIX: &str = "best_slots_";

/// Extract every slot card in `html`, in document order.
///
/// Cards with missing parts are kept with those fields left empty.
pub fn extract_game_cards(html: &str) -> Vec<GameCard> {
    let document = Html::parse_document(html);
    document
        .select(&SLOT_CARD)
        .map(|card| {
            let mut game = GameCard::default();

            if let Some(name) = card.select(&CARD_NAME).next() {
                // names are trimmed only; inner spacing is kept as published
                game.name = Some(name.text().collect::<String>().trim().to_string());
            }

            if let Some(image) = card.select(&CARD_IMAGE).next() {
                game.thumbnail = image
                    .select(&IMG)
                    .next()
                    .and_then(|img| img.value().attr("data-src"))
                    .map(str::to_string);
                game.url = image
                    .select(&LINK)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .map(str::to_string);
            }

            if let Some(table) = card.select(&PROP_TABLE).next() {
                for line in table.select(&PROP_LINE) {
                    let text = element_text(&line);
                    if let Some((key, value)) = text.split_once(':') {
                        game.properties.insert(key.trim().to_string(), value.trim().to_string());
                    }
                }
            }

            game
        })
        .collect()
}

/// Summary of a `parse-games` run.
#[derive(Debug, Default)]
pub struct ParsedGames {
    pub files: usize,
    pub games: Vec<GameCard>,
}

/// Extract cards from every `<slug>_games.html` in `games_dir`.
///
/// Each file's cards are tagged with the provider slug and written to the
/// sibling `.json` file; all cards together go to `combined_path`. A file
/// that cannot be read or written is logged and skipped.
#[instrument(level = "info", skip_all, fields(games_dir = %games_dir.display()))]
pub async fn parse_game_files(games_dir: &Path, combined_path: &Path) -> Result<ParsedGames, Box<dyn Error>> {
    let mut parsed = ParsedGames::default();
    if !games_dir.is_dir() {
        warn!("Directory not found");
        return Ok(parsed);
    }

    for path in files_with_extension(games_dir, "html").await? {
        let Some(provider) = file_stem(&path).and_then(|stem| stem.strip_suffix(GAMES_SUFFIX).map(str::to_string))
        else {
            continue;
        };

        match parse_provider_file(&path, &provider).await {
            Ok(games) => {
                info!(file = %path.display(), count = games.len(), "Processed listing");
                parsed.files += 1;
                parsed.games.extend(games);
            }
            Err(e) => error!(file = %path.display(), error = %e, "Error processing listing"),
        }
    }

    write_pretty(combined_path, &parsed.games).await?;
    info!(
        files = parsed.files,
        total = parsed.games.len(),
        path = %combined_path.display(),
        "Total games extracted"
    );
    Ok(parsed)
}

async fn parse_provider_file(path: &Path, provider: &str) -> Result<Vec<GameCard>, Box<dyn Error>> {
    let html = fs::read_to_string(path).await?;
    let mut games = extract_game_cards(&html);
    for game in &mut games {
        game.provider = Some(provider.to_string());
    }
    write_pretty(&path.with_extension("json"), &games).await?;
    Ok(games)
}

/// Extract the ranking of every `best_slots_<country>.html` in `games_dir`.
///
/// Returns `country -> games in ranking order`, ordered by country code.
#[instrument(level = "info", skip_all, fields(games_dir = %games_dir.display()))]
pub async fn parse_best_files(games_dir: &Path) -> Result<BTreeMap<String, Vec<RankedGame>>, Box<dyn Error>> {
    let mut by_country = BTreeMap::new();
    for path in files_with_extension(games_dir, "html").await? {
        let Some(country) = file_stem(&path).and_then(|stem| stem.strip_prefix(BEST_PREFIX).map(str::to_string))
        else {
            continue;
        };
        match fs::read_to_string(&path).await {
            Ok(html) => {
                let games: Vec<RankedGame> = extract_game_cards(&html).into_iter().map(RankedGame::from).collect();
                info!(%country, count = games.len(), "Processed ranking");
                by_country.insert(country, games);
            }
            Err(e) => error!(file = %path.display(), error = %e, "Error reading ranking"),
        }
    }
    info!(countries = by_country.len(), "Rankings extracted");
    Ok(by_country)
}

/// Default location of the combined listing: next to `games_dir`.
pub fn default_combined_path(games_dir: &Path) -> PathBuf {
    games_dir
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("games_combined.json")
}

fn file_stem(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|stem| stem.to_str())
}
