//! Bookkeeping between the listing data and the detail downloads.
//!
//! - [`collect_game_urls`]: game paths from the combined listing
//! - [`find_missing`]: game paths whose detail page is not on disk yet

use crate::models::GameCard;
use crate::outputs::json::{read, write_pretty};
use crate::utils::{detail_file_name, files_with_extension};
use std::collections::HashSet;
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument};

/// Every non-empty `url` in `games`, in order.
pub fn game_urls(games: &[GameCard]) -> Vec<String> {
    games
        .iter()
        .filter_map(|game| game.url.as_deref())
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read `games_combined.json` and write the game paths to `output`.
#[instrument(level = "info", skip_all, fields(input = %input.display(), output = %output.display()))]
pub async fn collect_game_urls(input: &Path, output: &Path) -> Result<Vec<String>, Box<dyn Error>> {
    let games: Vec<GameCard> = read(input).await?;
    let urls = game_urls(&games);
    write_pretty(output, &urls).await?;
    info!(count = urls.len(), "Extracted game URLs");
    Ok(urls)
}

/// URLs whose detail file name is not among `existing` file names.
pub fn missing_urls(urls: &[String], existing: &HashSet<String>) -> Vec<String> {
    urls.iter()
        .filter(|url| detail_file_name(url).is_none_or(|name| !existing.contains(&name)))
        .cloned()
        .collect()
}

/// Compare the URL list with the detail directory.
///
/// A URL counts as downloaded when `<last path segment>.html` exists in
/// `details_dir`, the same name the game detail fetcher saves under.
///
/// # Arguments
///
/// * `urls_file` - JSON array of game paths (`game_urls.json`)
/// * `details_dir` - Directory of saved detail pages
/// * `output` - Where the missing paths are written, only when there are any
///
/// # Returns
///
/// The missing paths in list order, or an error when `details_dir` does not
/// exist or `urls_file` cannot be read.
#[instrument(level = "info", skip_all, fields(urls = %urls_file.display(), details = %details_dir.display()))]
pub async fn find_missing(urls_file: &Path, details_dir: &Path, output: &Path) -> Result<Vec<String>, Box<dyn Error>> {
    if !details_dir.is_dir() {
        return Err(format!("game details directory not found at {}", details_dir.display()).into());
    }
    let urls: Vec<String> = read(urls_file).await?;
    info!(count = urls.len(), "Loaded game URLs");

    let existing: HashSet<String> = files_with_extension(details_dir, "html")
        .await?
        .iter()
        .filter_map(|path| path.file_name().and_then(|n| n.to_str()).map(str::to_string))
        .collect();
    info!(count = existing.len(), "Found HTML files in game details directory");

    let missing = missing_urls(&urls, &existing);
    info!(count = missing.len(), "Game URLs without a detail page");
    if missing.is_empty() {
        info!("All game URLs have corresponding HTML files");
    } else {
        write_pretty(output, &missing).await?;
    }
    Ok(missing)
}
