//! Best-games fetcher.
//!
//! The "The Best Slots" ranking differs per visitor country, which the site
//! reads from the `ucISO` cookie. For each country the first pages of the
//! ranking are fetched and stored together as `best_slots_<country>.html`.

use crate::client::{Fetcher, HeaderProfile, PageRequest, site_url};
use crate::config::Config;
use crate::models::RunReport;
use crate::utils::{ensure_writable_dir, pause, read_lines};
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument, warn};

#[derive(Debug, Clone)]
pub struct BestGamesOptions {
    /// One ISO country code per line.
    pub countries_file: PathBuf,
    pub output_dir: PathBuf,
    /// Ranking pages fetched per country.
    pub pages: usize,
}

/// Cookie selecting the visitor country, with the session id when configured.
pub fn country_cookie(session_id: Option<&str>, country: &str) -> String {
    match session_id {
        Some(session_id) => format!("PHPSESSID={session_id}; ucISO={country}"),
        None => format!("ucISO={country}"),
    }
}

/// Build the request for one ranking page as seen from `country`.
pub fn ranking_request(config: &Config, country: &str, page: usize) -> Result<PageRequest, Box<dyn Error>> {
    let url = site_url(
        &config.base_url,
        &format!("/index.php?ajax=1&lang=en&p={page}&translit=The-Best-Slots&ajax=1&blck=top_games_page"),
    )?;
    let referer = site_url(&config.base_url, "/en/The-Best-Slots")?;
    let cookie = country_cookie(config.cookies.best_session_id.as_deref(), country);
    Ok(PageRequest::get(url, HeaderProfile::AjaxGet, referer).with_cookie(Some(cookie)))
}

/// Fetch all ranking pages for one country and concatenate them in page order.
///
/// Every request issued is counted in `report`, including the failing one.
/// Returns `None` as soon as one page fails to arrive.
async fn fetch_country<F: Fetcher>(
    fetcher: &F,
    config: &Config,
    country: &str,
    pages: usize,
    report: &mut RunReport,
) -> Option<String> {
    let mut combined = String::new();
    for page in 1..=pages {
        let request = match ranking_request(config, country, page) {
            Ok(request) => request,
            Err(e) => {
                error!(%country, page, error = %e, "Could not build ranking request");
                return None;
            }
        };
        report.requests += 1;
        match fetcher.fetch(&request).await {
            Ok(fetched) => {
                if !fetched.status.is_success() {
                    warn!(%country, page, status = %fetched.status, "Ranking page returned an error status");
                }
                combined.push_str(&fetched.body);
            }
            Err(e) => {
                error!(%country, page, error = %e, "Error fetching ranking page");
                return None;
            }
        }
    }
    Some(combined)
}

/// Fetch the ranking for every country in the countries file.
///
/// An unreadable countries file is logged and results in an empty run.
#[instrument(level = "info", skip_all, fields(output_dir = %options.output_dir.display()))]
pub async fn run<F: Fetcher>(
    fetcher: &F,
    config: &Config,
    options: &BestGamesOptions,
) -> Result<RunReport, Box<dyn Error>> {
    let mut report = RunReport::start("best-games");

    let countries = match read_lines(&options.countries_file).await {
        Ok(countries) => countries,
        Err(e) => {
            error!(path = %options.countries_file.display(), error = %e, "Error reading countries file");
            Vec::new()
        }
    };
    info!(count = countries.len(), "Found countries to process");
    ensure_writable_dir(&options.output_dir).await?;

    for country in &countries {
        info!(%country, "Processing country");
        match fetch_country(fetcher, config, country, options.pages, &mut report).await {
            Some(combined) => {
                let path = output_path(&options.output_dir, country);
                match fs::write(&path, combined).await {
                    Ok(()) => {
                        info!(%country, path = %path.display(), "Saved ranking");
                        report.saved += 1;
                    }
                    Err(e) => {
                        error!(%country, path = %path.display(), error = %e, "Failed writing ranking");
                        report.failed += 1;
                    }
                }
            }
            None => {
                warn!(%country, "Skipping country due to fetch errors");
                report.failed += 1;
            }
        }
        pause(config.delays.page(), config.delays.jitter_ms).await;
    }

    info!("All countries processed");
    report.log_finished();
    Ok(report)
}

fn output_path(dir: &Path, country: &str) -> PathBuf {
    dir.join(format!("best_slots_{country}.html"))
}
