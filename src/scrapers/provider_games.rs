//! Provider game lister.
//!
//! Walks the "load more games" AJAX endpoint of each provider page by page
//! and appends every page to `<slug>_games.html`. The endpoint keeps
//! answering past the last page, so the walk stops at the first response
//! without a slot card.

use crate::client::{Fetcher, PageRequest, site_url};
use crate::config::Config;
use crate::models::{ProviderEntry, RunReport};
use crate::utils::{ensure_writable_dir, pause, truncate_for_log};
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, instrument, warn};

/// Substring present in every listing page that still carries games.
pub const SLOT_CARD_MARKER: &str = r#"<div class="slotCard">"#;

#[derive(Debug, Clone)]
pub struct ProviderGamesOptions {
    /// JSON array of `{title, href}` provider entries.
    pub providers_file: PathBuf,
    /// Fetch only this provider slug instead of reading `providers_file`.
    pub provider: Option<String>,
    pub output_dir: PathBuf,
    /// Stop a provider after this many pages even if cards keep coming.
    pub max_pages: Option<usize>,
}

/// Read provider slugs from `providers.json`.
///
/// Entries without a title are dropped, as are entries whose `href` has no
/// usable last segment.
pub async fn load_providers(path: &Path) -> Result<Vec<String>, Box<dyn Error>> {
    let text = fs::read_to_string(path).await?;
    let entries: Vec<ProviderEntry> = serde_json::from_str(&text)?;
    info!(count = entries.len(), path = %path.display(), "Read provider entries");

    let slugs: Vec<String> = entries
        .iter()
        .filter(|entry| entry.title.is_some())
        .filter_map(|entry| match entry.slug() {
            Some(slug) => Some(slug.to_string()),
            None => {
                warn!(href = %entry.href, "Provider entry has no slug; skipping");
                None
            }
        })
        .collect();
    info!(count = slugs.len(), "Extracted provider slugs");
    Ok(slugs)
}

/// Build the request for one listing page of `slug`.
pub fn listing_request(config: &Config, slug: &str, page: usize) -> Result<PageRequest, Box<dyn Error>> {
    let form = format!(
        "lang=en&tag=BRAND&brandtranslit={}&blck=pLoadMoreBrandGames&ajax=1&p={page}&ver=0",
        urlencoding::encode(slug)
    );
    let referer = site_url(&config.base_url, &format!("/en/soft/{slug}"))?;
    Ok(PageRequest::post_form(site_url(&config.base_url, "/index.php")?, form, referer)
        .with_cookie(config.cookies.provider_games.clone()))
}

/// Fetch every listing page of every provider.
///
/// A provider that fails is logged and counted; the run moves on to the
/// next one.
#[instrument(level = "info", skip_all, fields(output_dir = %options.output_dir.display()))]
pub async fn run<F: Fetcher>(
    fetcher: &F,
    config: &Config,
    options: &ProviderGamesOptions,
) -> Result<RunReport, Box<dyn Error>> {
    let mut report = RunReport::start("provider-games");

    let slugs = match &options.provider {
        Some(slug) => vec![slug.clone()],
        None => load_providers(&options.providers_file).await?,
    };
    ensure_writable_dir(&options.output_dir).await?;

    for (index, slug) in slugs.iter().enumerate() {
        info!(provider = %slug, position = index + 1, total = slugs.len(), "Processing provider");
        match fetch_provider_games(fetcher, config, slug, &options.output_dir, options.max_pages).await {
            Ok(provider_report) => report.absorb(&provider_report),
            Err(e) => {
                error!(provider = %slug, error = %e, "Provider failed; moving on");
                report.failed += 1;
            }
        }
        pause(config.delays.provider(), config.delays.jitter_ms).await;
    }

    info!(providers = slugs.len(), "Completed fetching games for all providers");
    report.log_finished();
    Ok(report)
}

/// Fetch all listing pages of a single provider into `<slug>_games.html`.
///
/// The file is truncated before the first request, so a provider with no
/// games leaves an empty file behind.
#[instrument(level = "info", skip(fetcher, config, output_dir))]
pub async fn fetch_provider_games<F: Fetcher>(
    fetcher: &F,
    config: &Config,
    slug: &str,
    output_dir: &Path,
    max_pages: Option<usize>,
) -> Result<RunReport, Box<dyn Error>> {
    let mut report = RunReport::start("provider-games");
    let output_path = output_dir.join(format!("{slug}_games.html"));
    fs::write(&output_path, "").await?;
    let mut file = OpenOptions::new().append(true).open(&output_path).await?;

    let mut page = 1usize;
    loop {
        if max_pages.is_some_and(|max| page > max) {
            warn!(page, "Reached page cap; stopping provider");
            break;
        }

        info!(page, "Fetching page");
        let request = listing_request(config, slug, page)?;
        let fetched = fetcher.fetch(&request).await?;
        report.requests += 1;

        if !fetched.status.is_success() {
            warn!(page, status = %fetched.status, "Listing endpoint returned an error status");
        }
        if !fetched.body.contains(SLOT_CARD_MARKER) {
            info!(page, "No more games found");
            debug!(body = %truncate_for_log(&fetched.body, 200), "Terminating response");
            break;
        }

        file.write_all(fetched.body.as_bytes()).await?;
        report.saved += 1;
        debug!(page, bytes = fetched.body.len(), "Page appended");

        page += 1;
        pause(config.delays.page(), config.delays.jitter_ms).await;
    }
    file.flush().await?;

    info!(path = %output_path.display(), pages = report.saved, "All game data saved");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FetchedPage;
    use crate::client::testing::ScriptedFetcher;
    use crate::config::Delays;
    use reqwest::StatusCode;

    fn quiet_config() -> Config {
        Config {
            delays: Delays::none(),
            ..Config::default()
        }
    }

    fn page_of(request: &PageRequest) -> usize {
        let form = request.form.as_deref().unwrap();
        let p = form.split('&').find_map(|kv| kv.strip_prefix("p=")).unwrap();
        p.parse().unwrap()
    }

    fn card_page(page: usize) -> String {
        format!("<div class=\"slotCard\">game {page}</div>")
    }

    #[test]
    fn test_listing_request_shape() {
        let mut config = quiet_config();
        config.cookies.provider_games = Some("PHPSESSID=abc".to_string());
        let request = listing_request(&config, "Pragmatic-Play", 3).unwrap();

        assert_eq!(request.url, "https://slotcatalog.com/index.php");
        assert_eq!(
            request.form.as_deref(),
            Some("lang=en&tag=BRAND&brandtranslit=Pragmatic-Play&blck=pLoadMoreBrandGames&ajax=1&p=3&ver=0")
        );
        assert_eq!(request.referer, "https://slotcatalog.com/en/soft/Pragmatic-Play");
        assert_eq!(request.cookie.as_deref(), Some("PHPSESSID=abc"));
    }

    #[tokio::test]
    async fn test_stops_at_first_page_without_marker() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ScriptedFetcher::new(|request: &PageRequest| {
            let page = page_of(request);
            if page <= 3 {
                Ok(FetchedPage::ok(card_page(page)))
            } else {
                Ok(FetchedPage::ok("<p>nothing here</p>"))
            }
        });

        let report = fetch_provider_games(&fetcher, &quiet_config(), "NetEnt", dir.path(), None)
            .await
            .unwrap();

        assert_eq!(report.requests, 4);
        assert_eq!(report.saved, 3);
        let saved = std::fs::read_to_string(dir.path().join("NetEnt_games.html")).unwrap();
        assert_eq!(saved, format!("{}{}{}", card_page(1), card_page(2), card_page(3)));
        assert!(!saved.contains("nothing here"));
    }

    #[tokio::test]
    async fn test_error_status_is_judged_by_marker_alone() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ScriptedFetcher::new(|request: &PageRequest| match page_of(request) {
            1 => Ok(FetchedPage::ok(card_page(1))),
            2 => Ok(FetchedPage {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: card_page(2),
            }),
            _ => Ok(FetchedPage {
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: "<p>try again later</p>".to_string(),
            }),
        });

        let report = fetch_provider_games(&fetcher, &quiet_config(), "NetEnt", dir.path(), None)
            .await
            .unwrap();

        assert_eq!(report.requests, 3);
        assert_eq!(report.saved, 2);
        let saved = std::fs::read_to_string(dir.path().join("NetEnt_games.html")).unwrap();
        assert_eq!(saved, format!("{}{}", card_page(1), card_page(2)));
    }

    #[tokio::test]
    async fn test_truncates_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("NetEnt_games.html"), "stale").unwrap();
        let fetcher = ScriptedFetcher::new(|_: &PageRequest| Ok(FetchedPage::ok("")));

        fetch_provider_games(&fetcher, &quiet_config(), "NetEnt", dir.path(), None)
            .await
            .unwrap();

        let saved = std::fs::read_to_string(dir.path().join("NetEnt_games.html")).unwrap();
        assert!(saved.is_empty());
    }

    #[tokio::test]
    async fn test_page_cap() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ScriptedFetcher::new(|request: &PageRequest| Ok(FetchedPage::ok(card_page(page_of(request)))));

        let report = fetch_provider_games(&fetcher, &quiet_config(), "NetEnt", dir.path(), Some(2))
            .await
            .unwrap();

        assert_eq!(report.requests, 2);
        assert_eq!(report.saved, 2);
    }

    #[tokio::test]
    async fn test_run_reads_providers_and_survives_failures() {
        let dir = tempfile::tempdir().unwrap();
        let providers_file = dir.path().join("providers.json");
        std::fs::write(
            &providers_file,
            r#"[
                {"title": "Broken", "href": "/en/soft/Broken"},
                {"href": "/en/soft/Untitled"},
                {"title": "NetEnt", "href": "/en/soft/NetEnt"}
            ]"#,
        )
        .unwrap();

        let fetcher = ScriptedFetcher::new(|request: &PageRequest| {
            let form = request.form.clone().unwrap_or_default();
            if form.contains("brandtranslit=Broken") {
                return Err("connection reset".to_string());
            }
            if page_of(request) == 1 {
                Ok(FetchedPage::ok(card_page(1)))
            } else {
                Ok(FetchedPage::ok(""))
            }
        });

        let options = ProviderGamesOptions {
            providers_file,
            provider: None,
            output_dir: dir.path().join("games_data"),
            max_pages: None,
        };
        let report = run(&fetcher, &quiet_config(), &options).await.unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.saved, 1);
        assert!(dir.path().join("games_data/NetEnt_games.html").exists());
        assert!(!dir.path().join("games_data/Untitled_games.html").exists());
        // Broken is attempted once, NetEnt twice
        assert_eq!(fetcher.urls().len(), 3);
    }

    #[tokio::test]
    async fn test_run_single_provider_skips_file() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ScriptedFetcher::new(|_: &PageRequest| Ok(FetchedPage::ok("")));
        let options = ProviderGamesOptions {
            providers_file: dir.path().join("does-not-exist.json"),
            provider: Some("Hacksaw-Gaming".to_string()),
            output_dir: dir.path().to_path_buf(),
            max_pages: None,
        };

        run(&fetcher, &quiet_config(), &options).await.unwrap();

        let requests = fetcher.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].form.as_deref().unwrap().contains("brandtranslit=Hacksaw-Gaming"));
    }
}
