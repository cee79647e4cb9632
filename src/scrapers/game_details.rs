//! Game detail fetcher.
//!
//! Downloads the full page of every game in `game_urls.json`. The list is
//! cut into fixed-size batches; the members of a batch are fetched
//! concurrently and the batch is awaited as a whole before the next one
//! starts, followed by a pause. That is the only concurrency limit.
//!
//! # Idempotency
//!
//! A page is stored as `<last path segment>.html` and never overwritten:
//! if the file exists the URL is skipped without a request, and files are
//! created exclusively, so two URLs sharing a name within one batch keep
//! whichever page landed first. Re-running the
//! flow therefore only fetches what is still missing, and `--start` skips
//! ahead in the list without touching earlier entries.
//!
//! # Failure Handling
//!
//! Failures are logged and the URL is dropped for this run. A transport
//! error additionally makes that item wait `error_cooldown` before its slot
//! in the batch completes.

use crate::client::{Fetcher, HeaderProfile, PageRequest, site_url};
use crate::config::Config;
use crate::models::RunReport;
use crate::utils::{detail_file_name, pause};
use futures::future::join_all;
use reqwest::StatusCode;
use std::error::Error;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Clone)]
pub struct GameDetailsOptions {
    /// JSON array of site-relative game paths.
    pub urls_file: PathBuf,
    pub output_dir: PathBuf,
    /// Index of the first URL to process.
    pub start: usize,
}

/// What happened to a single URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailOutcome {
    Saved,
    AlreadyExists,
    /// The URL yields no file name or cannot be resolved.
    Unusable,
    HttpStatus(StatusCode),
    Failed,
}

impl DetailOutcome {
    fn record(&self, report: &mut RunReport) {
        match self {
            DetailOutcome::Saved => {
                report.requests += 1;
                report.saved += 1;
            }
            DetailOutcome::AlreadyExists | DetailOutcome::Unusable => report.skipped += 1,
            DetailOutcome::HttpStatus(_) | DetailOutcome::Failed => {
                report.requests += 1;
                report.failed += 1;
            }
        }
    }
}

/// Read the list of game paths.
pub async fn load_urls(path: &Path) -> Result<Vec<String>, Box<dyn Error>> {
    let text = fs::read_to_string(path).await?;
    let urls: Vec<String> = serde_json::from_str(&text)?;
    Ok(urls)
}

/// Fetch one game page into `output_dir`, unless it is already there.
#[instrument(level = "debug", skip(fetcher, config, output_dir))]
pub async fn fetch_and_save<F: Fetcher>(fetcher: &F, config: &Config, url: &str, output_dir: &Path) -> DetailOutcome {
    let Some(file_name) = detail_file_name(url) else {
        warn!(%url, "URL has no game name; skipping");
        return DetailOutcome::Unusable;
    };
    let output_path = output_dir.join(&file_name);

    match fs::try_exists(&output_path).await {
        Ok(true) => {
            info!(%file_name, "Already exists");
            return DetailOutcome::AlreadyExists;
        }
        Ok(false) => {}
        Err(e) => {
            error!(%file_name, error = %e, "Cannot check for existing game page");
            return DetailOutcome::Failed;
        }
    }

    let (full_url, referer) = match (site_url(&config.base_url, url), site_url(&config.base_url, "/")) {
        (Ok(full_url), Ok(referer)) => (full_url, referer),
        (Err(e), _) | (_, Err(e)) => {
            warn!(%url, error = %e, "Cannot resolve game URL; skipping");
            return DetailOutcome::Unusable;
        }
    };
    info!(url = %full_url, "Fetching");

    let request =
        PageRequest::get(full_url, HeaderProfile::Document, referer).with_cookie(config.cookies.game_details.clone());
    match fetcher.fetch(&request).await {
        Ok(page) if page.status.is_success() => match write_new(&output_path, page.body.as_bytes()).await {
            Ok(()) => {
                info!(%file_name, "Saved");
                DetailOutcome::Saved
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                info!(%file_name, "Saved by another URL in the meantime; keeping it");
                DetailOutcome::AlreadyExists
            }
            Err(e) => {
                error!(%file_name, error = %e, "Failed writing game page");
                DetailOutcome::Failed
            }
        },
        Ok(page) => {
            error!(
                %file_name,
                status = page.status.as_u16(),
                reason = page.status.canonical_reason().unwrap_or(""),
                "Failed to fetch"
            );
            DetailOutcome::HttpStatus(page.status)
        }
        Err(e) => {
            error!(%file_name, error = %e, "Error fetching");
            pause(config.delays.error_cooldown(), 0).await;
            DetailOutcome::Failed
        }
    }
}

/// Write `body` to `path`, failing with `AlreadyExists` instead of
/// replacing a file that appeared since the existence check.
async fn write_new(path: &Path, body: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path).await?;
    file.write_all(body).await?;
    file.flush().await
}

/// Fetch every listed game page that is not on disk yet, batch by batch.
#[instrument(level = "info", skip_all, fields(output_dir = %options.output_dir.display()))]
pub async fn run<F: Fetcher>(
    fetcher: &F,
    config: &Config,
    options: &GameDetailsOptions,
) -> Result<RunReport, Box<dyn Error>> {
    let urls = load_urls(&options.urls_file).await?;
    fs::create_dir_all(&options.output_dir).await?;
    process_urls(fetcher, config, &urls, &options.output_dir, options.start).await
}

/// The batch loop over an in-memory URL list.
///
/// # Arguments
///
/// * `urls` - Site-relative game paths
/// * `output_dir` - Existing directory the pages are saved into
/// * `start` - Index of the first URL; values past the end process nothing
///
/// # Returns
///
/// The run's counters, or an error when the configured batch size is zero.
/// Individual URL failures never abort the run.
pub async fn process_urls<F: Fetcher>(
    fetcher: &F,
    config: &Config,
    urls: &[String],
    output_dir: &Path,
    start: usize,
) -> Result<RunReport, Box<dyn Error>> {
    let mut report = RunReport::start("game-details");
    let total = urls.len();
    config.validate()?;
    let batch_size = config.batch_size;
    let start = start.min(total);
    info!(total, start, batch_size, "Processing game URLs");

    for (batch_index, batch) in urls[start..].chunks(batch_size).enumerate() {
        let first = start + batch_index * batch_size;
        info!(
            batch = first / batch_size + 1,
            from = first + 1,
            to = first + batch.len(),
            total,
            "Processing batch"
        );

        let outcomes = join_all(batch.iter().enumerate().map(|(offset, url)| async move {
            debug!(position = first + offset + 1, total, %url, "Starting");
            fetch_and_save(fetcher, config, url, output_dir).await
        }))
        .await;

        for outcome in &outcomes {
            outcome.record(&mut report);
        }

        pause(config.delays.page(), config.delays.jitter_ms).await;
    }

    info!("All game details have been processed");
    report.log_finished();
    Ok(report)
}
