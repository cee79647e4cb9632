//! Provider list fetcher.
//!
//! The provider directory is served 29 pages deep through the filter
//! block endpoint; each page is stored as-is as `page_<n>.html`.

use crate::client::{Fetcher, PageRequest, site_url};
use crate::config::Config;
use crate::models::RunReport;
use crate::utils::{ensure_writable_dir, pause};
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

pub const DEFAULT_PAGES: usize = 29;

#[derive(Debug, Clone)]
pub struct ProviderListOptions {
    pub output_dir: PathBuf,
    pub pages: usize,
    /// Country the provider ranking is computed for.
    pub country: String,
}

/// Build the request for one page of the provider directory.
pub fn directory_request(config: &Config, country: &str, page: usize) -> Result<PageRequest, Box<dyn Error>> {
    let form = format!(
        "blck=fltrProvBlk&ajax=1&lang=en&p={page}&translit=Providers&sorting=PRANK&cISO={}",
        urlencoding::encode(country)
    );
    Ok(PageRequest::post_form(
        site_url(&config.base_url, "/index.php")?,
        form,
        site_url(&config.base_url, "/en/Providers")?,
    )
    .with_cookie(config.cookies.provider_list.clone()))
}

/// Fetch pages `1..=pages` of the provider directory.
///
/// A page that fails is logged and the loop moves on; the pause only
/// follows a saved page.
#[instrument(level = "info", skip_all, fields(output_dir = %options.output_dir.display(), pages = options.pages))]
pub async fn run<F: Fetcher>(
    fetcher: &F,
    config: &Config,
    options: &ProviderListOptions,
) -> Result<RunReport, Box<dyn Error>> {
    let mut report = RunReport::start("provider-list");
    ensure_writable_dir(&options.output_dir).await?;

    for page in 1..=options.pages {
        let request = directory_request(config, &options.country, page)?;
        let fetched = match fetcher.fetch(&request).await {
            Ok(fetched) => fetched,
            Err(e) => {
                error!(page, error = %e, "Error fetching page");
                report.requests += 1;
                report.failed += 1;
                continue;
            }
        };
        report.requests += 1;

        let path = options.output_dir.join(format!("page_{page}.html"));
        match fs::write(&path, fetched.body).await {
            Ok(()) => {
                info!(page, status = %fetched.status, "Saved page");
                report.saved += 1;
                pause(config.delays.page(), config.delays.jitter_ms).await;
            }
            Err(e) => {
                error!(page, path = %path.display(), error = %e, "Error saving page");
                report.failed += 1;
            }
        }
    }

    report.log_finished();
    Ok(report)
}
