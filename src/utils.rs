//! Small helpers for throttling, path derivation and file system checks.
//!
//! - Throttled pauses with optional jitter
//! - Filename and slug derivation from site paths
//! - Directory listing and validation for output directories
//! - String truncation for logging

use rand::{Rng, rng};
use std::error::Error;
use std::fs as stdfs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info, instrument};

/// Sleep for `base` plus a random `0..=jitter_ms` milliseconds.
///
/// A zero base with zero jitter returns immediately.
pub async fn pause(base: Duration, jitter_ms: u64) {
    let jitter = if jitter_ms > 0 {
        Duration::from_millis(rng().random_range(0..=jitter_ms))
    } else {
        Duration::ZERO
    };
    let delay = base + jitter;
    if delay.is_zero() {
        return;
    }
    debug!(?delay, "Throttling");
    tokio::time::sleep(delay).await;
}

/// Last non-empty `/` segment of a site path or URL.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(last_segment("/en/soft/Pragmatic-Play"), Some("Pragmatic-Play"));
/// assert_eq!(last_segment("/en/slots/Sweet-Bonanza/"), Some("Sweet-Bonanza"));
/// assert_eq!(last_segment("/"), None);
/// ```
pub fn last_segment(path: &str) -> Option<&str> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.rsplit('/').find(|segment| !segment.is_empty())
}

/// File name a game detail page is stored under: `<last segment>.html`.
pub fn detail_file_name(path: &str) -> Option<String> {
    last_segment(path).map(|name| format!("{name}.html"))
}

/// Shorten a response body for a log line.
///
/// Bodies longer than `max` bytes are cut at the nearest char boundary
/// below `max` and suffixed with the number of bytes dropped.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Read a line-oriented list, trimming each line and dropping blanks.
pub async fn read_lines(path: &Path) -> Result<Vec<String>, Box<dyn Error>> {
    let text = fs::read_to_string(path).await?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Files directly inside `dir` with the given extension, sorted by name.
pub async fn files_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Create `path` if needed and prove it accepts new files.
///
/// Fetch flows call this before their first request so a bad output
/// directory fails the run up front instead of after the first download.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe = path.join("..__probe_write__");
    stdfs::File::create(&probe)?;
    if let Err(e) = stdfs::remove_file(&probe) {
        debug!(probe = %probe.display(), error = %e, "Could not remove write probe");
    }
    info!("Output directory ready");
    Ok(())
}
