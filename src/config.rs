//! Runtime configuration loaded from an optional YAML file.
//!
//! Every field has a default so the scraper runs without a config file. The
//! file is only needed to supply session cookies (the site sits behind
//! Cloudflare, so `cf_clearance`/`PHPSESSID` values must come from a browser
//! session) or to tune throttling.
//!
//! # Example
//!
//! ```yaml
//! base_url: https://slotcatalog.com
//! batch_size: 10
//! delays:
//!   page_ms: 1000
//!   provider_ms: 2000
//!   error_cooldown_ms: 2000
//!   jitter_ms: 250
//! cookies:
//!   provider_games: "PHPSESSID=...; cf_clearance=..."
//!   best_session_id: "uk1encj3ur5f2rlmt5trvnbt0q"
//! ```

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

/// Top-level configuration shared by every flow.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Scheme and host prepended to site-relative paths.
    pub base_url: String,
    /// Optional `User-Agent` header; reqwest's default is used when unset.
    pub user_agent: Option<String>,
    /// Number of game detail pages fetched concurrently.
    pub batch_size: usize,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    pub delays: Delays,
    pub cookies: Cookies,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://slotcatalog.com".to_string(),
            user_agent: None,
            batch_size: 10,
            timeout_secs: 30,
            delays: Delays::default(),
            cookies: Cookies::default(),
        }
    }
}

/// Throttling intervals, in milliseconds.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Delays {
    /// Pause after each page, country or detail batch.
    pub page_ms: u64,
    /// Pause between two providers in the provider game lister.
    pub provider_ms: u64,
    /// Pause taken by a detail fetch after a transport error.
    pub error_cooldown_ms: u64,
    /// Upper bound of random jitter added to every pause.
    pub jitter_ms: u64,
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            page_ms: 1000,
            provider_ms: 2000,
            error_cooldown_ms: 2000,
            jitter_ms: 0,
        }
    }
}

impl Delays {
    pub fn page(&self) -> Duration {
        Duration::from_millis(self.page_ms)
    }

    pub fn provider(&self) -> Duration {
        Duration::from_millis(self.provider_ms)
    }

    pub fn error_cooldown(&self) -> Duration {
        Duration::from_millis(self.error_cooldown_ms)
    }

    /// A configuration with every pause disabled.
    #[cfg(test)]
    pub fn none() -> Self {
        Self {
            page_ms: 0,
            provider_ms: 0,
            error_cooldown_ms: 0,
            jitter_ms: 0,
        }
    }
}

/// Raw `cookie` header values, one per flow.
///
/// The best-games flow builds its cookie from a session id and the country
/// code, so it only takes the session id.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Cookies {
    pub provider_games: Option<String>,
    pub best_session_id: Option<String>,
    pub game_details: Option<String>,
    pub provider_list: Option<String>,
}

impl Config {
    /// Parse a configuration from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, Box<dyn Error>> {
        let config: Config = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no flow can run with.
    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        if self.batch_size == 0 {
            return Err("batch_size must be at least 1".into());
        }
        Ok(())
    }

    /// Apply a command-line batch size over the configured one.
    ///
    /// # Arguments
    ///
    /// * `batch_size` - Override from `--batch-size`; `None` keeps the current value
    ///
    /// # Returns
    ///
    /// The updated configuration, or an error when the override is zero.
    pub fn with_batch_size(mut self, batch_size: Option<usize>) -> Result<Self, Box<dyn Error>> {
        if let Some(batch_size) = batch_size {
            self.batch_size = batch_size;
        }
        self.validate()?;
        Ok(self)
    }

    /// Load the configuration file at `path`, or the defaults when no path is given.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&str>) -> Result<Self, Box<dyn Error>> {
        let Some(path) = path else {
            info!("No config file given; using defaults");
            return Ok(Self::default());
        };
        if !Path::new(path).exists() {
            return Err(format!("config file not found: {path}").into());
        }
        let text = tokio::fs::read_to_string(path).await?;
        let config = Self::from_yaml(&text)?;
        info!(path, base_url = %config.base_url, batch_size = config.batch_size, "Loaded configuration");
        Ok(config)
    }
}
