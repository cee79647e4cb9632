//! Data models for catalog inputs and extracted records.
//!
//! - [`ProviderEntry`]: one provider from `providers.json`
//! - [`GameCard`]: a game extracted from a listing's slot card
//! - [`ProviderDetail`]: attributes of a provider page
//! - [`SimplifiedGame`]: name and image of a ranked game
//! - [`RunReport`]: counters logged at the end of every fetch flow

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

use crate::utils::last_segment;

/// A provider listed in `providers.json`.
///
/// Only `title` and `href` are read; anything else in the file is ignored.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ProviderEntry {
    pub title: Option<String>,
    #[serde(default)]
    pub href: String,
}

impl ProviderEntry {
    /// The provider's URL slug (`/en/soft/Pragmatic-Play` -> `Pragmatic-Play`).
    pub fn slug(&self) -> Option<&str> {
        last_segment(&self.href)
    }
}

/// A game as it appears in a slot card.
///
/// Property lines (`RTP: 96.5%`, `Volatility: High`, ...) are kept verbatim
/// and flattened next to the fixed fields when serialized.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct GameCard {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(flatten)]
    pub properties: BTreeMap<String, String>,
}

/// A game in a per-country ranking (`all_games_by_country.json`).
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct RankedGame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub properties: BTreeMap<String, String>,
}

impl From<GameCard> for RankedGame {
    fn from(card: GameCard) -> Self {
        Self {
            name: card.name,
            image_url: card.thumbnail,
            url: card.url,
            properties: card.properties,
        }
    }
}

/// Name and image of a ranked game, missing fields as empty strings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SimplifiedGame {
    pub name: String,
    pub image_url: String,
}

/// Value of a provider attribute: plain text, or a link.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum AttributeValue {
    Text(String),
    Link { text: String, href: String },
}

/// Attributes scraped from a provider page, keyed by their label.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ProviderDetail {
    pub name: String,
    #[serde(rename = "Logo", default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, AttributeValue>,
}

/// Outcome counters for one run of a fetch flow.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub flow: &'static str,
    pub started: DateTime<Local>,
    /// Requests issued.
    pub requests: usize,
    /// Files written or appended to.
    pub saved: usize,
    /// Items skipped because their output already existed or was unusable.
    pub skipped: usize,
    pub failed: usize,
}

impl RunReport {
    pub fn start(flow: &'static str) -> Self {
        Self {
            flow,
            started: Local::now(),
            requests: 0,
            saved: 0,
            skipped: 0,
            failed: 0,
        }
    }

    /// Fold the counters of a sub-run (e.g. one provider) into this one.
    pub fn absorb(&mut self, other: &RunReport) {
        self.requests += other.requests;
        self.saved += other.saved;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }

    /// Log the final counters together with the elapsed wall time.
    pub fn log_finished(&self) {
        let elapsed = Local::now() - self.started;
        info!(
            flow = self.flow,
            started = %self.started.to_rfc3339(),
            elapsed_secs = elapsed.num_seconds(),
            requests = self.requests,
            saved = self.saved,
            skipped = self.skipped,
            failed = self.failed,
            "Run finished"
        );
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} requests, {} saved, {} skipped, {} failed",
            self.flow, self.requests, self.saved, self.skipped, self.failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_entry_slug() {
        let entry: ProviderEntry =
            serde_json::from_str(r#"{"title": "Pragmatic Play", "href": "/en/soft/Pragmatic-Play", "rank": 1}"#)
                .unwrap();
        assert_eq!(entry.slug(), Some("Pragmatic-Play"));
    }

    #[test]
    fn test_provider_entry_without_title() {
        let entry: ProviderEntry = serde_json::from_str(r#"{"href": "/en/soft/X"}"#).unwrap();
        assert!(entry.title.is_none());
    }

    #[test]
    fn test_game_card_flattens_properties() {
        let mut card = GameCard {
            name: Some("Sweet Bonanza".to_string()),
            url: Some("/en/slots/Sweet-Bonanza".to_string()),
            ..Default::default()
        };
        card.properties.insert("RTP".to_string(), "96.48%".to_string());

        let value = serde_json::to_value(&card).unwrap();
        assert_eq!(value["name"], "Sweet Bonanza");
        assert_eq!(value["RTP"], "96.48%");
        assert!(value.get("thumbnail").is_none());

        let back: GameCard = serde_json::from_value(value).unwrap();
        assert_eq!(back, card);
    }

    #[test]
    fn test_ranked_game_from_card() {
        let card = GameCard {
            name: Some("Big Bass".to_string()),
            thumbnail: Some("/img/big-bass.jpg".to_string()),
            provider: Some("Pragmatic-Play".to_string()),
            ..Default::default()
        };
        let ranked = RankedGame::from(card);
        assert_eq!(ranked.image_url.as_deref(), Some("/img/big-bass.jpg"));
        assert_eq!(ranked.name.as_deref(), Some("Big Bass"));
    }

    #[test]
    fn test_provider_detail_serialization() {
        let mut detail = ProviderDetail {
            name: "NetEnt".to_string(),
            logo: Some("/logo.png".to_string()),
            ..Default::default()
        };
        detail.attributes.insert("Founded".to_string(), AttributeValue::Text("1996".to_string()));
        detail.attributes.insert(
            "Website".to_string(),
            AttributeValue::Link {
                text: "netent.com".to_string(),
                href: "https://netent.com".to_string(),
            },
        );

        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["Logo"], "/logo.png");
        assert_eq!(value["Founded"], "1996");
        assert_eq!(value["Website"]["href"], "https://netent.com");
    }

    #[test]
    fn test_run_report_absorb_and_display() {
        let mut total = RunReport::start("provider-games");
        let mut part = RunReport::start("provider-games");
        part.requests = 3;
        part.saved = 2;
        part.failed = 1;
        total.absorb(&part);
        total.absorb(&part);
        assert_eq!(
            total.to_string(),
            "provider-games: 6 requests, 4 saved, 0 skipped, 2 failed"
        );
    }
}
