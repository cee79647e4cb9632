//! Offline extraction of structured data from saved HTML.
//!
//! # Submodules
//!
//! - [`games`]: slot cards from provider listings and best-games rankings
//! - [`countries`]: country codes from the ranking page's country selector
//! - [`provider_details`]: attribute tables from provider pages
//!
//! Selectors are compiled once into `Lazy` statics; text is read with
//! [`element_text`], which collapses runs of whitespace the way a browser
//! renders them.

pub mod countries;
pub mod games;
pub mod provider_details;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Concatenated text of an element with whitespace runs collapsed and trimmed.
pub fn element_text(element: &ElementRef<'_>) -> String {
    let raw = element.text().collect::<String>();
    WHITESPACE.replace_all(raw.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    #[test]
    fn test_element_text_collapses_whitespace() {
        let html = Html::parse_fragment("<div>  RTP:\n\t <b>96.5%</b>  </div>");
        let selector = Selector::parse("div").unwrap();
        let div = html.select(&selector).next().unwrap();
        assert_eq!(element_text(&div), "RTP: 96.5%");
    }
}
