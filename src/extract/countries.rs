//! Country codes offered by the best-games ranking.
//!
//! The ranking page carries a `<select name="ucountry">` whose option values
//! are the ISO codes the `ucISO` cookie accepts.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

static COUNTRY_SELECT: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"select[name="ucountry"]"#).expect("valid selector"));
static OPTION: Lazy<Selector> = Lazy::new(|| Selector::parse("option").expect("valid selector"));

/// Non-empty option values of the country selector, in document order.
///
/// Returns `None` when the page has no country selector.
pub fn extract_countries(html: &str) -> Option<Vec<String>> {
    let document = Html::parse_document(html);
    let select = document.select(&COUNTRY_SELECT).next()?;
    Some(
        select
            .select(&OPTION)
            .filter_map(|option| option.value().attr("value"))
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

/// Read a saved ranking page and write its country codes, one per line.
///
/// Nothing is written when the selector is missing or empty.
#[instrument(level = "info", skip_all, fields(html = %html_path.display(), output = %output_path.display()))]
pub async fn save_countries(html_path: &Path, output_path: &Path) -> Result<Vec<String>, Box<dyn Error>> {
    let html = fs::read_to_string(html_path).await?;
    let Some(countries) = extract_countries(&html) else {
        warn!("Country selector not found");
        return Ok(Vec::new());
    };
    if countries.is_empty() {
        warn!("No countries found");
        return Ok(countries);
    }

    let mut lines = countries.join("\n");
    lines.push('\n');
    fs::write(output_path, lines).await?;
    info!(count = countries.len(), "Countries saved");
    Ok(countries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <form>
          <select name="ulang"><option value="en">English</option></select>
          <select name="ucountry">
            <option value="">Choose country</option>
            <option value="CA">Canada</option>
            <option value="DE" selected>Germany</option>
            <option>No value</option>
            <option value="US">United States</option>
          </select>
        </form>
    "#;

    #[test]
    fn test_extract_countries() {
        assert_eq!(extract_countries(PAGE).unwrap(), vec!["CA", "DE", "US"]);
    }

    #[test]
    fn test_extract_countries_without_selector() {
        assert!(extract_countries("<select name=\"other\"></select>").is_none());
    }

    #[tokio::test]
    async fn test_save_countries_round_trips_through_read_lines() {
        let dir = tempfile::tempdir().unwrap();
        let html_path = dir.path().join("best_slots.html");
        let output = dir.path().join("countries.txt");
        std::fs::write(&html_path, PAGE).unwrap();

        save_countries(&html_path, &output).await.unwrap();

        let lines = crate::utils::read_lines(&output).await.unwrap();
        assert_eq!(lines, vec!["CA", "DE", "US"]);
    }

    #[tokio::test]
    async fn test_save_countries_writes_nothing_without_selector() {
        let dir = tempfile::tempdir().unwrap();
        let html_path = dir.path().join("best_slots.html");
        let output = dir.path().join("countries.txt");
        std::fs::write(&html_path, "<p>blocked</p>").unwrap();

        let countries = save_countries(&html_path, &output).await.unwrap();

        assert!(countries.is_empty());
        assert!(!output.exists());
    }
}
