//! Provider attribute tables.
//!
//! Provider pages summarise the company in a two-column table inside
//! `div.provFormalAttr` (`th.propLeft` label, `td.propRight` value) next to
//! a logo in `div.provider-page-scr`.

use super::element_text;
use crate::models::{AttributeValue, ProviderDetail};
use crate::utils::files_with_extension;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{debug, error, info, instrument};

static ATTRIBUTE_TABLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.provFormalAttr table").expect("valid selector"));
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("valid selector"));
static LABEL: Lazy<Selector> = Lazy::new(|| Selector::parse("th.propLeft").expect("valid selector"));
static VALUE: Lazy<Selector> = Lazy::new(|| Selector::parse("td.propRight").expect("valid selector"));
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("valid selector"));
static LOGO: Lazy<Selector> = Lazy::new(|| Selector::parse("div.provider-page-scr img").expect("valid selector"));

/// Provider name encoded in a details file name: `NetEnt_details.html` -> `NetEnt`.
pub fn provider_name_from_file(file_name: &str) -> &str {
    let before_dot = file_name.split('.').next().unwrap_or_default();
    before_dot.split('_').next().unwrap_or_default()
}

/// Extract the attribute table of one provider page.
///
/// Returns `None` when the page has no attribute table or no usable row.
pub fn extract_provider_detail(html: &str, name: &str) -> Option<ProviderDetail> {
    let document = Html::parse_document(html);
    let table = document.select(&ATTRIBUTE_TABLE).next()?;

    let mut detail = ProviderDetail {
        name: name.to_string(),
        ..Default::default()
    };
    for row in table.select(&ROW) {
        let (Some(label), Some(cell)) = (row.select(&LABEL).next(), row.select(&VALUE).next()) else {
            continue;
        };
        let key = element_text(&label).trim_end_matches(':').trim().to_string();
        let value = match cell.select(&LINK).next() {
            Some(link) => AttributeValue::Link {
                text: element_text(&link),
                href: link.value().attr("href").unwrap_or_default().to_string(),
            },
            None => AttributeValue::Text(element_text(&cell)),
        };
        detail.attributes.insert(key, value);
    }
    if detail.attributes.is_empty() {
        return None;
    }

    detail.logo = document
        .select(&LOGO)
        .next()
        .map(|img| img.value().attr("src").unwrap_or_default().to_string());
    Some(detail)
}

/// Extract details from every `*.html` in `details_dir`.
#[instrument(level = "info", skip_all, fields(details_dir = %details_dir.display()))]
pub async fn parse_provider_details(details_dir: &Path) -> Result<Vec<ProviderDetail>, Box<dyn Error>> {
    let mut details = Vec::new();
    for path in files_with_extension(details_dir, "html").await? {
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let name = provider_name_from_file(file_name).to_string();
        match fs::read_to_string(&path).await {
            Ok(html) => match extract_provider_detail(&html, &name) {
                Some(detail) => details.push(detail),
                None => debug!(file = %path.display(), "No attribute table; skipping"),
            },
            Err(e) => error!(file = %path.display(), error = %e, "Error reading provider page"),
        }
    }
    info!(count = details.len(), "Provider details extracted");
    Ok(details)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <div class="provider-page-scr"><img src="/images/netent.png"></div>
        <div class="provFormalAttr">
          <table>
            <tr><th class="propLeft">Founded:</th><td class="propRight"> 1996 </td></tr>
            <tr><th class="propLeft">Website:</th><td class="propRight"><a href="https://netent.com">netent.com</a></td></tr>
            <tr><td>no label</td></tr>
          </table>
        </div>
    "#;

    #[test]
    fn test_provider_name_from_file() {
        assert_eq!(provider_name_from_file("NetEnt_details.html"), "NetEnt");
        assert_eq!(provider_name_from_file("Play-n-GO.html"), "Play-n-GO");
    }

    #[test]
    fn test_extract_provider_detail() {
        let detail = extract_provider_detail(PAGE, "NetEnt").unwrap();
        assert_eq!(detail.name, "NetEnt");
        assert_eq!(detail.logo.as_deref(), Some("/images/netent.png"));
        assert_eq!(detail.attributes["Founded"], AttributeValue::Text("1996".to_string()));
        assert_eq!(
            detail.attributes["Website"],
            AttributeValue::Link {
                text: "netent.com".to_string(),
                href: "https://netent.com".to_string(),
            }
        );
        assert_eq!(detail.attributes.len(), 2);
    }

    #[test]
    fn test_page_without_table_is_skipped() {
        assert!(extract_provider_detail("<div class=\"provFormalAttr\"></div>", "X").is_none());
        assert!(extract_provider_detail("<div class=\"provFormalAttr\"><table></table></div>", "X").is_none());
    }

    #[tokio::test]
    async fn test_parse_provider_details_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("NetEnt_1.html"), PAGE).unwrap();
        std::fs::write(dir.path().join("Empty.html"), "<html></html>").unwrap();

        let details = parse_provider_details(dir.path()).await.unwrap();

        assert_eq!(details.len(), 1);
        assert_eq!(details[0].name, "NetEnt");
    }
}
