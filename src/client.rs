//! HTTP plumbing shared by the fetch flows.
//!
//! slotcatalog.com answers its AJAX endpoints only when the request looks
//! like it came from the site's own pages, so every request carries one of
//! three browser-like header profiles plus a per-request `Referer` and
//! `cookie`.
//!
//! # Architecture
//!
//! - [`Fetcher`]: the seam between flows and the network
//! - [`HttpFetcher`]: the reqwest-backed implementation
//! - [`PageRequest`] / [`FetchedPage`]: plain request/response values, so
//!   flows can be exercised against a scripted fetcher in tests

use crate::config::Config;
use reqwest::StatusCode;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONTENT_TYPE, COOKIE, HeaderMap, HeaderName,
    HeaderValue, REFERER, UPGRADE_INSECURE_REQUESTS,
};
use std::error::Error;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};
use url::Url;

const ACCEPT_LANGUAGE_VALUE: &str = "zh-CN,zh;q=0.9,en;q=0.8,zh-TW;q=0.7,ja;q=0.6";
const SEC_CH_UA: &str =
    "\"Chromium\";v=\"134\", \"Not:A-Brand\";v=\"24\", \"Google Chrome\";v=\"134\"";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";
const DOCUMENT_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7";

/// The browser context a request imitates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderProfile {
    /// XHR posting a urlencoded form (listing "load more" endpoints).
    AjaxForm,
    /// XHR fetching an HTML fragment.
    AjaxGet,
    /// Top-level navigation to a full page.
    Document,
}

impl HeaderProfile {
    /// Build the header set for this profile.
    ///
    /// Fails only when `referer` or `cookie` contain bytes that are not
    /// valid in a header value.
    pub fn headers(&self, referer: &str, cookie: Option<&str>) -> Result<HeaderMap, Box<dyn Error>> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));
        headers.insert(HeaderName::from_static("sec-ch-ua"), HeaderValue::from_static(SEC_CH_UA));
        headers.insert(HeaderName::from_static("sec-ch-ua-mobile"), HeaderValue::from_static("?0"));
        headers.insert(
            HeaderName::from_static("sec-ch-ua-platform"),
            HeaderValue::from_static("\"macOS\""),
        );
        headers.insert(
            HeaderName::from_static("sec-fetch-site"),
            HeaderValue::from_static("same-origin"),
        );
        headers.insert(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        );

        match self {
            HeaderProfile::AjaxForm | HeaderProfile::AjaxGet => {
                let accept = if *self == HeaderProfile::AjaxForm {
                    "*/*"
                } else {
                    "text/html, */*; q=0.01"
                };
                headers.insert(ACCEPT, HeaderValue::from_static(accept));
                headers.insert(HeaderName::from_static("priority"), HeaderValue::from_static("u=1, i"));
                headers.insert(HeaderName::from_static("sec-fetch-dest"), HeaderValue::from_static("empty"));
                headers.insert(HeaderName::from_static("sec-fetch-mode"), HeaderValue::from_static("cors"));
                headers.insert(
                    HeaderName::from_static("x-requested-with"),
                    HeaderValue::from_static("XMLHttpRequest"),
                );
                if *self == HeaderProfile::AjaxForm {
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
                }
            }
            HeaderProfile::Document => {
                headers.insert(ACCEPT, HeaderValue::from_static(DOCUMENT_ACCEPT));
                headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
                headers.insert(HeaderName::from_static("priority"), HeaderValue::from_static("u=0, i"));
                headers.insert(HeaderName::from_static("sec-fetch-dest"), HeaderValue::from_static("document"));
                headers.insert(HeaderName::from_static("sec-fetch-mode"), HeaderValue::from_static("navigate"));
                headers.insert(HeaderName::from_static("sec-fetch-user"), HeaderValue::from_static("?1"));
                headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
            }
        }

        headers.insert(REFERER, HeaderValue::from_str(referer)?);
        if let Some(cookie) = cookie.filter(|c| !c.is_empty()) {
            headers.insert(COOKIE, HeaderValue::from_str(cookie)?);
        }
        Ok(headers)
    }
}

/// A single request against the site.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub url: String,
    /// Form body; its presence turns the request into a POST.
    pub form: Option<String>,
    pub profile: HeaderProfile,
    pub referer: String,
    pub cookie: Option<String>,
}

impl PageRequest {
    pub fn get(url: impl Into<String>, profile: HeaderProfile, referer: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            form: None,
            profile,
            referer: referer.into(),
            cookie: None,
        }
    }

    pub fn post_form(url: impl Into<String>, form: impl Into<String>, referer: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            form: Some(form.into()),
            profile: HeaderProfile::AjaxForm,
            referer: referer.into(),
            cookie: None,
        }
    }

    pub fn with_cookie(mut self, cookie: Option<String>) -> Self {
        self.cookie = cookie;
        self
    }
}

/// Resolve a site-relative path (or an absolute URL) against `base`.
///
/// # Arguments
///
/// * `base` - Scheme and host from [`Config::base_url`]
/// * `path` - Site-relative path such as `/en/slots/Sweet-Bonanza`; an
///   absolute URL replaces `base` entirely
///
/// # Returns
///
/// The joined URL, or an error when `base` is not a valid URL.
pub fn site_url(base: &str, path: &str) -> Result<String, Box<dyn Error>> {
    Ok(Url::parse(base)?.join(path)?.to_string())
}

/// Status and body of a completed request.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: StatusCode,
    pub body: String,
}

impl FetchedPage {
    #[cfg(test)]
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.into(),
        }
    }
}

/// Something that can execute a [`PageRequest`].
///
/// Non-2xx statuses are returned as [`FetchedPage`]s, not errors; only
/// transport failures surface as `Err`.
pub trait Fetcher {
    async fn fetch(&self, request: &PageRequest) -> Result<FetchedPage, Box<dyn Error>>;
}

/// [`Fetcher`] backed by a shared `reqwest::Client`.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpFetcher").finish_non_exhaustive()
    }
}

impl HttpFetcher {
    pub fn new(config: &Config) -> Result<Self, Box<dyn Error>> {
        let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs));
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl Fetcher for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(url = %request.url))]
    async fn fetch(&self, request: &PageRequest) -> Result<FetchedPage, Box<dyn Error>> {
        let t0 = Instant::now();
        let headers = request.profile.headers(&request.referer, request.cookie.as_deref())?;
        let builder = match &request.form {
            Some(form) => self.client.post(&request.url).body(form.clone()),
            None => self.client.get(&request.url),
        };

        let response = match builder.headers(headers).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(elapsed_ms = t0.elapsed().as_millis(), error = %e, "Request failed");
                return Err(e.into());
            }
        };
        let status = response.status();
        let body = response.text().await?;
        debug!(
            %status,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "Fetched page"
        );
        Ok(FetchedPage { status, body })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! A [`Fetcher`] that answers from a closure and records every request.

    use super::*;
    use std::sync::Mutex;

    pub struct ScriptedFetcher<F> {
        respond: F,
        pub requests: Mutex<Vec<PageRequest>>,
    }

    impl<F> ScriptedFetcher<F>
    where
        F: Fn(&PageRequest) -> Result<FetchedPage, String>,
    {
        pub fn new(respond: F) -> Self {
            Self {
                respond,
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn urls(&self) -> Vec<String> {
            self.requests.lock().unwrap().iter().map(|r| r.url.clone()).collect()
        }

        pub fn requests(&self) -> Vec<PageRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl<F> Fetcher for ScriptedFetcher<F>
    where
        F: Fn(&PageRequest) -> Result<FetchedPage, String>,
    {
        async fn fetch(&self, request: &PageRequest) -> Result<FetchedPage, Box<dyn Error>> {
            self.requests.lock().unwrap().push(request.clone());
            // Yield so batch members genuinely interleave.
            tokio::task::yield_now().await;
            (self.respond)(request).map_err(Into::into)
        }
    }
}
