//! Catalog fetcher
//!
//! Retrieves raw search results from the UN Digital Library in one of its
//! export formats. The HTTP client and the session warm-up are injected so
//! that tests can run without a network.

use async_trait::async_trait;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONNECTION, DNT,
    UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::CatalogConfig,
    error::{AppError, AppResult},
};

/// Query parameter selecting the HTML result page the base URL is expected to carry
const HTML_SELECTOR: &str = "of=hb";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36";
const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7";

/// Catalog export formats, selected by the `of=` query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Html,
    MarcXml,
    Json,
    DublinCore,
    Csv,
    Rss,
}

impl OutputFormat {
    /// Formats offered as alternatives to the HTML result page
    pub const ALTERNATIVES: [OutputFormat; 5] = [
        OutputFormat::MarcXml,
        OutputFormat::Json,
        OutputFormat::DublinCore,
        OutputFormat::Csv,
        OutputFormat::Rss,
    ];

    /// The `of=` query parameter for this format
    pub fn selector(&self) -> &'static str {
        match self {
            OutputFormat::Html => HTML_SELECTOR,
            OutputFormat::MarcXml => "of=xm",
            OutputFormat::Json => "of=recjson",
            OutputFormat::DublinCore => "of=xd",
            OutputFormat::Csv => "of=xe",
            OutputFormat::Rss => "of=xr",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::MarcXml => "marcxml",
            OutputFormat::Json => "json",
            OutputFormat::DublinCore => "dublin_core",
            OutputFormat::Csv => "csv",
            OutputFormat::Rss => "rss",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "html" | "hb" => Ok(OutputFormat::Html),
            "marcxml" | "xm" => Ok(OutputFormat::MarcXml),
            "json" | "recjson" => Ok(OutputFormat::Json),
            "dublin_core" | "dc" | "xd" => Ok(OutputFormat::DublinCore),
            "csv" | "xe" => Ok(OutputFormat::Csv),
            "rss" | "xr" => Ok(OutputFormat::Rss),
            other => Err(format!("unknown catalog format '{}'", other)),
        }
    }
}

/// Derive the URL for `format` from a search URL in the HTML result format.
///
/// A URL without the HTML selector is returned unchanged.
pub fn format_url(base_url: &str, format: OutputFormat) -> String {
    base_url.replace(HTML_SELECTOR, format.selector())
}

/// Alternative format URLs for a search URL, in fallback order
pub fn alternative_formats(base_url: &str) -> Vec<(OutputFormat, String)> {
    OutputFormat::ALTERNATIVES
        .iter()
        .map(|format| (*format, format_url(base_url, *format)))
        .collect()
}

/// Status and body of an HTTP GET
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Body of a 200 response with content, otherwise a fetch error
    pub fn into_body(self) -> AppResult<String> {
        if self.status == 200 && !self.body.is_empty() {
            Ok(self.body)
        } else {
            Err(AppError::Fetch {
                status_code: self.status,
                body_length: self.body.len(),
            })
        }
    }
}

/// Minimal HTTP client seam
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str) -> AppResult<HttpResponse>;
}

/// `reqwest` client with a cookie store and browser-like default headers
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .default_headers(browser_headers())
            .cookie_store(true)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> AppResult<HttpResponse> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(DNT, HeaderValue::from_static("1"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    for (name, value) in [
        ("sec-fetch-dest", "document"),
        ("sec-fetch-mode", "navigate"),
        ("sec-fetch-site", "none"),
    ] {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    headers
}

/// Hook run before the catalog request
#[async_trait]
pub trait PreFetchHook: Send + Sync {
    async fn before_fetch(&self, client: &dyn HttpClient) -> AppResult<()>;
}

/// Visit the catalog home page, then pause, so the real request carries a session cookie
#[derive(Debug, Clone)]
pub struct WarmUpVisit {
    pub home_url: String,
    pub delay: Duration,
}

impl WarmUpVisit {
    pub fn new(home_url: impl Into<String>, delay: Duration) -> Self {
        Self {
            home_url: home_url.into(),
            delay,
        }
    }
}

#[async_trait]
impl PreFetchHook for WarmUpVisit {
    async fn before_fetch(&self, client: &dyn HttpClient) -> AppResult<()> {
        tracing::info!("Establishing session with {}", self.home_url);
        let response = client.get(&self.home_url).await?;
        tracing::debug!("Warm-up visit answered {}", response.status);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(())
    }
}

/// Fetches catalog search results
pub struct CatalogFetcher {
    client: Arc<dyn HttpClient>,
    pre_fetch: Option<Box<dyn PreFetchHook>>,
}

impl CatalogFetcher {
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self {
            client,
            pre_fetch: None,
        }
    }

    /// Build the production fetcher: reqwest client, warm-up visit when enabled
    pub fn from_config(config: &CatalogConfig) -> AppResult<Self> {
        let client = ReqwestClient::new(Duration::from_secs(config.timeout_secs))?;
        let fetcher = Self::new(Arc::new(client));
        if config.warm_up {
            Ok(fetcher.with_pre_fetch(WarmUpVisit::new(
                config.home_url.clone(),
                Duration::from_millis(config.warm_up_delay_ms),
            )))
        } else {
            Ok(fetcher)
        }
    }

    pub fn with_pre_fetch(mut self, hook: impl PreFetchHook + 'static) -> Self {
        self.pre_fetch = Some(Box::new(hook));
        self
    }

    /// Shared HTTP client, for collaborators that fetch from other hosts
    pub fn client(&self) -> Arc<dyn HttpClient> {
        Arc::clone(&self.client)
    }

    /// Fetch `base_url` in `format`.
    ///
    /// Fails with [`AppError::Fetch`] unless the catalog answers 200 with a
    /// non-empty body. Nothing is retried.
    pub async fn fetch(&self, base_url: &str, format: OutputFormat) -> AppResult<String> {
        let url = format_url(base_url, format);
        tracing::info!("Requesting {} data", format);
        tracing::debug!("Catalog URL: {}", url);

        if let Some(hook) = &self.pre_fetch {
            if let Err(e) = hook.before_fetch(self.client.as_ref()).await {
                tracing::warn!("Pre-fetch hook failed, continuing: {}", e);
            }
        }

        let response = self.client.get(&url).await?;
        tracing::info!(
            "Response status: {}, content length: {}",
            response.status,
            response.body.len()
        );
        tracing::debug!("First 500 chars of response: {}", preview(&response.body, 500));

        response.into_body()
    }
}

fn preview(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}
