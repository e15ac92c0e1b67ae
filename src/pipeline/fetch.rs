//! HTTP fetch stage.
//!
//! One GET per scrape with a browser-like identity and a hard timeout. No
//! retries and no caching: any failure ends the invocation.
//!
//! # Architecture
//!
//! - [`FetchHtml`]: async trait the pipeline is generic over
//! - [`HttpFetcher`]: the `reqwest` implementation used in production

use crate::config::ScraperConfig;
use crate::error::FetchError;
use reqwest::Client;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Raw page returned by a fetcher.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

/// Source of raw HTML for a URL.
pub trait FetchHtml {
    /// Retrieve the page at `url`.
    ///
    /// Implementations must map network errors, timeouts and non-2xx
    /// statuses to [`FetchError`].
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// `reqwest`-backed fetcher. Cheap to share: the inner client is pooled and
/// thread-safe.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout_secs: u64,
}

impl HttpFetcher {
    /// Build a fetcher with the configured timeout and `User-Agent`.
    pub fn new(config: &ScraperConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self {
            client,
            timeout_secs: config.timeout_secs,
        })
    }

    fn classify(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout_secs)
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// Accept only absolute http(s) URLs. The input string itself is never
/// rewritten; the parsed form is only used for the request.
pub fn parse_http_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url.trim()).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FetchError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme `{other}`"),
        }),
    }
}

impl FetchHtml for HttpFetcher {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let target = parse_http_url(url)?;
        let t0 = Instant::now();

        let response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                status = status.as_u16(),
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "Non-success status"
            );
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;
        info!(
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        debug!(preview = %crate::utils::truncate_for_log(&body, 200), "Body preview");

        Ok(FetchedPage {
            status: status.as_u16(),
            body,
        })
    }
}
