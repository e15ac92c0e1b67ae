//! Error types for the scraping pipeline and the save layer.
//!
//! Only the fetch tier can fail a scrape. Extraction never fails; it degrades
//! field by field and records how in [`crate::models::ExtractionReport`].

use thiserror::Error;

/// Anything that can go wrong while retrieving the raw HTML.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The input could not be parsed as an absolute http(s) URL.
    #[error("invalid URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The request did not complete within the configured timeout.
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    /// The server answered with a non-success status.
    #[error("HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    /// Connection, TLS or body decoding failure.
    #[error("network error: {0}")]
    Network(String),

    /// The HTTP client itself could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Failure of a whole pipeline invocation.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Failed to scrape article: {0}")]
    Fetch(#[from] FetchError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised while persisting an article under a namespace.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("invalid namespace `{0}`: only ASCII letters, digits, `_` and `-` are allowed")]
    InvalidNamespace(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize article: {0}")]
    Serialize(#[from] serde_json::Error),
}
