//! Error types for document fetching.
//!
//! Every variant is isolated to the one document being fetched: the relay
//! answers any of them with a URL-only fallback callback.

use thiserror::Error;

/// Errors that can occur while fetching a document.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, TLS, too many redirects).
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response other than an auth challenge.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The provided URL is malformed or not http(s).
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The host kept answering with a challenge page after cookie priming.
    #[error("document unavailable at {url}: HTTP {status} ({content_type}) after cookie priming")]
    DocumentUnavailable {
        /// The document URL.
        url: String,
        /// Status of the primed retry.
        status: u16,
        /// Declared content type of the primed retry.
        content_type: String,
    },

    /// The HTTP client could not be built.
    #[error("failed to build document HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl FetchError {
    /// Maps a reqwest transport error, separating timeouts.
    pub fn from_transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else {
            Self::Network { url, source }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a document-unavailable error.
    pub fn document_unavailable(
        url: impl Into<String>,
        status: u16,
        content_type: Option<&str>,
    ) -> Self {
        Self::DocumentUnavailable {
            url: url.into(),
            status,
            content_type: content_type.unwrap_or("none").to_string(),
        }
    }
}
