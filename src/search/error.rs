//! Error types for the search poller.

use thiserror::Error;

/// Upstream search failures. All variants are fatal to the job.
///
/// Exhausting the poll budget is not an error; see
/// [`PollOutcome::Exhausted`](super::PollOutcome::Exhausted).
#[derive(Debug, Error)]
pub enum SearchError {
    /// Transport failure (DNS, connection refused, TLS).
    #[error("network error calling search API {url}: {source}")]
    Network {
        /// Request URL without the API key.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The search API did not answer within the call timeout.
    #[error("timeout calling search API {url}")]
    Timeout {
        /// Request URL.
        url: String,
    },

    /// Non-2xx response without a continuation token in its body.
    #[error("search API {url} returned HTTP {status}")]
    HttpStatus {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// 2xx response whose body is not usable JSON.
    #[error("invalid search API response from {url}: {reason}")]
    InvalidResponse {
        /// Request URL.
        url: String,
        /// Parse failure detail.
        reason: String,
    },

    /// The HTTP client for the search API could not be built.
    #[error("failed to build search HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl SearchError {
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

    /// Creates an invalid-response error.
    pub fn invalid_response(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            url: url.into(),
            reason: reason.into(),
        }
    }
}
