//! Error types for callback delivery.

use thiserror::Error;

use super::EndpointKind;

/// A downstream callback was not delivered.
///
/// Fatal only for the record-level callback; per-item callers log and count it.
#[derive(Debug, Error)]
pub enum CallbackError {
    /// Transport failure.
    #[error("network error posting {kind} callback to {url}: {source}")]
    Network {
        /// Target endpoint.
        kind: EndpointKind,
        /// Target URL.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint did not answer within the call timeout.
    #[error("timeout posting {kind} callback to {url}")]
    Timeout {
        /// Target endpoint.
        kind: EndpointKind,
        /// Target URL.
        url: String,
    },

    /// The endpoint rejected the callback.
    #[error("{kind} callback to {url} rejected with HTTP {status}")]
    HttpStatus {
        /// Target endpoint.
        kind: EndpointKind,
        /// Target URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The HTTP client for callbacks could not be built.
    #[error("failed to build callback HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl CallbackError {
    /// Maps a reqwest transport error, separating timeouts.
    pub fn from_transport(kind: EndpointKind, url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { kind, url }
        } else {
            Self::Network { kind, url, source }
        }
    }

    /// True when the endpoint answered with an error status, so the callback
    /// was definitely not accepted.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::HttpStatus { .. })
    }

    /// True when the endpoint rejected the bearer credential.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::HttpStatus { status: 401, .. })
    }
}
