//! Error types for credential acquisition.

use thiserror::Error;

/// Errors raised while obtaining a callback credential.
///
/// Every variant is fatal to the job that needed the credential.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Transport failure talking to the token endpoint.
    #[error("network error requesting token from {url}: {source}")]
    Network {
        /// Token endpoint.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The token endpoint did not answer in time.
    #[error("timeout requesting token from {url}")]
    Timeout {
        /// Token endpoint.
        url: String,
    },

    /// The token endpoint rejected the exchange.
    #[error("token endpoint {url} returned HTTP {status}")]
    HttpStatus {
        /// Token endpoint.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The token endpoint answered 2xx without a usable access token.
    #[error("invalid token response from {url}: {reason}")]
    InvalidResponse {
        /// Token endpoint.
        url: String,
        /// What was wrong with the body.
        reason: String,
    },

    /// The HTTP client for the token endpoint could not be built.
    #[error("failed to build token HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl CredentialError {
    /// Maps a reqwest transport error, separating timeouts.
    pub fn from_transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else {
            Self::Network { url, source }
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
