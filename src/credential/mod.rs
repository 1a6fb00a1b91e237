//! Bearer credentials for the downstream callback system.
//!
//! A [`CredentialSource`] hands out the current credential and can be asked to
//! re-acquire one on demand. There is no expiry tracking: callers refresh when
//! a callback is rejected with HTTP 401.
//!
//! Two sources exist:
//! - [`PasswordGrantProvider`] - password-grant exchange against a token endpoint
//! - [`StaticCredential`] - a pre-issued token from configuration

mod error;
mod provider;

use std::fmt;

use async_trait::async_trait;

pub use error::CredentialError;
pub use provider::{PasswordGrantConfig, PasswordGrantProvider};

/// A bearer token for callback requests.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
}

impl Credential {
    /// Wraps a raw access token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Returns the raw access token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }
}

// Tokens never reach logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Source of callback credentials.
///
/// Implementations must tolerate concurrent `acquire` calls; the last
/// acquisition wins.
#[async_trait]
pub trait CredentialSource: Send + Sync + fmt::Debug {
    /// Returns the cached credential, acquiring one on first use.
    async fn current(&self) -> Result<Credential, CredentialError>;

    /// Acquires a fresh credential and replaces the cached one.
    async fn acquire(&self) -> Result<Credential, CredentialError>;
}

/// A fixed, pre-issued bearer token.
#[derive(Debug, Clone)]
pub struct StaticCredential {
    credential: Credential,
}

impl StaticCredential {
    /// Creates a source that always returns `token`.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            credential: Credential::new(token),
        }
    }
}

#[async_trait]
impl CredentialSource for StaticCredential {
    async fn current(&self) -> Result<Credential, CredentialError> {
        Ok(self.credential.clone())
    }

    async fn acquire(&self) -> Result<Credential, CredentialError> {
        Ok(self.credential.clone())
    }
}
