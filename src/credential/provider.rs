//! Password-grant credential provider.

use std::fmt;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::{Credential, CredentialError, CredentialSource};
use crate::http_client::{ClientOptions, build_http_client};
use crate::user_agent;

/// Default timeout for the token exchange.
pub const TOKEN_TIMEOUT_SECS: u64 = 30;

/// Client identity and user credentials for the password grant.
#[derive(Clone)]
pub struct PasswordGrantConfig {
    /// Token endpoint.
    pub token_url: Url,
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Integration user name.
    pub username: String,
    /// Integration user password.
    pub password: String,
}

impl fmt::Debug for PasswordGrantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordGrantConfig")
            .field("token_url", &self.token_url.as_str())
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    instance_url: Option<String>,
}

/// Acquires callback credentials with a password-grant exchange and caches
/// the latest one.
#[derive(Debug)]
pub struct PasswordGrantProvider {
    client: Client,
    config: PasswordGrantConfig,
    cached: RwLock<Option<Credential>>,
}

impl PasswordGrantProvider {
    /// Creates a provider with the default token timeout.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Client`] if the HTTP client cannot be built.
    pub fn new(config: PasswordGrantConfig) -> Result<Self, CredentialError> {
        Self::with_timeout(config, Duration::from_secs(TOKEN_TIMEOUT_SECS))
    }

    /// Creates a provider with an explicit token timeout.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Client`] if the HTTP client cannot be built.
    pub fn with_timeout(
        config: PasswordGrantConfig,
        timeout: Duration,
    ) -> Result<Self, CredentialError> {
        let options = ClientOptions::new(user_agent::default_api_user_agent(), timeout);
        let client = build_http_client(&options, None).map_err(CredentialError::Client)?;
        Ok(Self {
            client,
            config,
            cached: RwLock::new(None),
        })
    }

    fn cached(&self) -> Option<Credential> {
        self.cached.read().ok().and_then(|guard| guard.clone())
    }

    fn store(&self, credential: &Credential) {
        match self.cached.write() {
            Ok(mut guard) => *guard = Some(credential.clone()),
            Err(_) => warn!("credential cache lock poisoned; token not cached"),
        }
    }

    async fn exchange(&self) -> Result<Credential, CredentialError> {
        let url = self.config.token_url.as_str();
        let form = [
            ("grant_type", "password"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];

        let response = self
            .client
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(|e| CredentialError::from_transport(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CredentialError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| CredentialError::invalid_response(url, e.to_string()))?;

        let token = body
            .access_token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| CredentialError::invalid_response(url, "missing access_token"))?;

        debug!(instance_url = ?body.instance_url, "token exchange succeeded");
        Ok(Credential::new(token))
    }
}

#[async_trait]
impl CredentialSource for PasswordGrantProvider {
    async fn current(&self) -> Result<Credential, CredentialError> {
        if let Some(credential) = self.cached() {
            return Ok(credential);
        }
        self.acquire().await
    }

    #[instrument(skip(self), fields(token_url = %self.config.token_url))]
    async fn acquire(&self) -> Result<Credential, CredentialError> {
        let credential = self.exchange().await?;
        self.store(&credential);
        info!("acquired callback credential");
        Ok(credential)
    }
}
