//! Shared HTTP client construction policy.
//!
//! Every component builds its reqwest client through [`build_http_client`] so
//! timeouts, redirect limits, compression and cookie handling stay consistent.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder};
use tracing::debug;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default redirect hop limit.
pub const DEFAULT_REDIRECT_LIMIT: usize = 5;

/// Settings for a single reqwest client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// User-Agent header applied to every request.
    pub user_agent: String,
    /// Connect timeout.
    pub connect_timeout: Duration,
    /// Whole-request timeout.
    pub request_timeout: Duration,
    /// Maximum redirect hops followed.
    pub redirect_limit: usize,
}

impl ClientOptions {
    /// Creates options with the default connect timeout and redirect limit.
    #[must_use]
    pub fn new(user_agent: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            user_agent: user_agent.into(),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            request_timeout,
            redirect_limit: DEFAULT_REDIRECT_LIMIT,
        }
    }
}

/// Builds a client from `options`, attaching `cookie_jar` when given.
///
/// # Errors
///
/// Returns the underlying [`reqwest::Error`] when the TLS backend or resolver
/// cannot be initialized.
pub fn build_http_client(
    options: &ClientOptions,
    cookie_jar: Option<Arc<Jar>>,
) -> Result<Client, reqwest::Error> {
    debug!(
        timeout_secs = options.request_timeout.as_secs(),
        redirect_limit = options.redirect_limit,
        cookies = cookie_jar.is_some(),
        "building HTTP client"
    );
    base_builder(options, cookie_jar).build()
}

fn base_builder(options: &ClientOptions, cookie_jar: Option<Arc<Jar>>) -> ClientBuilder {
    let mut builder = Client::builder()
        .connect_timeout(options.connect_timeout)
        .timeout(options.request_timeout)
        .redirect(Policy::limited(options.redirect_limit))
        .gzip(true)
        .user_agent(options.user_agent.clone());
    if let Some(jar) = cookie_jar {
        builder = builder.cookie_provider(jar);
    }
    builder
}
