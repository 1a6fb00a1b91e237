//! Document downloads with a cookie-priming fallback.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::cookie::Jar;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, REFERER};
use reqwest::{Client, RequestBuilder, Response};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::FetchError;
use super::classify::{FetchOutcome, classify_response, origin_of};
use super::filename::effective_content_type;
use crate::http_client::{ClientOptions, build_http_client};
use crate::user_agent::{BROWSER_USER_AGENT, DOCUMENT_ACCEPT};

/// Default timeout for one document download.
pub const DOWNLOAD_TIMEOUT_SECS: u64 = 60;

/// Raw result of a document download. The caller names the file.
#[derive(Debug, Clone)]
pub struct Download {
    /// Declared content type, if any.
    pub content_type: Option<String>,
    /// Response body.
    pub payload: Vec<u8>,
    /// URL after redirects.
    pub final_url: Url,
    /// Whether the cookie-priming fallback was needed.
    pub primed: bool,
}

/// A named document ready to relay. Transient; never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDocument {
    /// Name presented downstream.
    pub file_name: String,
    /// Content type, defaulted when the host declared none.
    pub content_type: String,
    /// Document bytes.
    pub payload: Vec<u8>,
}

impl FetchedDocument {
    /// Names a download.
    #[must_use]
    pub fn from_download(download: Download, file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: effective_content_type(download.content_type.as_deref()),
            payload: download.payload,
        }
    }

    /// Base64 transport encoding of the payload.
    #[must_use]
    pub fn base64_payload(&self) -> String {
        STANDARD.encode(&self.payload)
    }
}

/// Downloads documents from registry hosts.
///
/// Requests present as a browser. A response classified as
/// [`FetchOutcome::Blocked`] triggers exactly one cookie-primed retry with a
/// fresh cookie jar; nothing is shared between calls.
#[derive(Debug, Clone)]
pub struct DocumentFetcher {
    client: Client,
    options: ClientOptions,
}

impl DocumentFetcher {
    /// Creates a fetcher with the default download timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
    }

    /// Creates a fetcher with an explicit per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the HTTP client cannot be built.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let options = ClientOptions::new(BROWSER_USER_AGENT, timeout);
        let client = build_http_client(&options, None).map_err(FetchError::Client)?;
        Ok(Self { client, options })
    }

    /// Fetches `url`, falling back to a cookie-primed retry when blocked.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidUrl`] for malformed or non-http(s) URLs
    /// - [`FetchError::HttpStatus`] for plain error statuses (no priming)
    /// - [`FetchError::DocumentUnavailable`] when the primed retry is still blocked
    /// - [`FetchError::Network`] / [`FetchError::Timeout`] on transport failure
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch(&self, url: &str) -> Result<Download, FetchError> {
        let parsed = parse_document_url(url)?;
        let response = send(browser_request(&self.client, parsed.clone()), url).await?;
        let status = response.status();
        let content_type = content_type_of(&response);

        match classify_response(status, content_type.as_deref()) {
            FetchOutcome::Ok => read_download(response, content_type, url, false).await,
            FetchOutcome::Unavailable => Err(FetchError::http_status(url, status.as_u16())),
            FetchOutcome::Blocked => {
                info!(
                    status = status.as_u16(),
                    content_type = content_type.as_deref().unwrap_or("none"),
                    "document blocked; priming cookies"
                );
                let origin = origin_of(&parsed).ok_or_else(|| FetchError::invalid_url(url))?;
                self.fetch_primed(&parsed, &origin).await
            }
        }
    }

    /// Primes session cookies at `origin` and retries `url` once with them.
    ///
    /// # Errors
    ///
    /// Same as [`fetch`](Self::fetch); a still-blocked retry is
    /// [`FetchError::DocumentUnavailable`].
    #[instrument(skip(self, url), fields(url = %url, origin = %origin))]
    pub async fn fetch_primed(&self, url: &Url, origin: &str) -> Result<Download, FetchError> {
        let jar = Arc::new(Jar::default());
        let client = build_http_client(&self.options, Some(jar)).map_err(FetchError::Client)?;
        let origin_root = format!("{origin}/");

        // Priming failures are not fatal; the retry decides.
        match browser_request(&client, &origin_root).send().await {
            Ok(response) => {
                debug!(status = response.status().as_u16(), "origin primed");
            }
            Err(e) => {
                warn!(error = %e, "cookie priming request failed; retrying without cookies");
            }
        }

        let url_str = url.as_str();
        let response = send(
            browser_request(&client, url.clone()).header(REFERER, origin_root.as_str()),
            url_str,
        )
        .await?;
        let status = response.status();
        let content_type = content_type_of(&response);

        match classify_response(status, content_type.as_deref()) {
            FetchOutcome::Ok => read_download(response, content_type, url_str, true).await,
            FetchOutcome::Blocked => Err(FetchError::document_unavailable(
                url_str,
                status.as_u16(),
                content_type.as_deref(),
            )),
            FetchOutcome::Unavailable => Err(FetchError::http_status(url_str, status.as_u16())),
        }
    }
}

fn parse_document_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;
    if matches!(parsed.scheme(), "http" | "https") {
        Ok(parsed)
    } else {
        Err(FetchError::invalid_url(url))
    }
}

fn browser_request(client: &Client, url: impl reqwest::IntoUrl) -> RequestBuilder {
    client
        .get(url)
        .header(ACCEPT, DOCUMENT_ACCEPT)
        .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
}

async fn send(request: RequestBuilder, url: &str) -> Result<Response, FetchError> {
    request
        .send()
        .await
        .map_err(|e| FetchError::from_transport(url, e))
}

fn content_type_of(response: &Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

async fn read_download(
    response: Response,
    content_type: Option<String>,
    url: &str,
    primed: bool,
) -> Result<Download, FetchError> {
    let final_url = response.url().clone();
    let payload = response
        .bytes()
        .await
        .map_err(|e| FetchError::from_transport(url, e))?
        .to_vec();
    info!(bytes = payload.len(), primed, "document fetched");
    Ok(Download {
        content_type,
        payload,
        final_url,
        primed,
    })
}
