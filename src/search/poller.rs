//! Search API polling with continuation tokens.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::ACCEPT;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::SearchError;
use super::response::{
    BusinessRecord, RETRY_FIELD, SearchResponse, classify_search_payload, continuation_token,
};
use crate::http_client::{ClientOptions, build_http_client};
use crate::job::SearchJob;
use crate::user_agent;

/// Default maximum number of search calls per job (including the first).
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 3;

/// Default fixed delay between search calls.
pub const DEFAULT_POLL_DELAY: Duration = Duration::from_secs(15);

/// Default timeout for a single search call.
pub const SEARCH_TIMEOUT_SECS: u64 = 120;

/// Header carrying the search API key.
const API_KEY_HEADER: &str = "x-api-key";

/// Bounded fixed-delay polling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            delay: DEFAULT_POLL_DELAY,
        }
    }
}

impl PollPolicy {
    /// Creates a policy. `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Maximum number of search calls.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay between calls.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// Search API location and credentials.
#[derive(Clone)]
pub struct SearchApiConfig {
    /// Search endpoint.
    pub endpoint: Url,
    /// Value for the `x-api-key` header.
    pub api_key: String,
    /// Ask the API for live registry data rather than cached records.
    pub live_data: bool,
    /// Per-call timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for SearchApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchApiConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("live_data", &self.live_data)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl SearchApiConfig {
    /// Creates a config with live data on and the default timeout.
    #[must_use]
    pub fn new(endpoint: Url, api_key: impl Into<String>) -> Self {
        Self {
            endpoint,
            api_key: api_key.into(),
            live_data: true,
            timeout: Duration::from_secs(SEARCH_TIMEOUT_SECS),
        }
    }
}

/// How polling ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The API returned a final payload.
    Resolved,
    /// The attempt budget ran out while the API still reported pending.
    Exhausted,
}

/// A search that is safe to dispatch: never pending.
#[derive(Debug, Clone)]
pub struct ResolvedSearch {
    /// Parsed result entries.
    pub records: Vec<BusinessRecord>,
    /// The last payload received, forwarded verbatim in the record callback.
    pub raw: Value,
    /// Number of search calls made.
    pub attempts: u32,
    /// Whether polling resolved or ran out of attempts.
    pub outcome: PollOutcome,
}

impl ResolvedSearch {
    /// Total documents across all records.
    #[must_use]
    pub fn document_count(&self) -> usize {
        self.records.iter().map(|r| r.documents.len()).sum()
    }
}

/// The two mutually exclusive request shapes.
#[derive(Debug, Clone, Copy)]
enum SearchRequest<'a> {
    Fresh { query: &'a str, jurisdiction: &'a str },
    Continuation { token: &'a str },
}

/// Polls the search API until it resolves or the policy is exhausted.
#[derive(Debug, Clone)]
pub struct SearchPoller {
    client: Client,
    config: SearchApiConfig,
    policy: PollPolicy,
}

impl SearchPoller {
    /// Creates a poller.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Client`] if the HTTP client cannot be built.
    pub fn new(config: SearchApiConfig, policy: PollPolicy) -> Result<Self, SearchError> {
        let options = ClientOptions::new(user_agent::default_api_user_agent(), config.timeout);
        let client = build_http_client(&options, None).map_err(SearchError::Client)?;
        Ok(Self {
            client,
            config,
            policy,
        })
    }

    /// Runs the search for `job`.
    ///
    /// Pending payloads are re-polled with their continuation token after the
    /// policy delay. Running out of attempts returns the last payload with
    /// [`PollOutcome::Exhausted`].
    ///
    /// # Errors
    ///
    /// Any [`SearchError`] from a single call aborts polling; calls are not
    /// retried on transport failure.
    #[instrument(skip(self, job), fields(record_id = %job.record_id, jurisdiction = %job.jurisdiction))]
    pub async fn poll(&self, job: &SearchJob) -> Result<ResolvedSearch, SearchError> {
        let mut attempt = 1u32;
        let mut token: Option<String> = None;

        loop {
            let request = match token.as_deref() {
                None => SearchRequest::Fresh {
                    query: &job.company_name,
                    jurisdiction: &job.jurisdiction,
                },
                Some(token) => SearchRequest::Continuation { token },
            };
            debug!(attempt, max_attempts = self.policy.max_attempts, "polling search API");
            let payload = self.call(request).await?;

            match classify_search_payload(&payload) {
                SearchResponse::Complete { records } => {
                    info!(attempt, records = records.len(), "search resolved");
                    return Ok(ResolvedSearch {
                        records,
                        raw: payload,
                        attempts: attempt,
                        outcome: PollOutcome::Resolved,
                    });
                }
                SearchResponse::Pending { continuation_token } => {
                    if attempt >= self.policy.max_attempts {
                        warn!(attempt, "search still pending after final attempt");
                        return Ok(ResolvedSearch {
                            records: Vec::new(),
                            raw: payload,
                            attempts: attempt,
                            outcome: PollOutcome::Exhausted,
                        });
                    }
                    info!(
                        attempt,
                        delay_ms = self.policy.delay.as_millis(),
                        "search pending; waiting before continuation"
                    );
                    tokio::time::sleep(self.policy.delay).await;
                    token = Some(continuation_token);
                    attempt += 1;
                }
            }
        }
    }

    async fn call(&self, request: SearchRequest<'_>) -> Result<Value, SearchError> {
        let endpoint = self.config.endpoint.as_str();
        let builder = self
            .client
            .get(endpoint)
            .header(API_KEY_HEADER, &self.config.api_key)
            .header(ACCEPT, "application/json");
        let builder = match request {
            SearchRequest::Fresh {
                query,
                jurisdiction,
            } => builder.query(&[
                ("searchQuery", query),
                ("state", jurisdiction),
                ("liveData", if self.config.live_data { "true" } else { "false" }),
            ]),
            SearchRequest::Continuation { token } => builder.query(&[(RETRY_FIELD, token)]),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| SearchError::from_transport(endpoint, e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SearchError::from_transport(endpoint, e))?;
        debug!(status = status.as_u16(), bytes = body.len(), "search API responded");

        if !status.is_success() {
            // A pending token in an error body is still a continuation.
            if let Ok(payload) = serde_json::from_str::<Value>(&body)
                && continuation_token(&payload).is_some()
            {
                debug!(status = status.as_u16(), "continuation token in non-2xx body");
                return Ok(payload);
            }
            return Err(SearchError::http_status(endpoint, status.as_u16()));
        }

        serde_json::from_str(&body).map_err(|e| SearchError::invalid_response(endpoint, e.to_string()))
    }
}
