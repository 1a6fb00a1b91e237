//! Delivery of results and files to the downstream CRM.
//!
//! There are two endpoints: one for the record-level search payload and one
//! for files (documents and profile links). Every body carries the caller's
//! record id under [`CORRELATION_KEY`].

mod error;
mod payload;

use std::fmt;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

use crate::credential::Credential;
use crate::http_client::{ClientOptions, build_http_client};
use crate::user_agent;

pub use error::CallbackError;
pub use payload::{CORRELATION_KEY, FileKind, FilePayload, record_payload};

/// Default timeout for one callback.
pub const CALLBACK_TIMEOUT_SECS: u64 = 60;

/// Which downstream address a callback goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    /// Record-level search payload.
    Record,
    /// One file or link.
    File,
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Record => f.write_str("record"),
            Self::File => f.write_str("file"),
        }
    }
}

/// The two callback addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackTargets {
    /// Record-level endpoint.
    pub record: Url,
    /// File-level endpoint.
    pub file: Url,
}

impl CallbackTargets {
    /// Returns the address for `kind`.
    #[must_use]
    pub fn url(&self, kind: EndpointKind) -> &Url {
        match kind {
            EndpointKind::Record => &self.record,
            EndpointKind::File => &self.file,
        }
    }
}

/// Posts JSON callbacks with a bearer credential.
#[derive(Debug, Clone)]
pub struct CallbackSender {
    client: Client,
    targets: CallbackTargets,
}

impl CallbackSender {
    /// Creates a sender with the default callback timeout.
    ///
    /// # Errors
    ///
    /// Returns [`CallbackError::Client`] if the HTTP client cannot be built.
    pub fn new(targets: CallbackTargets) -> Result<Self, CallbackError> {
        Self::with_timeout(targets, Duration::from_secs(CALLBACK_TIMEOUT_SECS))
    }

    /// Creates a sender with an explicit timeout.
    ///
    /// # Errors
    ///
    /// Returns [`CallbackError::Client`] if the HTTP client cannot be built.
    pub fn with_timeout(targets: CallbackTargets, timeout: Duration) -> Result<Self, CallbackError> {
        let options = ClientOptions::new(user_agent::default_api_user_agent(), timeout);
        let client = build_http_client(&options, None).map_err(CallbackError::Client)?;
        Ok(Self { client, targets })
    }

    /// Posts `payload` to the `kind` endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`CallbackError`] on transport failure or a non-2xx response.
    #[instrument(skip(self, payload, credential), fields(%kind))]
    pub async fn send<T>(
        &self,
        kind: EndpointKind,
        payload: &T,
        credential: &Credential,
    ) -> Result<(), CallbackError>
    where
        T: Serialize + Sync + ?Sized,
    {
        let url = self.targets.url(kind).as_str();
        let response = self
            .client
            .post(url)
            .bearer_auth(credential.token())
            .json(payload)
            .send()
            .await
            .map_err(|e| CallbackError::from_transport(kind, url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CallbackError::HttpStatus {
                kind,
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        debug!(status = status.as_u16(), "callback delivered");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn targets(server: &MockServer) -> CallbackTargets {
        CallbackTargets {
            record: Url::parse(&format!("{}/callback", server.uri())).unwrap(),
            file: Url::parse(&format!("{}/file", server.uri())).unwrap(),
        }
    }

    #[test]
    fn test_endpoint_kind_display() {
        assert_eq!(EndpointKind::Record.to_string(), "record");
        assert_eq!(EndpointKind::File.to_string(), "file");
    }

    #[tokio::test]
    async fn test_send_posts_json_with_bearer() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };

        Mock::given(method("POST"))
            .and(path("/callback"))
            .and(header("authorization", "Bearer tok"))
            .and(body_json(json!({"recordId": "REC1", "results": []})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let sender = CallbackSender::new(targets(&server)).unwrap();
        let body = record_payload("REC1", &json!({"results": []}));
        sender
            .send(EndpointKind::Record, &body, &Credential::new("tok"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_file_kind_routes_to_file_endpoint() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };

        Mock::given(method("POST"))
            .and(path("/file"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let sender = CallbackSender::new(targets(&server)).unwrap();
        let payload = FilePayload::url_only("REC1", FileKind::Document, "cert", "http://x/c.pdf");
        sender
            .send(EndpointKind::File, &payload, &Credential::new("tok"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_rejected_callback_is_error() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };

        Mock::given(method("POST"))
            .and(path("/callback"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let sender = CallbackSender::new(targets(&server)).unwrap();
        let err = sender
            .send(EndpointKind::Record, &json!({}), &Credential::new("stale"))
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
    }
}
