//! Authorized callback delivery with one refresh on 401.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument};

use crate::callback::{CallbackError, CallbackSender, EndpointKind};
use crate::credential::{Credential, CredentialError, CredentialSource};

/// A callback that could not be delivered.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The endpoint rejected the callback or was unreachable.
    #[error(transparent)]
    Callback(#[from] CallbackError),

    /// A 401 asked for a new credential and none could be acquired.
    #[error("credential refresh failed: {0}")]
    Refresh(#[from] CredentialError),
}

impl DeliveryError {
    /// True when the callback was definitely not accepted: an error status,
    /// or a 401 whose credential could not be refreshed.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        match self {
            Self::Callback(e) => e.is_rejection(),
            Self::Refresh(_) => true,
        }
    }
}

/// Sends callbacks and re-acquires the credential once when one is rejected
/// with HTTP 401.
#[derive(Debug, Clone)]
pub struct CallbackDelivery {
    sender: CallbackSender,
    credentials: Arc<dyn CredentialSource>,
}

impl CallbackDelivery {
    /// Pairs a sender with the source it refreshes from.
    #[must_use]
    pub fn new(sender: CallbackSender, credentials: Arc<dyn CredentialSource>) -> Self {
        Self {
            sender,
            credentials,
        }
    }

    /// Returns the current credential, acquiring one on first use.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] if acquisition fails.
    pub async fn credential(&self) -> Result<Credential, CredentialError> {
        self.credentials.current().await
    }

    /// Delivers `payload`, resending once with a fresh credential on 401.
    ///
    /// If another task already refreshed the cached credential, that one is
    /// reused instead of acquiring again.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] when the callback (or its single resend)
    /// fails, or when the refresh itself fails.
    #[instrument(skip(self, payload, credential), fields(%kind))]
    pub async fn deliver<T>(
        &self,
        kind: EndpointKind,
        payload: &T,
        credential: &Credential,
    ) -> Result<(), DeliveryError>
    where
        T: Serialize + Sync + ?Sized,
    {
        match self.sender.send(kind, payload, credential).await {
            Err(e) if e.is_unauthorized() => {
                let cached = self.credentials.current().await?;
                let fresh = if cached == *credential {
                    info!("callback unauthorized; re-acquiring credential");
                    self.credentials.acquire().await?
                } else {
                    cached
                };
                self.sender.send(kind, payload, &fresh).await?;
                Ok(())
            }
            other => other.map_err(DeliveryError::from),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::callback::CallbackTargets;
    use crate::credential::{PasswordGrantConfig, PasswordGrantProvider, StaticCredential};
    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sender(server: &MockServer) -> CallbackSender {
        CallbackSender::new(CallbackTargets {
            record: Url::parse(&format!("{}/callback", server.uri())).unwrap(),
            file: Url::parse(&format!("{}/file", server.uri())).unwrap(),
        })
        .unwrap()
    }

    fn provider(server: &MockServer) -> PasswordGrantProvider {
        PasswordGrantProvider::new(PasswordGrantConfig {
            token_url: Url::parse(&format!("{}/token", server.uri())).unwrap(),
            client_id: "cid".into(),
            client_secret: "secret".into(),
            username: "user".into(),
            password: "pass".into(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_unauthorized_callback_refreshes_and_resends_once() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "fresh"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/callback"))
            .and(header("authorization", "Bearer fresh"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/callback"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let source: Arc<dyn CredentialSource> = Arc::new(provider(&server));
        let delivery = CallbackDelivery::new(sender(&server), source);
        delivery
            .deliver(EndpointKind::Record, &json!({}), &Credential::new("stale"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_second_unauthorized_is_returned() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };

        Mock::given(method("POST"))
            .and(path("/file"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;

        let source: Arc<dyn CredentialSource> = Arc::new(StaticCredential::new("tok"));
        let delivery = CallbackDelivery::new(sender(&server), source);
        let err = delivery
            .deliver(EndpointKind::File, &json!({}), &Credential::new("tok"))
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Callback(ref e) if e.is_unauthorized()));
    }

    #[tokio::test]
    async fn test_other_failures_are_not_resent() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };

        Mock::given(method("POST"))
            .and(path("/file"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let source: Arc<dyn CredentialSource> = Arc::new(StaticCredential::new("tok"));
        let delivery = CallbackDelivery::new(sender(&server), source);
        let err = delivery
            .deliver(EndpointKind::File, &json!({}), &Credential::new("tok"))
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Callback(_)));
        assert!(err.is_rejection());
    }
}
