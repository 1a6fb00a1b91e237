//! The end-to-end job pipeline.

use std::fmt;
use std::sync::Arc;

use tracing::{Instrument, error, info, info_span, instrument};

use super::delivery::CallbackDelivery;
use super::dispatcher::{DispatchSummary, RelayDispatcher};
use super::error::{JobError, StartupError};
use crate::callback::CallbackSender;
use crate::config::{CredentialSettings, RelayConfig};
use crate::credential::{CredentialSource, PasswordGrantProvider, StaticCredential};
use crate::fetch::filename::{effective_content_type, file_name_from_url};
use crate::fetch::{DocumentFetcher, FetchError, FetchedDocument};
use crate::job::{BulkDocuments, JobAck, SearchJob};
use crate::search::{PollOutcome, SearchPoller};

/// Where a job is. Logged at each transition; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Accepted and acknowledged.
    Received,
    /// Waiting on the search API.
    Polling,
    /// The search returned a final payload.
    Resolved,
    /// The attempt budget ran out; dispatching what was received.
    PollExhausted,
    /// Relaying callbacks.
    Dispatching,
    /// Finished.
    Done,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Polling => "polling",
            Self::Resolved => "resolved",
            Self::PollExhausted => "poll_exhausted",
            Self::Dispatching => "dispatching",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Search, fetch and relay wired together.
///
/// Cheap to clone; clones share the credential cache and worker pool.
#[derive(Debug, Clone)]
pub struct RelayPipeline {
    poller: SearchPoller,
    fetcher: DocumentFetcher,
    dispatcher: RelayDispatcher,
}

impl RelayPipeline {
    /// Assembles a pipeline from its stages.
    #[must_use]
    pub fn new(poller: SearchPoller, fetcher: DocumentFetcher, dispatcher: RelayDispatcher) -> Self {
        Self {
            poller,
            fetcher,
            dispatcher,
        }
    }

    /// Builds every stage from `config`.
    ///
    /// No network calls are made; the first credential is acquired lazily.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError`] if an HTTP client cannot be built or the
    /// dispatcher settings are invalid.
    pub fn from_config(config: &RelayConfig) -> Result<Self, StartupError> {
        let poller = SearchPoller::new(config.search.clone(), config.poll)?;
        let fetcher = DocumentFetcher::new()?;
        let sender = CallbackSender::new(config.callbacks.clone())?;
        let credentials: Arc<dyn CredentialSource> = match &config.credentials {
            CredentialSettings::PasswordGrant(grant) => {
                Arc::new(PasswordGrantProvider::new(grant.clone())?)
            }
            CredentialSettings::Static(token) => Arc::new(StaticCredential::new(token.clone())),
        };
        let dispatcher = RelayDispatcher::new(
            fetcher.clone(),
            CallbackDelivery::new(sender, credentials),
            config.concurrency,
            config.profile_link_mode,
        )?;
        Ok(Self::new(poller, fetcher, dispatcher))
    }

    /// Returns the dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &RelayDispatcher {
        &self.dispatcher
    }

    /// Accepts `job` and runs it in the background.
    ///
    /// The acknowledgment is returned before any upstream call is made.
    /// Failures are only logged.
    #[must_use]
    pub fn submit(&self, job: SearchJob) -> JobAck {
        let ack = JobAck::queued();
        let pipeline = self.clone();
        let span = info_span!("job", job_id = %ack.job_id, record_id = %job.record_id);

        tokio::spawn(
            async move {
                if let Err(e) = pipeline.run_job(&job).await {
                    error!(error = %e, "job failed");
                }
            }
            .instrument(span),
        );
        ack
    }

    /// Runs one job to completion: poll, record callback, items.
    ///
    /// # Errors
    ///
    /// Returns [`JobError`] for the fatal failures: the search call, the
    /// credential, or the record callback.
    #[instrument(skip(self, job), fields(company = %job.company_name, jurisdiction = %job.jurisdiction))]
    pub async fn run_job(&self, job: &SearchJob) -> Result<DispatchSummary, JobError> {
        info!(state = %JobState::Received, "job received");
        info!(state = %JobState::Polling, "polling search API");
        let search = self.poller.poll(job).await?;

        let state = match search.outcome {
            PollOutcome::Resolved => JobState::Resolved,
            PollOutcome::Exhausted => JobState::PollExhausted,
        };
        info!(
            state = %state,
            attempts = search.attempts,
            records = search.records.len(),
            documents = search.document_count(),
            "search finished"
        );

        let credential = self.dispatcher.delivery().credential().await?;
        info!(state = %JobState::Dispatching, "dispatching results");
        let summary = self.dispatcher.dispatch(job, &search, &credential).await?;

        info!(
            state = %JobState::Done,
            relayed = summary.relayed(),
            dropped = summary.dropped,
            "job complete"
        );
        Ok(summary)
    }

    /// Fetches and relays a bulk batch, waiting for every item.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::Credential`] if no credential can be obtained.
    #[instrument(skip(self, batch), fields(record_id = %batch.record_id))]
    pub async fn process_documents(&self, batch: &BulkDocuments) -> Result<DispatchSummary, JobError> {
        let credential = self.dispatcher.delivery().credential().await?;
        self.dispatcher.dispatch_documents(batch, &credential).await
    }

    /// Fetches one URL and returns it without relaying.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the fetch fails, including after priming.
    #[instrument(skip(self))]
    pub async fn debug_fetch(&self, url: &str) -> Result<FetchedDocument, FetchError> {
        let download = self.fetcher.fetch(url).await?;
        let content_type = effective_content_type(download.content_type.as_deref());
        let file_name = file_name_from_url(url, &content_type);
        Ok(FetchedDocument::from_download(download, file_name))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::relay::ProfileLinkMode;

    #[test]
    fn test_job_state_display() {
        assert_eq!(JobState::Received.to_string(), "received");
        assert_eq!(JobState::PollExhausted.to_string(), "poll_exhausted");
        assert_eq!(JobState::Done.to_string(), "done");
    }

    #[test]
    fn test_from_config_wires_dispatcher_settings() {
        let env = [
            ("SEARCH_API_ENDPOINT", "https://search.example.com/v1/search"),
            ("SEARCH_API_KEY", "key"),
            ("CALLBACK_BASE", "https://crm.example.com"),
            ("CALLBACK_BEARER_TOKEN", "tok"),
            ("RELAY_CONCURRENCY", "7"),
            ("PROFILE_LINK_MODE", "html"),
        ];
        let config = RelayConfig::from_lookup(|key| {
            env.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_string())
        })
        .unwrap();
        let pipeline = RelayPipeline::from_config(&config).unwrap();
        assert_eq!(pipeline.dispatcher().concurrency(), 7);
        assert_eq!(
            pipeline.dispatcher().profile_link_mode(),
            ProfileLinkMode::Html
        );
    }
}
