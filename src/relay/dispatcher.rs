//! Fan-out of a resolved search into callbacks.

use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use super::delivery::CallbackDelivery;
use super::error::{JobError, MAX_CONCURRENCY, MIN_CONCURRENCY};
use crate::callback::{EndpointKind, FileKind, FilePayload, record_payload};
use crate::credential::Credential;
use crate::fetch::filename::{
    DEFAULT_CONTENT_TYPE, document_file_name, effective_content_type, file_name_from_url,
};
use crate::fetch::{DocumentFetcher, FetchedDocument};
use crate::job::{BulkDocuments, SearchJob};
use crate::search::{DocumentRef, ResolvedSearch};

/// Default worker pool size.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// How a profile link is relayed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProfileLinkMode {
    /// URL-only file callback.
    #[default]
    Url,
    /// A small HTML page linking to the profile, sent as content.
    Html,
}

impl FromStr for ProfileLinkMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "url" => Ok(Self::Url),
            "html" => Ok(Self::Html),
            other => Err(format!("unknown profile link mode `{other}` (expected url or html)")),
        }
    }
}

/// Counts from one dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchSummary {
    /// Documents relayed with their bytes.
    pub with_content: usize,
    /// Documents relayed as URL-only fallbacks.
    pub url_only: usize,
    /// Documents whose content and fallback callbacks both failed.
    pub dropped: usize,
    /// Profile links delivered.
    pub profile_links_sent: usize,
    /// Profile links that failed.
    pub profile_links_failed: usize,
}

impl DispatchSummary {
    /// Documents that reached the callback endpoint in either form.
    #[must_use]
    pub fn relayed(&self) -> usize {
        self.with_content + self.url_only
    }

    /// All documents processed, delivered or not.
    #[must_use]
    pub fn documents(&self) -> usize {
        self.relayed() + self.dropped
    }

    fn record(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::WithContent => self.with_content += 1,
            ItemOutcome::UrlOnly => self.url_only += 1,
            ItemOutcome::Dropped => self.dropped += 1,
            ItemOutcome::ProfileLinkSent => self.profile_links_sent += 1,
            ItemOutcome::ProfileLinkFailed => self.profile_links_failed += 1,
        }
    }
}

/// One unit of work on the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
enum WorkItem {
    ProfileLink { url: String },
    Document { name: NameSource, url: String },
}

/// How a document's file name is derived.
#[derive(Debug, Clone, PartialEq, Eq)]
enum NameSource {
    /// `"<company> - <declared>"`.
    Declared { company: String, declared: String },
    /// Last path segment of the URL.
    FromUrl,
}

impl NameSource {
    fn file_name(&self, url: &str, content_type: &str) -> String {
        match self {
            Self::Declared { company, declared } => {
                document_file_name(company, declared, content_type)
            }
            Self::FromUrl => file_name_from_url(url, content_type),
        }
    }

    /// Name for a URL-only callback; no content type is known.
    fn fallback_name(&self, url: &str) -> String {
        self.file_name(url, DEFAULT_CONTENT_TYPE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemOutcome {
    WithContent,
    UrlOnly,
    Dropped,
    ProfileLinkSent,
    ProfileLinkFailed,
}

/// Shared state for the tasks of one dispatch.
#[derive(Debug)]
struct ItemContext {
    record_id: String,
    company_name: Option<String>,
    credential: Credential,
    fetcher: DocumentFetcher,
    delivery: CallbackDelivery,
    profile_link_mode: ProfileLinkMode,
}

/// Relays resolved searches and document batches to the callback endpoints.
///
/// Items run on a semaphore-bounded pool; each item's failure is contained
/// in its task and only shows up in the [`DispatchSummary`].
#[derive(Debug, Clone)]
pub struct RelayDispatcher {
    semaphore: Arc<Semaphore>,
    concurrency: usize,
    profile_link_mode: ProfileLinkMode,
    fetcher: DocumentFetcher,
    delivery: CallbackDelivery,
}

impl RelayDispatcher {
    /// Creates a dispatcher with `concurrency` workers.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::InvalidConcurrency`] outside 1..=32.
    #[instrument(level = "debug", skip(fetcher, delivery))]
    pub fn new(
        fetcher: DocumentFetcher,
        delivery: CallbackDelivery,
        concurrency: usize,
        profile_link_mode: ProfileLinkMode,
    ) -> Result<Self, JobError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(JobError::InvalidConcurrency { value: concurrency });
        }
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            profile_link_mode,
            fetcher,
            delivery,
        })
    }

    /// Returns the worker pool size.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Returns the configured profile link mode.
    #[must_use]
    pub fn profile_link_mode(&self) -> ProfileLinkMode {
        self.profile_link_mode
    }

    /// Returns the callback delivery shared by every item.
    #[must_use]
    pub fn delivery(&self) -> &CallbackDelivery {
        &self.delivery
    }

    /// Relays `search` for `job`.
    ///
    /// The record callback goes first and must succeed. Profile links and
    /// documents follow on the pool in encounter order.
    ///
    /// # Errors
    ///
    /// - [`JobError::RecordCallback`] if the record callback fails
    /// - [`JobError::PoolClosed`] if the pool semaphore is closed
    #[instrument(skip(self, job, search, credential), fields(record_id = %job.record_id))]
    pub async fn dispatch(
        &self,
        job: &SearchJob,
        search: &ResolvedSearch,
        credential: &Credential,
    ) -> Result<DispatchSummary, JobError> {
        let body = record_payload(&job.record_id, &search.raw);
        self.delivery
            .deliver(EndpointKind::Record, &body, credential)
            .await
            .map_err(JobError::RecordCallback)?;
        info!(records = search.records.len(), "record callback delivered");

        let items = search
            .records
            .iter()
            .flat_map(|record| {
                let profile = record
                    .profile_url
                    .clone()
                    .map(|url| WorkItem::ProfileLink { url });
                profile.into_iter().chain(
                    record
                        .documents
                        .iter()
                        .map(|document| declared_item(&job.company_name, document)),
                )
            })
            .collect();

        self.run_items(
            items,
            &job.record_id,
            Some(job.company_name.clone()),
            credential,
        )
        .await
    }

    /// Fetches and relays each URL of a bulk batch. No record callback is sent.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::PoolClosed`] if the pool semaphore is closed.
    #[instrument(skip(self, batch, credential), fields(record_id = %batch.record_id, urls = batch.urls.len()))]
    pub async fn dispatch_documents(
        &self,
        batch: &BulkDocuments,
        credential: &Credential,
    ) -> Result<DispatchSummary, JobError> {
        let items = batch
            .urls
            .iter()
            .map(|url| WorkItem::Document {
                name: NameSource::FromUrl,
                url: url.clone(),
            })
            .collect();
        self.run_items(items, &batch.record_id, None, credential)
            .await
    }

    async fn run_items(
        &self,
        items: Vec<WorkItem>,
        record_id: &str,
        company_name: Option<String>,
        credential: &Credential,
    ) -> Result<DispatchSummary, JobError> {
        let context = Arc::new(ItemContext {
            record_id: record_id.to_string(),
            company_name,
            credential: credential.clone(),
            fetcher: self.fetcher.clone(),
            delivery: self.delivery.clone(),
            profile_link_mode: self.profile_link_mode,
        });
        let mut handles = Vec::with_capacity(items.len());

        for item in items {
            let permit = self
                .semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| JobError::PoolClosed)?;
            let context = Arc::clone(&context);

            handles.push(tokio::spawn(async move {
                let _permit = permit;
                match item {
                    WorkItem::ProfileLink { url } => relay_profile_link(&context, &url).await,
                    WorkItem::Document { name, url } => {
                        relay_document(&context, &name, &url).await
                    }
                }
            }));
        }

        debug!(task_count = handles.len(), "waiting for items to complete");

        let mut summary = DispatchSummary::default();
        for handle in handles {
            match handle.await {
                Ok(outcome) => summary.record(outcome),
                Err(e) => warn!(error = %e, "relay task panicked"),
            }
        }

        info!(
            with_content = summary.with_content,
            url_only = summary.url_only,
            dropped = summary.dropped,
            profile_links_sent = summary.profile_links_sent,
            profile_links_failed = summary.profile_links_failed,
            "dispatch complete"
        );
        Ok(summary)
    }
}

fn declared_item(company_name: &str, document: &DocumentRef) -> WorkItem {
    WorkItem::Document {
        name: NameSource::Declared {
            company: company_name.to_string(),
            declared: document.name.clone(),
        },
        url: document.source_url.clone(),
    }
}

async fn relay_profile_link(context: &ItemContext, url: &str) -> ItemOutcome {
    let label = context.company_name.as_deref().unwrap_or("Business");
    let payload = match context.profile_link_mode {
        ProfileLinkMode::Url => FilePayload::url_only(
            &context.record_id,
            FileKind::ProfileLink,
            &format!("{label} - Profile"),
            url,
        ),
        ProfileLinkMode::Html => {
            let page = FetchedDocument {
                file_name: format!("{label} - Profile.html"),
                content_type: "text/html".to_string(),
                payload: profile_link_page(url).into_bytes(),
            };
            FilePayload::with_content(&context.record_id, FileKind::ProfileLink, &page, url)
        }
    };

    match context
        .delivery
        .deliver(EndpointKind::File, &payload, &context.credential)
        .await
    {
        Ok(()) => {
            debug!(url, "profile link delivered");
            ItemOutcome::ProfileLinkSent
        }
        Err(e) => {
            warn!(url, error = %e, "profile link callback failed");
            ItemOutcome::ProfileLinkFailed
        }
    }
}

async fn relay_document(context: &ItemContext, name: &NameSource, url: &str) -> ItemOutcome {
    match context.fetcher.fetch(url).await {
        Ok(download) => {
            let content_type = effective_content_type(download.content_type.as_deref());
            let file_name = name.file_name(url, &content_type);
            let document = FetchedDocument::from_download(download, file_name);
            let payload =
                FilePayload::with_content(&context.record_id, FileKind::Document, &document, url);
            match context
                .delivery
                .deliver(EndpointKind::File, &payload, &context.credential)
                .await
            {
                Ok(()) => {
                    debug!(url, file_name = %document.file_name, "document delivered");
                    return ItemOutcome::WithContent;
                }
                // Without a definite rejection the content may have landed.
                Err(e) if !e.is_rejection() => {
                    warn!(url, error = %e, "document callback outcome unknown; document dropped");
                    return ItemOutcome::Dropped;
                }
                Err(e) => {
                    warn!(url, error = %e, "document callback rejected; sending URL-only fallback");
                }
            }
        }
        Err(e) => {
            warn!(url, error = %e, "document fetch failed; sending URL-only fallback");
        }
    }

    let fallback = FilePayload::url_only(
        &context.record_id,
        FileKind::Document,
        &name.fallback_name(url),
        url,
    );
    match context
        .delivery
        .deliver(EndpointKind::File, &fallback, &context.credential)
        .await
    {
        Ok(()) => ItemOutcome::UrlOnly,
        Err(e) => {
            warn!(url, error = %e, "URL-only fallback failed; document dropped");
            ItemOutcome::Dropped
        }
    }
}

/// Minimal page wrapping a profile link.
fn profile_link_page(url: &str) -> String {
    let escaped = url
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Registry profile</title></head>\
         <body><a href=\"{escaped}\">{escaped}</a></body></html>"
    )
}
