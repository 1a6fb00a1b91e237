//! Inbound job requests and their validation.
//!
//! Request bodies deserialize into the loose `*Request` types (every field
//! optional) and are validated into the strict types the pipeline consumes.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A required request field was absent or blank.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required field `{field}`")]
pub struct ValidationError {
    /// Wire name of the offending field.
    pub field: &'static str,
}

/// Raw job submission body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    /// Business name to search for.
    pub company_name: Option<String>,
    /// CRM record the results belong to.
    pub record_id: Option<String>,
    /// Registry jurisdiction code; older callers send it as `state`.
    #[serde(alias = "state")]
    pub jurisdiction: Option<String>,
}

/// A validated search job. Immutable for the life of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchJob {
    /// Business name to search for.
    pub company_name: String,
    /// Opaque CRM key used to correlate every callback.
    pub record_id: String,
    /// Registry jurisdiction code.
    pub jurisdiction: String,
}

impl JobRequest {
    /// Validates the request into a [`SearchJob`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] naming the first missing or blank field.
    pub fn validate(self) -> Result<SearchJob, ValidationError> {
        Ok(SearchJob {
            company_name: required(self.company_name, "companyName")?,
            record_id: required(self.record_id, "recordId")?,
            jurisdiction: required(self.jurisdiction, "jurisdiction")?,
        })
    }
}

/// Raw bulk document submission body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDocumentsRequest {
    /// CRM record the documents belong to.
    pub record_id: Option<String>,
    /// Document URLs to fetch and relay.
    #[serde(default)]
    pub documents: Vec<String>,
}

/// A validated bulk document batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkDocuments {
    /// Correlation key for every callback.
    pub record_id: String,
    /// Non-blank document URLs in submission order.
    pub urls: Vec<String>,
}

impl BulkDocumentsRequest {
    /// Validates the request. Blank URLs are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if `recordId` is missing.
    pub fn validate(self) -> Result<BulkDocuments, ValidationError> {
        let record_id = required(self.record_id, "recordId")?;
        let urls = self
            .documents
            .into_iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect();
        Ok(BulkDocuments { record_id, urls })
    }
}

/// Raw debug fetch body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugFetchRequest {
    /// URL to fetch.
    pub file_url: Option<String>,
}

impl DebugFetchRequest {
    /// Returns the URL to fetch.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if `fileUrl` is missing.
    pub fn validate(self) -> Result<String, ValidationError> {
        required(self.file_url, "fileUrl")
    }
}

/// Acknowledgment status returned on acceptance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// The job entered the pipeline.
    Queued,
}

/// Synchronous acknowledgment for an accepted job.
///
/// The id carries no query capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobAck {
    /// Opaque job identifier.
    pub job_id: Uuid,
    /// Always [`JobStatus::Queued`].
    pub status: JobStatus,
}

impl JobAck {
    /// Creates an acknowledgment with a fresh id.
    #[must_use]
    pub fn queued() -> Self {
        Self {
            job_id: Uuid::new_v4(),
            status: JobStatus::Queued,
        }
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ValidationError { field })
}
