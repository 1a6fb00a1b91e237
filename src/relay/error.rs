//! Job-level errors.

use thiserror::Error;

use super::delivery::DeliveryError;
use crate::callback::CallbackError;
use crate::credential::CredentialError;
use crate::fetch::FetchError;
use crate::search::SearchError;

/// Minimum worker pool size.
pub(crate) const MIN_CONCURRENCY: usize = 1;

/// Maximum worker pool size.
pub(crate) const MAX_CONCURRENCY: usize = 32;

/// A failure that aborts a job.
///
/// Per-item failures never surface here; they are counted in the
/// [`DispatchSummary`](super::DispatchSummary) instead.
#[derive(Debug, Error)]
pub enum JobError {
    /// The search API failed.
    #[error("search failed: {0}")]
    Search(#[from] SearchError),

    /// No callback credential could be obtained.
    #[error("credential unavailable: {0}")]
    Credential(#[from] CredentialError),

    /// The record-level callback was not delivered.
    #[error("record callback failed: {0}")]
    RecordCallback(#[source] DeliveryError),

    /// Invalid worker pool size.
    #[error("invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}")]
    InvalidConcurrency {
        /// The rejected value.
        value: usize,
    },

    /// The worker pool semaphore was closed.
    #[error("worker pool closed unexpectedly")]
    PoolClosed,
}

/// A pipeline stage could not be constructed.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Search client setup failed.
    #[error("search client: {0}")]
    Search(#[from] SearchError),

    /// Document client setup failed.
    #[error("document client: {0}")]
    Fetch(#[from] FetchError),

    /// Callback client setup failed.
    #[error("callback client: {0}")]
    Callback(#[from] CallbackError),

    /// Token client setup failed.
    #[error("credential client: {0}")]
    Credential(#[from] CredentialError),

    /// Dispatcher settings were rejected.
    #[error(transparent)]
    Dispatcher(#[from] JobError),
}
