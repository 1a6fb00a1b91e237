//! Business-registry search with deferred completion.
//!
//! The search API may answer with a continuation token instead of results.
//! [`SearchPoller`] hides that: it re-polls with the token on a fixed delay
//! and only ever hands back a [`ResolvedSearch`], never a pending state.
//!
//! # Example
//!
//! ```no_run
//! use registry_relay::job::SearchJob;
//! use registry_relay::search::{PollPolicy, SearchApiConfig, SearchPoller};
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SearchApiConfig::new(Url::parse("https://api.example.com/search")?, "key");
//! let poller = SearchPoller::new(config, PollPolicy::default())?;
//! let job = SearchJob {
//!     company_name: "Acme LLC".into(),
//!     record_id: "REC1".into(),
//!     jurisdiction: "GA".into(),
//! };
//! let resolved = poller.poll(&job).await?;
//! println!("{} records after {} calls", resolved.records.len(), resolved.attempts);
//! # Ok(())
//! # }
//! ```

mod error;
mod poller;
mod response;

pub use error::SearchError;
pub use poller::{
    DEFAULT_MAX_POLL_ATTEMPTS, DEFAULT_POLL_DELAY, PollOutcome, PollPolicy, ResolvedSearch,
    SEARCH_TIMEOUT_SECS, SearchApiConfig, SearchPoller,
};
pub use response::{BusinessRecord, DocumentRef, SearchResponse, classify_search_payload};
