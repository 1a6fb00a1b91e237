//! Registry Relay Library
//!
//! Relays business-registry search results and their documents to a CRM's
//! callback endpoints.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`search`] - Search API polling with continuation tokens
//! - [`fetch`] - Document downloads with challenge detection and cookie priming
//! - [`credential`] - Bearer credentials for callbacks
//! - [`callback`] - Record and file callback delivery
//! - [`relay`] - Job pipeline and bounded per-item dispatch
//! - [`server`] - HTTP listener
//! - [`config`] - Environment configuration

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod callback;
pub mod config;
pub mod credential;
pub mod fetch;
pub mod http_client;
pub mod job;
pub mod relay;
pub mod search;
pub mod server;
#[cfg(test)]
pub mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use callback::{CallbackError, CallbackSender, CallbackTargets, EndpointKind};
pub use config::{ConfigError, RelayConfig};
pub use credential::{Credential, CredentialError, CredentialSource, PasswordGrantProvider};
pub use fetch::{DocumentFetcher, FetchError, FetchOutcome, FetchedDocument};
pub use job::{JobAck, SearchJob, ValidationError};
pub use relay::{DispatchSummary, JobError, ProfileLinkMode, RelayDispatcher, RelayPipeline};
pub use search::{PollPolicy, ResolvedSearch, SearchError, SearchPoller};
