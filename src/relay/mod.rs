//! Job orchestration: poll the search API, then relay everything it found.
//!
//! # Overview
//!
//! [`RelayPipeline`] runs a job through its states
//! (`Received → Polling → Resolved | PollExhausted → Dispatching → Done`).
//! [`RelayDispatcher`] sends the record callback, then fans profile links and
//! documents out over a bounded worker pool. Each document produces exactly
//! one delivered callback: its content, or a URL-only fallback when the fetch
//! or the content callback fails.
//!
//! Only the search call, the credential and the record callback can fail a
//! job. Everything else is counted in the [`DispatchSummary`].

mod delivery;
mod dispatcher;
mod error;
mod pipeline;

pub use delivery::{CallbackDelivery, DeliveryError};
pub use dispatcher::{DEFAULT_CONCURRENCY, DispatchSummary, ProfileLinkMode, RelayDispatcher};
pub use error::{JobError, StartupError};
pub use pipeline::{JobState, RelayPipeline};
