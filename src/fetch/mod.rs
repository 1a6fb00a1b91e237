//! Document downloads from third-party registry hosts.
//!
//! Registry hosts sometimes answer a document request with an HTML challenge
//! page or an auth status instead of the file. [`DocumentFetcher`] detects
//! this through a single classification function ([`classify_response`]) and
//! performs one cookie-priming handshake before giving up with
//! [`FetchError::DocumentUnavailable`].
//!
//! # Example
//!
//! ```no_run
//! use registry_relay::fetch::DocumentFetcher;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = DocumentFetcher::new()?;
//! let download = fetcher.fetch("https://sos.example.gov/docs/cert.pdf").await?;
//! println!("{} bytes, primed: {}", download.payload.len(), download.primed);
//! # Ok(())
//! # }
//! ```

mod classify;
mod error;
mod fetcher;
pub mod filename;

pub use classify::{FetchOutcome, classify_response, is_html_content_type, origin_of};
pub use error::FetchError;
pub use fetcher::{DOWNLOAD_TIMEOUT_SECS, DocumentFetcher, Download, FetchedDocument};
