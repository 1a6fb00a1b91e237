//! Shared User-Agent strings for relay HTTP clients.
//!
//! API traffic (search, token, callbacks) identifies the relay; document
//! downloads present as a browser because registry hosts gate files behind
//! bot checks.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/registry-relay";

/// Browser User-Agent sent on every document download.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Accept list for document downloads, biased toward PDFs, binaries and images.
pub const DOCUMENT_ACCEPT: &str =
    "application/pdf,application/octet-stream,image/avif,image/webp,image/*,*/*;q=0.8";

/// Default User-Agent for API requests (identifies the relay).
#[must_use]
pub(crate) fn default_api_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("registry-relay/{version} (+{PROJECT_UA_URL})")
}
