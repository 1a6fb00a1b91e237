//! Response classification for document downloads.

use reqwest::StatusCode;
use url::Url;

/// What a document response means for the fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response carries the document.
    Ok,
    /// An auth status or challenge page; cookie priming may help.
    Blocked,
    /// A plain error status; priming will not help.
    Unavailable,
}

/// Classifies a document response from its status and declared content type.
///
/// Both 401/403 and an HTML content type on a successful response count as
/// [`FetchOutcome::Blocked`].
#[must_use]
pub fn classify_response(status: StatusCode, content_type: Option<&str>) -> FetchOutcome {
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        return FetchOutcome::Blocked;
    }
    if !status.is_success() {
        return FetchOutcome::Unavailable;
    }
    if content_type.is_some_and(is_html_content_type) {
        FetchOutcome::Blocked
    } else {
        FetchOutcome::Ok
    }
}

/// Returns true for displayable HTML page types, ignoring parameters and case.
#[must_use]
pub fn is_html_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    matches!(mime.as_str(), "text/html" | "application/xhtml+xml")
}

/// Returns `scheme://host[:port]` for http(s) URLs.
#[must_use]
pub fn origin_of(url: &Url) -> Option<String> {
    let origin = url.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_success_is_ok() {
        assert_eq!(
            classify_response(StatusCode::OK, Some("application/pdf")),
            FetchOutcome::Ok
        );
    }

    #[test]
    fn test_missing_content_type_is_ok() {
        assert_eq!(classify_response(StatusCode::OK, None), FetchOutcome::Ok);
    }

    // Policy: either trigger alone primes cookies.
    #[test]
    fn test_html_success_is_blocked() {
        assert_eq!(
            classify_response(StatusCode::OK, Some("text/html; charset=UTF-8")),
            FetchOutcome::Blocked
        );
    }

    #[test]
    fn test_auth_status_is_blocked_regardless_of_type() {
        assert_eq!(
            classify_response(StatusCode::FORBIDDEN, Some("application/pdf")),
            FetchOutcome::Blocked
        );
        assert_eq!(
            classify_response(StatusCode::UNAUTHORIZED, None),
            FetchOutcome::Blocked
        );
    }

    #[test]
    fn test_other_errors_are_unavailable() {
        assert_eq!(
            classify_response(StatusCode::NOT_FOUND, Some("text/html")),
            FetchOutcome::Unavailable
        );
        assert_eq!(
            classify_response(StatusCode::INTERNAL_SERVER_ERROR, None),
            FetchOutcome::Unavailable
        );
    }

    #[test]
    fn test_is_html_content_type_variants() {
        assert!(is_html_content_type("TEXT/HTML"));
        assert!(is_html_content_type("application/xhtml+xml"));
        assert!(!is_html_content_type("text/plain"));
        assert!(!is_html_content_type("application/pdf"));
        assert!(!is_html_content_type(""));
    }

    #[test]
    fn test_origin_keeps_port() {
        let url = Url::parse("http://127.0.0.1:8080/files/cert.pdf?x=1").unwrap();
        assert_eq!(origin_of(&url).as_deref(), Some("http://127.0.0.1:8080"));
    }

    #[test]
    fn test_origin_drops_default_port() {
        let url = Url::parse("https://sos.example.gov:443/a/b.pdf").unwrap();
        assert_eq!(origin_of(&url).as_deref(), Some("https://sos.example.gov"));
    }

    #[test]
    fn test_origin_none_for_opaque_url() {
        let url = Url::parse("data:text/plain,hello").unwrap();
        assert_eq!(origin_of(&url), None);
    }
}
