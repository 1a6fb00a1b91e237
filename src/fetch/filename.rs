//! Filename and content-type helpers for relayed documents.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Content type assumed when a host declares none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/pdf";

/// Name used when a URL has no usable last path segment.
const FALLBACK_FILE_STEM: &str = "document";

/// Trailing extension like `.pdf` or `.jpeg`.
#[allow(clippy::expect_used)]
static EXTENSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.[A-Za-z0-9]{1,5}$").expect("extension regex is valid") // Static pattern, safe to panic
});

/// Returns the declared content type, or [`DEFAULT_CONTENT_TYPE`] when absent or blank.
#[must_use]
pub fn effective_content_type(declared: Option<&str>) -> String {
    declared
        .map(str::trim)
        .filter(|ct| !ct.is_empty())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string()
}

/// Builds `"<company> - <name>"`, appending an extension derived from the
/// content type when the declared name has none.
#[must_use]
pub fn document_file_name(company_name: &str, declared_name: &str, content_type: &str) -> String {
    let name = with_extension(declared_name.trim(), content_type);
    sanitize_filename(&format!("{} - {name}", company_name.trim()))
}

/// Derives a filename from the last path segment of `url`.
///
/// The segment is percent-decoded; URLs without one fall back to `document`.
#[must_use]
pub fn file_name_from_url(url: &str, content_type: &str) -> String {
    let segment = Url::parse(url).ok().and_then(|parsed| {
        parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back().map(ToString::to_string))
            .filter(|last| !last.is_empty())
    });
    let stem = segment.map_or_else(
        || FALLBACK_FILE_STEM.to_string(),
        |last| {
            urlencoding::decode(&last)
                .map(|decoded| decoded.into_owned())
                .unwrap_or(last)
        },
    );
    sanitize_filename(&with_extension(&stem, content_type))
}

fn with_extension(name: &str, content_type: &str) -> String {
    if EXTENSION_PATTERN.is_match(name) {
        name.to_string()
    } else {
        format!("{name}{}", extension_from_content_type(content_type))
    }
}

/// Maps a MIME type to a file extension, ignoring parameters.
#[must_use]
pub fn extension_from_content_type(content_type: &str) -> &'static str {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();

    match mime.as_str() {
        "application/pdf" | "application/x-pdf" => ".pdf",
        "text/html" => ".html",
        "text/plain" => ".txt",
        "application/json" => ".json",
        "application/xml" | "text/xml" => ".xml",
        "image/jpeg" => ".jpg",
        "image/png" => ".png",
        "image/gif" => ".gif",
        "image/tiff" => ".tiff",
        "image/webp" => ".webp",
        "application/zip" => ".zip",
        "application/msword" => ".doc",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => ".docx",
        "application/vnd.ms-excel" => ".xls",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => ".xlsx",
        _ => ".bin",
    }
}

/// Replaces path separators and reserved characters; spaces are kept.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let sanitized = sanitized.trim();

    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        return "_".to_string();
    }
    sanitized.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_file_name_appends_extension() {
        assert_eq!(
            document_file_name("Acme LLC", "cert", "application/pdf"),
            "Acme LLC - cert.pdf"
        );
    }

    #[test]
    fn test_document_file_name_keeps_existing_extension() {
        assert_eq!(
            document_file_name("Acme LLC", "cert.pdf", "application/pdf"),
            "Acme LLC - cert.pdf"
        );
        assert_eq!(
            document_file_name("Acme LLC", "logo.png", "application/pdf"),
            "Acme LLC - logo.png"
        );
    }

    #[test]
    fn test_document_file_name_uses_content_type() {
        assert_eq!(
            document_file_name("Acme", "Annual Report", "image/png"),
            "Acme - Annual Report.png"
        );
    }

    #[test]
    fn test_document_file_name_sanitizes_separators() {
        assert_eq!(
            document_file_name("A/B Holdings", "cert: 2024", "application/pdf"),
            "A_B Holdings - cert_ 2024.pdf"
        );
    }

    #[test]
    fn test_effective_content_type_defaults_to_pdf() {
        assert_eq!(effective_content_type(None), "application/pdf");
        assert_eq!(effective_content_type(Some("  ")), "application/pdf");
        assert_eq!(effective_content_type(Some("image/png")), "image/png");
    }

    #[test]
    fn test_extension_from_content_type_ignores_parameters() {
        assert_eq!(extension_from_content_type("application/PDF; qs=1"), ".pdf");
        assert_eq!(extension_from_content_type("application/octet-stream"), ".bin");
    }

    #[test]
    fn test_file_name_from_url_decodes_segment() {
        assert_eq!(
            file_name_from_url("https://sos.example.gov/docs/Annual%20Report.pdf", "application/pdf"),
            "Annual Report.pdf"
        );
    }

    #[test]
    fn test_file_name_from_url_appends_extension() {
        assert_eq!(
            file_name_from_url("https://sos.example.gov/download/12345", "application/pdf"),
            "12345.pdf"
        );
    }

    #[test]
    fn test_file_name_from_url_falls_back_for_root() {
        assert_eq!(
            file_name_from_url("https://sos.example.gov/", "application/pdf"),
            "document.pdf"
        );
        assert_eq!(file_name_from_url("not a url", "image/png"), "document.png");
    }

    #[test]
    fn test_sanitize_filename_rejects_dot_names() {
        assert_eq!(sanitize_filename(".."), "_");
        assert_eq!(sanitize_filename(""), "_");
    }
}
