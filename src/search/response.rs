//! Search API payload model and classification.

use serde_json::Value;
use tracing::warn;

/// Field carrying result entries.
pub const RESULTS_FIELD: &str = "results";

/// Field carrying the continuation token.
pub const RETRY_FIELD: &str = "retryId";

/// Name used when the search API omits a document name.
const DEFAULT_DOCUMENT_NAME: &str = "Document";

/// A document attached to a business record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    /// Declared document name, possibly without extension.
    pub name: String,
    /// Where the document can be downloaded.
    pub source_url: String,
}

/// One result entry from the search API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusinessRecord {
    /// Link to the registry's profile page for the business.
    pub profile_url: Option<String>,
    /// Attached documents, in API order.
    pub documents: Vec<DocumentRef>,
}

/// Interpretation of a single search API payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchResponse {
    /// The search is still running; poll again with the token.
    Pending {
        /// Opaque continuation token.
        continuation_token: String,
    },
    /// The payload is final.
    Complete {
        /// Parsed result entries (possibly empty).
        records: Vec<BusinessRecord>,
    },
}

/// Classifies a raw payload.
///
/// Result entries win over a continuation token in the same payload. A payload
/// with neither is complete with zero records.
#[must_use]
pub fn classify_search_payload(payload: &Value) -> SearchResponse {
    let entries = payload
        .get(RESULTS_FIELD)
        .and_then(Value::as_array)
        .filter(|entries| !entries.is_empty());

    if let Some(entries) = entries {
        return SearchResponse::Complete {
            records: entries.iter().map(parse_record).collect(),
        };
    }

    match continuation_token(payload) {
        Some(continuation_token) => SearchResponse::Pending { continuation_token },
        None => SearchResponse::Complete {
            records: Vec::new(),
        },
    }
}

/// Returns the continuation token, accepting string or numeric ids.
#[must_use]
pub fn continuation_token(payload: &Value) -> Option<String> {
    match payload.get(RETRY_FIELD)? {
        Value::String(token) if !token.trim().is_empty() => Some(token.clone()),
        Value::Number(token) => Some(token.to_string()),
        _ => None,
    }
}

fn parse_record(entry: &Value) -> BusinessRecord {
    let profile_url = non_empty_str(entry.get("url"));
    let documents = entry
        .get("documents")
        .and_then(Value::as_array)
        .map(|docs| docs.iter().filter_map(parse_document).collect())
        .unwrap_or_default();
    BusinessRecord {
        profile_url,
        documents,
    }
}

fn parse_document(doc: &Value) -> Option<DocumentRef> {
    let Some(source_url) = non_empty_str(doc.get("url")) else {
        warn!(document = %doc, "skipping search document without url");
        return None;
    };
    let name = non_empty_str(doc.get("name")).unwrap_or_else(|| DEFAULT_DOCUMENT_NAME.to_string());
    Some(DocumentRef { name, source_url })
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_results_win_over_retry_token() {
        let payload = json!({
            "retryId": "abc",
            "results": [{"url": "http://x/profile", "documents": []}]
        });
        match classify_search_payload(&payload) {
            SearchResponse::Complete { records } => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].profile_url.as_deref(), Some("http://x/profile"));
            }
            other => panic!("Expected Complete, got: {other:?}"),
        }
    }

    #[test]
    fn test_retry_token_with_empty_results_is_pending() {
        let payload = json!({"retryId": "abc", "results": []});
        assert_eq!(
            classify_search_payload(&payload),
            SearchResponse::Pending {
                continuation_token: "abc".to_string()
            }
        );
    }

    #[test]
    fn test_numeric_retry_token_is_pending() {
        let payload = json!({"retryId": 42});
        assert_eq!(
            classify_search_payload(&payload),
            SearchResponse::Pending {
                continuation_token: "42".to_string()
            }
        );
    }

    #[test]
    fn test_blank_retry_token_is_complete_and_empty() {
        let payload = json!({"retryId": "  "});
        assert_eq!(
            classify_search_payload(&payload),
            SearchResponse::Complete {
                records: Vec::new()
            }
        );
    }

    #[test]
    fn test_payload_without_results_or_token_is_complete() {
        assert_eq!(
            classify_search_payload(&json!({"status": "ok"})),
            SearchResponse::Complete {
                records: Vec::new()
            }
        );
    }

    #[test]
    fn test_documents_parsed_in_order_and_invalid_skipped() {
        let payload = json!({
            "results": [{
                "documents": [
                    {"name": "cert", "url": "http://x/cert.pdf"},
                    {"name": "no-url"},
                    {"url": "http://x/unnamed"},
                    {"name": "annual", "url": "http://x/annual.pdf"}
                ]
            }]
        });
        let SearchResponse::Complete { records } = classify_search_payload(&payload) else {
            panic!("Expected Complete");
        };
        let record = &records[0];
        assert_eq!(record.profile_url, None);
        let names: Vec<&str> = record.documents.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["cert", "Document", "annual"]);
        assert_eq!(record.documents[1].source_url, "http://x/unnamed");
    }
}
