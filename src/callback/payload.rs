//! Callback payload shapes.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::fetch::FetchedDocument;

/// Field carrying the caller's record id in every callback.
pub const CORRELATION_KEY: &str = "recordId";

/// Builds the record-level body: the raw search payload with the record id merged in.
///
/// Non-object payloads are wrapped under `results`.
#[must_use]
pub fn record_payload(record_id: &str, raw: &Value) -> Value {
    let mut body = match raw {
        Value::Object(map) => map.clone(),
        other => {
            let mut map = Map::new();
            map.insert("results".to_string(), other.clone());
            map
        }
    };
    body.insert(
        CORRELATION_KEY.to_string(),
        Value::String(record_id.to_string()),
    );
    Value::Object(body)
}

/// What a file callback carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FileKind {
    /// A registry document.
    Document,
    /// The business's registry profile link.
    ProfileLink,
}

/// Body of a file-level callback.
///
/// Content-bearing callbacks carry `contentType` and `base64Data`; URL-only
/// callbacks carry just the source URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePayload {
    /// Correlation key.
    pub record_id: String,
    /// Document or profile link.
    pub kind: FileKind,
    /// Name presented downstream.
    pub file_name: String,
    /// MIME type of `base64_data`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Base64-encoded file bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base64_data: Option<String>,
    /// Where the file came from.
    pub source_url: String,
}

impl FilePayload {
    /// A callback carrying fetched bytes.
    #[must_use]
    pub fn with_content(
        record_id: &str,
        kind: FileKind,
        document: &FetchedDocument,
        source_url: &str,
    ) -> Self {
        Self {
            record_id: record_id.to_string(),
            kind,
            file_name: document.file_name.clone(),
            content_type: Some(document.content_type.clone()),
            base64_data: Some(document.base64_payload()),
            source_url: source_url.to_string(),
        }
    }

    /// A callback carrying only the source URL.
    #[must_use]
    pub fn url_only(record_id: &str, kind: FileKind, file_name: &str, source_url: &str) -> Self {
        Self {
            record_id: record_id.to_string(),
            kind,
            file_name: file_name.to_string(),
            content_type: None,
            base64_data: None,
            source_url: source_url.to_string(),
        }
    }
}
