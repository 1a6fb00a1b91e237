//! Route handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use super::AppState;
use crate::fetch::FetchError;
use crate::job::{BulkDocumentsRequest, DebugFetchRequest, JobRequest, ValidationError};
use crate::relay::{DispatchSummary, JobError};

/// An error response with a JSON `{error}` body.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed or incomplete request.
    BadRequest(String),
    /// An upstream dependency failed.
    BadGateway(String),
    /// Anything else.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            Self::BadGateway(m) => (StatusCode::BAD_GATEWAY, m),
            Self::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::Search(_) | JobError::Credential(_) | JobError::RecordCallback(_) => {
                Self::BadGateway(err.to_string())
            }
            JobError::InvalidConcurrency { .. } | JobError::PoolClosed => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::InvalidUrl { .. } => Self::BadRequest(err.to_string()),
            _ => Self::BadGateway(err.to_string()),
        }
    }
}

/// Body of a successful bulk submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DocumentsResponse {
    record_id: String,
    processed: usize,
    #[serde(flatten)]
    summary: DispatchSummary,
}

/// Body of a successful debug fetch.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DebugFetchResponse {
    file_name: String,
    content_type: String,
    base64_data: String,
}

pub(crate) async fn submit_job(
    State(state): State<Arc<AppState>>,
    body: Result<Json<JobRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body?;
    let job = request.validate()?;
    let ack = state.pipeline.submit(job);
    info!(job_id = %ack.job_id, "job queued");
    Ok((StatusCode::ACCEPTED, Json(ack)))
}

pub(crate) async fn submit_documents(
    State(state): State<Arc<AppState>>,
    body: Result<Json<BulkDocumentsRequest>, JsonRejection>,
) -> Result<Json<DocumentsResponse>, ApiError> {
    let Json(request) = body?;
    let batch = request.validate()?;
    let summary = state.pipeline.process_documents(&batch).await.map_err(|e| {
        warn!(record_id = %batch.record_id, error = %e, "bulk documents failed");
        ApiError::from(e)
    })?;
    Ok(Json(DocumentsResponse {
        record_id: batch.record_id,
        processed: summary.documents(),
        summary,
    }))
}

pub(crate) async fn debug_fetch(
    State(state): State<Arc<AppState>>,
    body: Result<Json<DebugFetchRequest>, JsonRejection>,
) -> Result<Json<DebugFetchResponse>, ApiError> {
    let Json(request) = body?;
    let url = request.validate()?;
    let document = state.pipeline.debug_fetch(&url).await.map_err(|e| {
        warn!(url = %url, error = %e, "debug fetch failed");
        ApiError::from(e)
    })?;
    Ok(Json(DebugFetchResponse {
        base64_data: document.base64_payload(),
        file_name: document.file_name,
        content_type: document.content_type,
    }))
}
