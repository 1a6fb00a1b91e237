//! HTTP listener.
//!
//! | Route | Success | Failure |
//! |---|---|---|
//! | `POST /v1/sos/jobs` | 202 `{jobId, status}` | 400 |
//! | `POST /v1/sos/documents` | 200 dispatch counts | 400, 502 |
//! | `POST /v1/debug/fetch` | 200 `{fileName, contentType, base64Data}` | 400, 502 |
//! | `GET /health` | 200 `ok` | |

mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tracing::info;

use crate::relay::RelayPipeline;

pub use handlers::ApiError;

/// Shared handler state.
#[derive(Debug)]
pub struct AppState {
    /// The job pipeline.
    pub pipeline: RelayPipeline,
}

/// Builds the router with request tracing.
#[must_use]
pub fn router(pipeline: RelayPipeline) -> Router {
    let state = Arc::new(AppState { pipeline });

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/v1/sos/jobs", post(handlers::submit_job))
        .route("/v1/sos/documents", post(handlers::submit_documents))
        .route("/v1/debug/fetch", post(handlers::debug_fetch))
        .with_state(state)
        // Method and path only; bodies carry tokens and document bytes.
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}

/// Binds `addr` and serves until the process exits.
///
/// # Errors
///
/// Returns an I/O error if the address cannot be bound or the server fails.
pub async fn serve(addr: SocketAddr, pipeline: RelayPipeline) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "registry relay listening");
    axum::serve(listener, router(pipeline)).await
}
