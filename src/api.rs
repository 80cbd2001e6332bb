//! HTTP surface: health check and batch triage over multipart uploads.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tracing::{Instrument, info, info_span, warn};

use crate::error::PipelineError;
use crate::pipeline::MessageProcessor;
use crate::pipeline::types::{ProcessRequest, Upload};

/// Request bodies may carry several files, each up to the per-file limit.
const MAX_FILES_PER_REQUEST: usize = 10;

/// Shared state for the triage routes.
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<MessageProcessor>,
}

/// Build the Axum router with the triage routes.
pub fn triage_routes(processor: Arc<MessageProcessor>, max_upload_bytes: usize) -> Router {
    let body_limit = max_upload_bytes
        .saturating_mul(MAX_FILES_PER_REQUEST)
        .saturating_add(64 * 1024);

    Router::new()
        .route("/health", get(health))
        .route("/process", post(process))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(AppState { processor })
}

// ── Errors ──────────────────────────────────────────────────────────────

/// A pipeline error rendered as `400 {"error": ...}`.
pub struct ApiError(PipelineError);

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

// ── Handlers ────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn process(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let request_id = uuid::Uuid::new_v4();
    let span = info_span!("process", %request_id);

    async move {
        let request = read_form(multipart).await.inspect_err(|e| {
            warn!(error = %e.0, "Rejected malformed upload");
        })?;
        let batch = state.processor.process(request).await.inspect_err(|e| {
            info!(error = %e, "Batch rejected");
        })?;
        Ok::<_, ApiError>(Json(batch).into_response())
    }
    .instrument(span)
    .await
}

/// Read `email_files` (repeatable), `email_text` and `observacoes`.
async fn read_form(mut multipart: Multipart) -> Result<ProcessRequest, ApiError> {
    let mut request = ProcessRequest::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PipelineError::Upload(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "email_files" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| PipelineError::Upload(e.to_string()))?;
                request.files.push(Upload {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            "email_text" | "observacoes" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| PipelineError::Upload(e.to_string()))?;
                if name == "email_text" {
                    request.text = Some(value);
                } else {
                    request.extra_instructions = Some(value);
                }
            }
            other => {
                info!(field = other, "Ignoring unknown form field");
            }
        }
    }

    Ok(request)
}
