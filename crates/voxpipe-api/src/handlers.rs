//! Request handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use voxpipe_models::{TaskDescriptor, TaskKind};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Webhook request body.
#[derive(Debug, Deserialize)]
pub struct WebhookRequest {
    /// Action name; must map to a task kind.
    pub action: String,
    /// Record the pipeline operates on.
    #[serde(rename = "recordId")]
    pub record_id: String,
}

/// Acknowledgement body for an accepted task.
///
/// 202 means the task is queued, not executed; pipeline failures are only
/// visible out-of-band.
#[derive(Debug, Serialize)]
pub struct WebhookAccepted {
    pub status: &'static str,
    pub action: &'static str,
    #[serde(rename = "recordId")]
    pub record_id: String,
}

/// POST /webhook
///
/// Validates the request, builds a task descriptor, and enqueues it.
///
/// Returns:
/// - 202: task accepted and queued
/// - 400: body did not parse, unknown action, or empty record id
/// - 500: queue unavailable
pub async fn webhook(
    State(state): State<AppState>,
    payload: Result<Json<WebhookRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<WebhookAccepted>)> {
    let Json(request) = payload.map_err(|e| ApiError::invalid_payload(e.body_text()))?;

    let kind = TaskKind::parse(&request.action)
        .ok_or_else(|| ApiError::unknown_action(&request.action))?;

    let record_id = request.record_id.trim();
    if record_id.is_empty() {
        return Err(ApiError::invalid_payload("recordId must be non-empty"));
    }

    let task = TaskDescriptor::new(kind, record_id);
    state.queue.enqueue(&task.encode()).await?;

    info!(record_id = %task.record_id, action = %kind, "Task queued");

    Ok((
        StatusCode::ACCEPTED,
        Json(WebhookAccepted {
            status: "queued",
            action: kind.as_str(),
            record_id: task.record_id,
        }),
    ))
}

/// GET /health — liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /ready — readiness probe.
pub async fn ready() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ready" }))
}
