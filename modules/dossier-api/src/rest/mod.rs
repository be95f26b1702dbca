pub mod profile;

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::warn;
use uuid::Uuid;

use dossier_common::types::JobRecord;
use dossier_common::DossierError;

use crate::AppState;

// --- Helpers ---

/// 503 used by every endpoint that needs the cache store.
pub fn store_unavailable() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(serde_json::json!({
            "error": "Cache store is not available",
            "success": false,
        })),
    )
        .into_response()
}

pub fn internal_error(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": message, "success": false })),
    )
        .into_response()
}

fn job_not_found(job_id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Job not found", "job_id": job_id })),
    )
        .into_response()
}

/// Wire shape for a status lookup: id and status always, plus the
/// result or error carried by a terminal record.
fn status_body(job_id: &str, record: JobRecord) -> serde_json::Value {
    let mut body = serde_json::json!({
        "job_id": job_id,
        "status": record.status,
    });
    if let Some(obj) = body.as_object_mut() {
        if let Some(result) = record.result {
            obj.insert("result".to_string(), result);
        }
        if let Some(error) = record.error {
            obj.insert("error".to_string(), serde_json::Value::String(error));
        }
    }
    body
}

// --- Handlers ---

pub async fn api_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let cache = if state.cache.ping().await {
        "connected"
    } else {
        "disconnected"
    };
    Json(serde_json::json!({ "status": "ok", "cache": cache }))
}

pub async fn api_profile_status(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> impl IntoResponse {
    if !state.cache.ping().await {
        return store_unavailable();
    }
    // An id we could never have issued behaves like an expired one.
    let uuid = match Uuid::parse_str(&job_id) {
        Ok(u) => u,
        Err(_) => return job_not_found(&job_id),
    };

    match state.jobs.status(uuid).await {
        Ok(record) => Json(status_body(&job_id, record)).into_response(),
        Err(DossierError::JobNotFound(_)) => job_not_found(&job_id),
        Err(e) => {
            warn!(%job_id, error = %e, "Failed to load job status");
            internal_error(&e.to_string())
        }
    }
}
