use std::sync::Arc;

use axum::{
    extract::rejection::JsonRejection,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::Value;
use tracing::{info, warn};

use dossier_common::types::ProfileInput;

use crate::AppState;

use super::{internal_error, store_unavailable};

/// Decode the submitted identity document. `None` means the body was
/// missing or not the expected object shape.
fn parse_input(body: Option<Json<Value>>) -> Option<ProfileInput> {
    let Json(value) = body?;
    serde_json::from_value(value).ok()
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

pub async fn api_process_profile(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> impl IntoResponse {
    if !state.cache.ping().await {
        return store_unavailable();
    }
    let Some(input) = parse_input(body.ok()) else {
        return bad_request("JSON body is required");
    };
    if !input.has_name() {
        return bad_request("firstName or lastName is required");
    }

    let outcome = state.jobs.submit(&input).await;
    let code = if outcome.cached {
        StatusCode::OK
    } else {
        StatusCode::ACCEPTED
    };
    (code, Json(outcome)).into_response()
}

pub async fn api_cache_clear(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> impl IntoResponse {
    if !state.cache.ping().await {
        return store_unavailable();
    }
    let input = match parse_input(body.ok()) {
        Some(input) if input.has_name() => input,
        _ => return bad_request("firstName or lastName is required"),
    };

    match state.jobs.invalidate(&input).await {
        Ok(deleted) => {
            info!(candidate = %input.display_name(), deleted, "Cleared cached profile");
            Json(serde_json::json!({ "success": true, "deleted": deleted })).into_response()
        }
        Err(e) => {
            warn!(error = %e, "Cache invalidation failed");
            internal_error(&e.to_string())
        }
    }
}
