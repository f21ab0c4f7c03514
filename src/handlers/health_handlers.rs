//! Liveness handler.
//!
//! - GET /api/v1/health -> `{"ok": true}`

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;

/// `GET /api/v1/health`
///
/// Always 200. Does not touch the blob store, so it stays green during a
/// storage outage.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { ok: true }))
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
}
