// src/handlers/health.rs

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

// GET /api/health
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses(
        (status = 200, description = "Serviço no ar")
    )
)]
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
