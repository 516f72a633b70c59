use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use utoipa::ToSchema;

use crate::AppState;

/// Component health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Up,
    Down,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub database: ComponentStatus,
    pub version: String,
    pub latency_ms: u64,
}

/// Liveness plus a database ping. Answers 503 when the ping fails.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and database reachable", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let db_result = crate::db::check_connection(&state.db).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let (status_code, status) = match &db_result {
        Ok(()) => (StatusCode::OK, ComponentStatus::Up),
        Err(e) => {
            tracing::error!(error = %e, "health check database ping failed");
            (StatusCode::SERVICE_UNAVAILABLE, ComponentStatus::Down)
        }
    };

    (
        status_code,
        Json(HealthResponse {
            status,
            database: status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            latency_ms,
        }),
    )
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}
