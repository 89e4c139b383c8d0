//! Health check handler

use std::sync::Arc;

use axum::{extract::State, http::StatusCode};

use super::super::state::AppState;

/// Health check endpoint
///
/// - Healthy: 204 No Content
/// - Database unreachable: 503 Service Unavailable
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 204, description = "Service healthy"),
        (status = 503, description = "Service unavailable")
    ),
    tag = "System"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> StatusCode {
    match state.db.health_check().await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(e) => {
            tracing::error!("[HEALTH] PostgreSQL ping failed: {}", e);
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
