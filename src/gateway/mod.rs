//! HTTP Gateway
//!
//! Thin adapter over the transfer coordinator and the auth service: parses
//! requests, authenticates customers and maps outcomes to status codes.

pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use axum::{
    Json, Router,
    body::Body,
    http::{HeaderValue, Request},
    middleware::{Next, from_fn, from_fn_with_state},
    response::Response,
    routing::{get, post},
};
use anyhow::Context;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::Instrument;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::user_auth::middleware::jwt_auth_middleware;
use state::AppState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Assign or propagate a request id and log every request with its latency
async fn request_logger(request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty() && s.len() <= 128)
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let span = tracing::info_span!("http", request_id = %request_id, %method, %path);

    let start = Instant::now();
    let mut response = next.run(request).instrument(span.clone()).await;
    let status = response.status().as_u16();
    let latency_ms = start.elapsed().as_millis() as u64;

    span.in_scope(|| {
        if response.status().is_server_error() {
            tracing::warn!(status, latency_ms, "Request failed");
        } else {
            tracing::info!(status, latency_ms, "Request completed");
        }
    });

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi::ApiDoc::openapi())
}

/// Build the complete router
pub fn build_router(state: Arc<AppState>) -> Router {
    // Customer routes - protected by JWT
    let customer_routes = Router::new()
        .route("/transfer", post(handlers::create_transfer))
        .route(
            "/transactions-history",
            get(handlers::get_transactions_history),
        )
        .layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    let auth_routes = Router::new()
        .route("/sign-up", post(crate::user_auth::handlers::sign_up))
        .route("/login", post(crate::user_auth::handlers::login));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/v1", auth_routes.merge(customer_routes))
        .layer(from_fn(request_logger))
        .with_state(state)
}

/// Start HTTP Gateway server, returning after a graceful shutdown
pub async fn run_server(config: &GatewayConfig, state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Gateway listening on http://{}", addr);
    tracing::info!("OpenAPI document: http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections");
}
