use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::core_types::CustomerId;
use crate::gateway::{
    state::AppState,
    types::{ApiResponse, error_codes},
};

/// Customer resolved from a valid bearer token
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedCustomer {
    pub customer_id: CustomerId,
}

fn unauthorized(code: i32, msg: &str) -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiResponse::<()>::error(code, msg)),
    )
}

pub async fn jwt_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<()>>)> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| unauthorized(error_codes::MISSING_AUTH, "Missing Authorization header"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized(error_codes::AUTH_FAILED, "Invalid token format"))?;

    let customer_id = state
        .user_auth
        .verify_token(token)
        .and_then(|claims| claims.customer_id())
        .map_err(|_| unauthorized(error_codes::AUTH_FAILED, "Invalid or expired token"))?;

    request
        .extensions_mut()
        .insert(AuthenticatedCustomer { customer_id });
    Ok(next.run(request).await)
}
