use axum::{Json, extract::State, extract::rejection::JsonRejection, http::StatusCode};
use std::sync::Arc;

use super::error::AuthError;
use super::service::{AuthResponse, LoginRequest, SignUpRequest, SignUpResponse};
use crate::gateway::types::error_codes;
use crate::gateway::{state::AppState, types::ApiResponse};

type ErrorResponse = (StatusCode, Json<ApiResponse<()>>);

fn bad_body(rejection: JsonRejection) -> ErrorResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error(
            error_codes::INVALID_PARAMETER,
            rejection.body_text(),
        )),
    )
}

fn auth_error(e: AuthError) -> ErrorResponse {
    let status = StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let (code, msg) = match &e {
        AuthError::Validation(_) => (error_codes::INVALID_PARAMETER, e.to_string()),
        AuthError::EmailTaken => (error_codes::EMAIL_TAKEN, e.to_string()),
        AuthError::InvalidCredentials | AuthError::InvalidToken => {
            (error_codes::AUTH_FAILED, e.to_string())
        }
        AuthError::Internal(detail) => {
            tracing::error!(error = %detail, "Auth request failed");
            (error_codes::INTERNAL_ERROR, "internal server error".to_string())
        }
    };
    (status, Json(ApiResponse::<()>::error(code, msg)))
}

/// Register a new customer
///
/// POST /v1/sign-up
#[utoipa::path(
    post,
    path = "/v1/sign-up",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Customer and account created", body = ApiResponse<SignUpResponse>),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<SignUpResponse>>), ErrorResponse> {
    let Json(req) = payload.map_err(bad_body)?;

    let created = state.user_auth.sign_up(req).await.map_err(auth_error)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

/// Login customer
///
/// POST /v1/login
#[utoipa::path(
    post,
    path = "/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ErrorResponse> {
    let Json(req) = payload.map_err(bad_body)?;

    match state.user_auth.login(req).await {
        Ok(resp) => Ok((StatusCode::OK, Json(ApiResponse::success(resp)))),
        Err(e) => {
            if matches!(e, AuthError::InvalidCredentials) {
                tracing::warn!("Login failed: invalid credentials");
            }
            Err(auth_error(e))
        }
    }
}
