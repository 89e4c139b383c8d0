//! API Response types and error codes
//!
//! - `ApiResponse<T>`: Unified response wrapper
//! - `ApiError`: Error side of `ApiResult`, rendered as an `ApiResponse`
//! - `error_codes`: Standard error code constants

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::transfer::TransferError;

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// All API responses follow this structure:
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: actual data (success) or null (error)
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response code: 0 for success, non-zero for errors
    #[schema(example = 0)]
    pub code: i32,
    /// Response message
    #[schema(example = "ok")]
    pub msg: String,
    /// Response data (only present when code == 0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create success response
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    /// Create error response
    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

// ============================================================================
// Error Response
// ============================================================================

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Wrap data in a success envelope
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER, msg)
    }

    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::INTERNAL_ERROR,
            "internal server error",
        )
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            error_codes::SERVICE_UNAVAILABLE,
            msg,
        )
    }

    pub fn into_err<T>(self) -> Result<T, Self> {
        Err(self)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ApiResponse::<()>::error(self.code, self.msg)),
        )
            .into_response()
    }
}

/// Business rejections keep their message; everything else is opaque
impl From<TransferError> for ApiError {
    fn from(e: TransferError) -> Self {
        let status =
            StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match e {
            TransferError::SelfTransfer => Self::new(status, error_codes::SELF_TRANSFER, e.to_string()),
            TransferError::ZeroAmount => Self::new(status, error_codes::ZERO_AMOUNT, e.to_string()),
            TransferError::InsufficientBalance => {
                Self::new(status, error_codes::INSUFFICIENT_BALANCE, e.to_string())
            }
            TransferError::Timeout => Self::new(
                status,
                error_codes::SERVICE_UNAVAILABLE,
                "transfer timed out, retry with the same Idempotency-Key",
            ),
            TransferError::InvariantViolation(_) | TransferError::Database(_) => Self::internal(),
        }
    }
}

// ============================================================================
// Error Codes
// ============================================================================

/// Standard API error codes
pub mod error_codes {
    // Success
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const INSUFFICIENT_BALANCE: i32 = 1002;
    pub const SELF_TRANSFER: i32 = 1003;
    pub const ZERO_AMOUNT: i32 = 1004;
    pub const EMAIL_TAKEN: i32 = 1005;

    // Auth errors (2xxx)
    pub const MISSING_AUTH: i32 = 2001;
    pub const AUTH_FAILED: i32 = 2002;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SERVICE_UNAVAILABLE: i32 = 5001;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_error_mapping() {
        let e = ApiError::from(TransferError::InsufficientBalance);
        assert_eq!(e.status, StatusCode::CONFLICT);
        assert_eq!(e.code, error_codes::INSUFFICIENT_BALANCE);

        let e = ApiError::from(TransferError::Timeout);
        assert_eq!(e.status, StatusCode::SERVICE_UNAVAILABLE);

        // Internal details never reach the client
        let e = ApiError::from(TransferError::InvariantViolation("sender account missing".into()));
        assert_eq!(e.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!e.msg.contains("sender"));
        let e = ApiError::from(TransferError::Database("connection reset".into()));
        assert_eq!(e.msg, "internal server error");
    }

    #[test]
    fn test_error_envelope_serialization() {
        let json = serde_json::to_value(ApiResponse::<()>::error(error_codes::AUTH_FAILED, "nope")).unwrap();
        assert_eq!(json["code"], 2002);
        assert_eq!(json["msg"], "nope");
        assert!(json.get("data").is_none());
    }
}
