//! Transfer handler

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
};
use serde::Deserialize;
use utoipa::ToSchema;

use super::super::state::AppState;
use super::super::types::ApiError;
use crate::core_types::{CustomerId, IdempotencyKey};
use crate::transfer::TransferRequest;
use crate::user_auth::AuthenticatedCustomer;

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Transfer request body; the sender is the authenticated customer
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferBody {
    /// Receiving customer
    pub customer_receiver_id: CustomerId,
    /// Amount in minor units
    #[schema(example = 2500)]
    pub amount: u64,
}

fn idempotency_key(headers: &HeaderMap) -> Result<IdempotencyKey, ApiError> {
    let raw = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .ok_or_else(|| ApiError::bad_request("missing Idempotency-Key header"))?;

    raw.to_str()
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| ApiError::bad_request("Idempotency-Key must be a UUID"))
}

/// Transfer funds to another customer
///
/// POST /v1/transfer
///
/// Exactly-once per `Idempotency-Key`: a repeated key returns 204 without
/// moving money again.
#[utoipa::path(
    post,
    path = "/v1/transfer",
    request_body = TransferBody,
    params(
        ("Idempotency-Key" = String, Header, description = "Client-generated UUID identifying this transfer intent")
    ),
    responses(
        (status = 204, description = "Transfer settled or already settled"),
        (status = 400, description = "Invalid body or Idempotency-Key"),
        (status = 401, description = "Missing or invalid token"),
        (status = 409, description = "Self transfer, zero amount or insufficient balance"),
        (status = 500, description = "Internal server error"),
        (status = 503, description = "Timed out, safe to retry with the same key")
    ),
    security(("bearer_auth" = [])),
    tag = "Transfer"
)]
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    Extension(customer): Extension<AuthenticatedCustomer>,
    headers: HeaderMap,
    payload: Result<Json<TransferBody>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let key = idempotency_key(&headers)?;
    let Json(body) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let req = TransferRequest::new(
        customer.customer_id,
        body.customer_receiver_id,
        key,
        body.amount,
    );

    state.coordinator.execute(req).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_idempotency_key_header() {
        let mut headers = HeaderMap::new();
        assert!(idempotency_key(&headers).is_err());

        headers.insert(IDEMPOTENCY_KEY_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert_eq!(
            idempotency_key(&headers).unwrap_err().status,
            StatusCode::BAD_REQUEST
        );

        let key = IdempotencyKey::new();
        headers.insert(
            IDEMPOTENCY_KEY_HEADER,
            HeaderValue::from_str(&key.to_string()).unwrap(),
        );
        assert_eq!(idempotency_key(&headers).unwrap(), key);
    }

    #[test]
    fn test_body_rejects_negative_amount() {
        let receiver = CustomerId::new();
        let ok: TransferBody = serde_json::from_value(serde_json::json!({
            "customerReceiverId": receiver.to_string(),
            "amount": 2500
        }))
        .unwrap();
        assert_eq!(ok.customer_receiver_id, receiver);

        let negative = serde_json::from_value::<TransferBody>(serde_json::json!({
            "customerReceiverId": receiver.to_string(),
            "amount": -1
        }));
        assert!(negative.is_err());
    }
}
