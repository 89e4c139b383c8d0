//! Transaction history handler

use std::sync::Arc;

use axum::{
    Extension,
    extract::{Query, State},
};
use serde::Deserialize;
use utoipa::IntoParams;

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResponse, ApiResult, ok};
use crate::transfer::TransferHistoryEntry;
use crate::user_auth::AuthenticatedCustomer;

const DEFAULT_LIMIT: u32 = 50;
const MAX_LIMIT: u32 = 100;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// Page size, 1..=100 (default 50)
    pub limit: Option<u32>,
    /// Rows to skip (default 0)
    pub offset: Option<u32>,
}

impl HistoryQuery {
    fn page(&self) -> Result<(i64, i64), ApiError> {
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        if limit == 0 || limit > MAX_LIMIT {
            return ApiError::bad_request(format!("limit must be between 1 and {}", MAX_LIMIT))
                .into_err();
        }
        Ok((i64::from(limit), i64::from(self.offset.unwrap_or(0))))
    }
}

/// Transfers sent or received by the authenticated customer, newest first
///
/// GET /v1/transactions-history
#[utoipa::path(
    get,
    path = "/v1/transactions-history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Transaction history", body = ApiResponse<Vec<TransferHistoryEntry>>),
        (status = 400, description = "Invalid paging parameters"),
        (status = 401, description = "Missing or invalid token"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Transfer"
)]
pub async fn get_transactions_history(
    State(state): State<Arc<AppState>>,
    Extension(customer): Extension<AuthenticatedCustomer>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Vec<TransferHistoryEntry>> {
    let (limit, offset) = query.page()?;

    match state.history.history(customer.customer_id, limit, offset).await {
        Ok(entries) => ok(entries),
        Err(e) => {
            tracing::error!(customer_id = %customer.customer_id, error = %e, "History query failed");
            ApiError::internal().into_err()
        }
    }
}
