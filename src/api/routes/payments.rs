//! Payment intent endpoint

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::api::body::parse_body;
use crate::api::error::ApiError;
use crate::api::server::SharedAppState;
use crate::payments::CheckoutSession;

/// POST /api/create-payment-intent
///
/// Body `{ plan }`; an unreadable body is treated as `{}` and fails plan lookup.
pub async fn handle_create_payment_intent(
    State(state): State<SharedAppState>,
    body: Bytes,
) -> Result<Json<CheckoutSession>, ApiError> {
    let payments = state
        .payments
        .as_ref()
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let body: Value = parse_body(&body).unwrap_or_else(|_| json!({}));
    let session = payments.checkout(&body).await?;

    Ok(Json(session))
}

pub async fn handle_method_not_allowed() -> ApiError {
    ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").with_allow("POST")
}
