//! Deposit verification endpoint

use axum::{body::Bytes, extract::State, http::StatusCode, Extension, Json};
use serde::Serialize;

use crate::api::body::parse_body;
use crate::api::error::{ApiError, SERVER_ERROR};
use crate::api::middleware::CorrelationId;
use crate::api::server::SharedAppState;
use crate::common::logging::log_security_event;
use crate::verifier::{VerificationRequest, VerificationResult};

#[derive(Debug, Serialize)]
pub struct CheckDepositResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub result: VerificationResult,
}

/// POST /api/bybit-check-deposit
///
/// Looks for a completed deposit matching the claim around `pressedAt`.
pub async fn handle_check_deposit(
    State(state): State<SharedAppState>,
    correlation: Option<Extension<CorrelationId>>,
    body: Bytes,
) -> Result<Json<CheckDepositResponse>, ApiError> {
    let verifier = match &state.verifier {
        Ok(verifier) => verifier,
        Err(e) => {
            log_security_event(
                "exchange_credentials_missing",
                serde_json::json!({ "endpoint": "/api/bybit-check-deposit" }),
                correlation.as_ref().map(|Extension(id)| id.0.as_str()),
            );
            return Err(ApiError::deposit(e.to_string()));
        }
    };

    let body = parse_body(&body).map_err(|e| ApiError::deposit(SERVER_ERROR).with("details", e.to_string()))?;
    let request = VerificationRequest::from_body(&body);
    let result = verifier.verify(&request).await?;

    Ok(Json(CheckDepositResponse { ok: true, result }))
}

/// Any other method on the verification endpoint
pub async fn handle_method_not_allowed() -> ApiError {
    ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed. Use POST.")
        .with_ok_flag()
        .with_allow("POST")
}
