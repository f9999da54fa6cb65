//! Profile signup endpoint

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::api::body::parse_body;
use crate::api::error::ApiError;
use crate::api::server::SharedAppState;

/// POST /api/create-profile
pub async fn handle_create_profile(
    State(state): State<SharedAppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let profiles = state
        .profiles
        .as_ref()
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let body = parse_body(&body)?;
    let profile = profiles.create(&body).await?;

    Ok(Json(json!({ "ok": true, "profile": profile })))
}

pub async fn handle_method_not_allowed() -> ApiError {
    ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed").with_allow("POST")
}
