use axum::{extract::State, response::IntoResponse, Json};

use crate::api::server::SharedAppState;

/// GET /api/health
///
/// Reports which collaborators have their secrets configured.
pub async fn handle_health(State(state): State<SharedAppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "deposit-gate",
        "version": env!("CARGO_PKG_VERSION"),
        "exchange": state.verifier.is_ok(),
        "payments": state.payments.is_ok(),
        "profiles": state.profiles.is_ok()
    }))
}
