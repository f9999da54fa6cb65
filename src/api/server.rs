//! API Server Module
//!
//! Application state, router and server startup.

use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use super::middleware::{request_logging_middleware, security_headers_middleware};
use super::routes::{deposits, health, payments, profiles};
use crate::bybit::BybitClient;
use crate::common::config::{ConfigError, GatewayConfig};
use crate::common::error::Result;
use crate::payments::{PaymentService, PriceTable, StripeClient};
use crate::profiles::{PackageTable, ProfileService, SupabaseClient};
use crate::verifier::DepositVerifier;

/// Shared, read-only state for all endpoints
///
/// A collaborator whose secrets are missing is kept as the configuration
/// error; its endpoint reports that error without any outbound call.
pub struct AppState {
    pub verifier: std::result::Result<DepositVerifier, ConfigError>,
    pub payments: std::result::Result<PaymentService, ConfigError>,
    pub profiles: std::result::Result<ProfileService, ConfigError>,
}

/// Shared application state type
pub type SharedAppState = Arc<AppState>;

impl AppState {
    /// Build every configured collaborator with the default plan tables
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        Self::with_tables(config, PriceTable::default(), PackageTable::default())
    }

    pub fn with_tables(config: &GatewayConfig, prices: PriceTable, packages: PackageTable) -> Result<Self> {
        let timeout = config.upstream_timeout();

        let verifier = match config.require_bybit() {
            Ok(credentials) => {
                let client = BybitClient::from_settings(&config.bybit, credentials, timeout)?;
                Ok(DepositVerifier::new(Arc::new(client)).with_max_window_minutes(config.max_window_minutes))
            }
            Err(e) => Err(e),
        };

        let payments = match config.require_stripe() {
            Ok(secret_key) => {
                let client = StripeClient::new(secret_key, &config.stripe.base_url, timeout)?;
                Ok(PaymentService::new(Arc::new(client), prices))
            }
            Err(e) => Err(e),
        };

        let profiles = match config.require_supabase() {
            Ok((url, anon_key)) => {
                let client = SupabaseClient::new(url, anon_key, timeout)?;
                Ok(ProfileService::new(Arc::new(client), packages))
            }
            Err(e) => Err(e),
        };

        Ok(Self {
            verifier,
            payments,
            profiles,
        })
    }

    pub fn with_verifier(mut self, verifier: DepositVerifier) -> Self {
        self.verifier = Ok(verifier);
        self
    }

    pub fn with_payments(mut self, payments: PaymentService) -> Self {
        self.payments = Ok(payments);
        self
    }

    pub fn with_profiles(mut self, profiles: ProfileService) -> Self {
        self.profiles = Ok(profiles);
        self
    }

    pub fn shared(self) -> SharedAppState {
        Arc::new(self)
    }
}

/// Create the API router
pub fn create_router(state: SharedAppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/health", get(health::handle_health))
        .route(
            "/api/bybit-check-deposit",
            post(deposits::handle_check_deposit).fallback(deposits::handle_method_not_allowed),
        )
        .route(
            "/api/create-payment-intent",
            post(payments::handle_create_payment_intent).fallback(payments::handle_method_not_allowed),
        )
        .route(
            "/api/create-profile",
            post(profiles::handle_create_profile).fallback(profiles::handle_method_not_allowed),
        )
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(cors)
        .with_state(state)
}

/// Start the API server
pub async fn start_server(state: SharedAppState, port: u16) -> std::result::Result<(), std::io::Error> {
    let app = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    println!("=== deposit-gate API ===");
    println!("Listening on http://{}", addr);
    println!();
    println!("Endpoints:");
    println!("  POST /api/bybit-check-deposit   - Verify a claimed exchange deposit");
    println!("  POST /api/create-payment-intent - Create a Stripe payment intent for a plan");
    println!("  POST /api/create-profile        - Register a signup profile");
    println!("  GET  /api/health                - Health check");
    println!();

    tracing::info!(target: "deposit_gate::api", %addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bybit::{DepositRecord, MockDepositSource};
    use crate::payments::{MockPaymentIntents, PaymentIntent};
    use crate::profiles::MockProfileStore;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn unconfigured() -> AppState {
        let config = GatewayConfig::from_lookup(|_| None).unwrap();
        AppState::from_config(&config).unwrap()
    }

    fn verifier_with(rows: Value) -> DepositVerifier {
        let records: Vec<DepositRecord> = rows
            .as_array()
            .unwrap()
            .iter()
            .cloned()
            .filter_map(DepositRecord::from_value)
            .collect();
        let mut source = MockDepositSource::new();
        source
            .expect_deposit_records()
            .returning(move |_| Ok(records.clone()));
        DepositVerifier::new(Arc::new(source))
    }

    fn untouched_verifier() -> DepositVerifier {
        let mut source = MockDepositSource::new();
        source.expect_deposit_records().times(0);
        DepositVerifier::new(Arc::new(source))
    }

    async fn post_raw(state: AppState, uri: &str, body: impl Into<Body>) -> Response {
        create_router(state.shared())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(body.into())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn post_json(state: AppState, uri: &str, body: Value) -> Response {
        post_raw(state, uri, serde_json::to_string(&body).unwrap()).await
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = create_router(unconfigured().shared())
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");

        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["exchange"], false);
        assert_eq!(body["payments"], false);
    }

    #[tokio::test]
    async fn test_check_deposit_found() {
        let state = unconfigured().with_verifier(verifier_with(json!([
            {"coin": "USDT", "amount": "103", "status": "3", "txID": "0xabc"},
            {"coin": "USDT", "amount": "50", "status": "3"}
        ])));

        let response = post_json(
            state,
            "/api/bybit-check-deposit",
            json!({"coin": "USDT", "expectedAmount": 100, "tolerance": 5, "pressedAt": 1_700_000_000_000i64}),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["found"], true);
        assert_eq!(body["match"]["txID"], "0xabc");
        assert_eq!(
            body["window"],
            json!({
                "startTime": 1_699_999_700_000i64,
                "endTime": 1_700_000_900_000i64,
                "expectedAmount": 100.0,
                "tolerance": 5.0,
                "coin": "USDT",
                "chain": null
            })
        );
    }

    #[tokio::test]
    async fn test_check_deposit_accepts_string_body() {
        let state = unconfigured().with_verifier(verifier_with(json!([])));
        let inner = json!({"coin": "btc", "expectedAmount": "0.01", "pressedAt": "2024-03-01T10:00:00Z"}).to_string();

        let response = post_json(state, "/api/bybit-check-deposit", Value::String(inner)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["found"], false);
        assert_eq!(body["match"], Value::Null);
        assert_eq!(body["window"]["coin"], "BTC");
    }

    #[tokio::test]
    async fn test_check_deposit_missing_credentials() {
        let response = post_json(
            unconfigured(),
            "/api/bybit-check-deposit",
            json!({"coin": "USDT", "expectedAmount": 100, "pressedAt": 1}),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({"ok": false, "error": "Missing BYBIT_API_KEY or BYBIT_API_SECRET in environment variables."})
        );
    }

    #[tokio::test]
    async fn test_check_deposit_validation_error() {
        let state = unconfigured().with_verifier(untouched_verifier());
        let response = post_json(state, "/api/bybit-check-deposit", json!({"coin": "USDT", "pressedAt": 1})).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"], "expectedAmount must be a positive number.");
    }

    #[tokio::test]
    async fn test_check_deposit_invalid_json() {
        let state = unconfigured().with_verifier(untouched_verifier());
        let response = post_raw(state, "/api/bybit-check-deposit", "{not json").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Server error");
        assert!(body["details"].is_string());
    }

    #[tokio::test]
    async fn test_check_deposit_rejects_get() {
        let response = create_router(unconfigured().shared())
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/bybit-check-deposit")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()["allow"], "POST");
        let body = json_body(response).await;
        assert_eq!(body, json!({"ok": false, "error": "Method not allowed. Use POST."}));
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let response = create_router(unconfigured().shared())
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/bybit-check-deposit")
                    .header("origin", "https://shop.example.com")
                    .header("access-control-request-method", "POST")
                    .header("access-control-request-headers", "content-type")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");

        let methods = headers["access-control-allow-methods"].to_str().unwrap();
        assert!(methods.contains("POST"));
        assert!(methods.contains("OPTIONS"));
        assert!(!methods.contains("GET"));

        let allowed_headers = headers["access-control-allow-headers"].to_str().unwrap();
        assert!(allowed_headers.eq_ignore_ascii_case("content-type"));
    }

    #[tokio::test]
    async fn test_cors_header_on_post() {
        let response = create_router(unconfigured().shared())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/create-payment-intent")
                    .header("origin", "https://shop.example.com")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"plan":"basic"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn test_create_payment_intent() {
        let mut intents = MockPaymentIntents::new();
        intents.expect_create_payment_intent().times(1).returning(|p| {
            Ok(PaymentIntent {
                id: "pi_9".to_string(),
                client_secret: "pi_9_secret_x".to_string(),
                amount: p.amount,
                currency: p.currency.clone(),
            })
        });
        let state = unconfigured().with_payments(PaymentService::new(Arc::new(intents), PriceTable::default()));

        let response = post_json(state, "/api/create-payment-intent", json!({"plan": "basic"})).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"clientSecret": "pi_9_secret_x", "amount": 9900, "currency": "usd"})
        );
    }

    #[tokio::test]
    async fn test_create_payment_intent_invalid_plan() {
        let mut intents = MockPaymentIntents::new();
        intents.expect_create_payment_intent().times(0);
        let state = unconfigured().with_payments(PaymentService::new(Arc::new(intents), PriceTable::default()));

        let response = post_json(state, "/api/create-payment-intent", json!({"plan": "diamond"})).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["receivedPlan"], "diamond");
    }

    #[tokio::test]
    async fn test_create_payment_intent_without_key() {
        let response = post_json(unconfigured(), "/api/create-payment-intent", json!({"plan": "basic"})).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("STRIPE_SECRET_KEY"));
    }

    #[tokio::test]
    async fn test_create_profile() {
        let mut store = MockProfileStore::new();
        store
            .expect_insert_profile()
            .times(1)
            .returning(|p| Ok(json!({"id": "p-1", "full_name": p.full_name, "email": p.email, "package_id": p.package_id})));
        let state = unconfigured().with_profiles(ProfileService::new(Arc::new(store), PackageTable::default()));

        let response = post_json(
            state,
            "/api/create-profile",
            json!({
                "first_name": "Sara",
                "last_name": "Nasser",
                "email": "sara@example.com",
                "phone": "+971500000000",
                "nationality": "Lebanon",
                "residence_country": "UAE",
                "plan": "basic"
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["profile"]["full_name"], "Sara Nasser");
        assert_eq!(body["profile"]["package_id"], "978b133e-6e14-4edf-aa44-133d11fb2929");
    }

    #[tokio::test]
    async fn test_create_profile_missing_fields() {
        let mut store = MockProfileStore::new();
        store.expect_insert_profile().times(0);
        let state = unconfigured().with_profiles(ProfileService::new(Arc::new(store), PackageTable::default()));

        let response = post_json(state, "/api/create-profile", json!({"first_name": "Sara"})).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().starts_with("Missing required fields"));
    }

    #[tokio::test]
    async fn test_create_profile_without_supabase() {
        let response = post_json(unconfigured(), "/api/create-profile", json!({})).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await["error"],
            "Missing SUPABASE_URL or SUPABASE_ANON_KEY in environment variables."
        );
    }
}
