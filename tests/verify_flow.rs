//! End-to-end verification through the public API with a recording transport

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use deposit_gate::bybit::{hmac_sha256_hex, BybitClient, ExchangeError, ExchangeTransport, RawResponse, SignedRequest};
use deposit_gate::common::BybitCredentials;
use deposit_gate::verifier::{DepositVerifier, VerificationRequest, VerifyError};

const NOW_MS: i64 = 1_700_000_123_456;

/// Returns a canned response and remembers every request
#[derive(Clone)]
struct RecordingTransport {
    response: RawResponse,
    requests: Arc<Mutex<Vec<SignedRequest>>>,
}

impl RecordingTransport {
    fn new(status: u16, body: Value) -> Self {
        Self {
            response: RawResponse {
                status,
                body: body.to_string(),
            },
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn requests(&self) -> Vec<SignedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExchangeTransport for RecordingTransport {
    async fn get(&self, request: SignedRequest) -> Result<RawResponse, ExchangeError> {
        self.requests.lock().unwrap().push(request);
        Ok(self.response.clone())
    }
}

fn verifier(transport: &RecordingTransport) -> DepositVerifier {
    let credentials = BybitCredentials {
        api_key: "test-key".to_string(),
        api_secret: "test-secret".to_string(),
    };
    let client = BybitClient::with_transport(transport.clone(), "https://api.bybit.com", credentials, 5000)
        .with_clock(Arc::new(|| NOW_MS));
    DepositVerifier::new(Arc::new(client))
}

fn request(body: Value) -> VerificationRequest {
    VerificationRequest::from_body(&body)
}

fn ok_rows(rows: Value) -> Value {
    json!({"retCode": 0, "retMsg": "success", "result": {"rows": rows, "nextPageCursor": ""}, "time": NOW_MS})
}

#[tokio::test]
async fn test_signed_request_and_match() {
    let transport = RecordingTransport::new(
        200,
        ok_rows(json!([
            {"coin": "USDT", "chain": "TRX", "amount": "49.5", "status": 3, "txID": "t1", "successAt": "1700000100000"},
            {"coin": "USDT", "chain": "TRX", "amount": "100.2", "status": 3, "txID": "t2", "successAt": "1700000200000"}
        ])),
    );

    let result = verifier(&transport)
        .verify(&request(json!({
            "coin": "usdt",
            "chain": "TRC20-TRX",
            "expectedAmount": "100",
            "tolerance": 1,
            "pressedAt": 1_700_000_000_000i64
        })))
        .await
        .unwrap();

    assert!(result.found);
    assert_eq!(result.matched.unwrap().field("txID"), Some(&json!("t2")));
    assert_eq!(result.window.chain.as_deref(), Some("TRC20-TRX"));

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    let sent = &requests[0];

    let query = "startTime=1699999700000&endTime=1700000900000&coin=USDT&limit=50";
    assert_eq!(sent.url, format!("https://api.bybit.com/v5/asset/deposit/query-record?{}", query));
    assert_eq!(sent.header("X-BAPI-API-KEY"), Some("test-key"));
    assert_eq!(sent.header("X-BAPI-TIMESTAMP"), Some("1700000123456"));
    assert_eq!(sent.header("X-BAPI-RECV-WINDOW"), Some("5000"));
    assert_eq!(sent.header("content-type"), Some("application/json"));

    let expected_sign = hmac_sha256_hex("test-secret", &format!("1700000123456test-key5000{}", query));
    assert_eq!(sent.header("X-BAPI-SIGN"), Some(expected_sign.as_str()));
}

#[tokio::test]
async fn test_invalid_input_makes_no_request() {
    let transport = RecordingTransport::new(200, ok_rows(json!([])));
    let verifier = verifier(&transport);

    for body in [
        json!({}),
        json!({"coin": "USDT"}),
        json!({"coin": "USDT", "expectedAmount": 0, "pressedAt": 1}),
        json!({"coin": "USDT", "expectedAmount": 5, "pressedAt": "not a date"}),
    ] {
        let err = verifier.verify(&request(body)).await.unwrap_err();
        assert!(matches!(err, VerifyError::Validation(_)));
    }

    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_business_error_surfaces_body() {
    let transport = RecordingTransport::new(200, json!({"retCode": 10004, "retMsg": "error sign!", "result": {}}));

    let err = verifier(&transport)
        .verify(&request(json!({"coin": "BTC", "expectedAmount": 0.1, "pressedAt": NOW_MS})))
        .await
        .unwrap_err();

    match err {
        VerifyError::Exchange(ExchangeError::Business { body }) => assert_eq!(body["retCode"], 10004),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_pending_deposit_not_found() {
    let transport = RecordingTransport::new(
        200,
        ok_rows(json!([{"coin": "ETH", "chain": "ETH", "amount": "0.5", "status": 1, "successAt": ""}])),
    );

    let result = verifier(&transport)
        .verify(&request(json!({"coin": "ETH", "expectedAmount": 0.5, "tolerance": 0, "pressedAt": NOW_MS})))
        .await
        .unwrap();

    assert!(!result.found);
    assert!(result.matched.is_none());
}
