//! API error envelope
//!
//! The deposit check answers `{ ok: false, error, ...extra }`; the payment and
//! profile endpoints answer `{ error, ...extra }`.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{Map, Value};

use super::body::BodyError;
use crate::bybit::ExchangeError;
use crate::payments::PaymentError;
use crate::profiles::ProfileError;
use crate::verifier::VerifyError;

pub const SERVER_ERROR: &str = "Server error";

/// Error returned by every handler
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: String,
    extra: Map<String, Value>,
    ok_flag: bool,
    allow: Option<&'static str>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            extra: Map::new(),
            ok_flag: false,
            allow: None,
        }
    }

    /// Deposit-check failure: always 400 with `ok: false`
    pub fn deposit(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error).with_ok_flag()
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    pub fn with_ok_flag(mut self) -> Self {
        self.ok_flag = true;
        self
    }

    pub fn with_allow(mut self, methods: &'static str) -> Self {
        self.allow = Some(methods);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> Value {
        let mut body = Map::new();
        if self.ok_flag {
            body.insert("ok".to_string(), Value::Bool(false));
        }
        body.insert("error".to_string(), Value::String(self.error.clone()));
        for (key, value) in &self.extra {
            body.insert(key.clone(), value.clone());
        }
        Value::Object(body)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.body())).into_response();
        if let Some(methods) = self.allow {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static(methods));
        }
        response
    }
}

impl From<VerifyError> for ApiError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::Validation(e) => ApiError::deposit(e.to_string()),
            VerifyError::Exchange(ExchangeError::Http { status, body }) => ApiError::deposit(
                "Bybit API HTTP error",
            )
            .with("status", status)
            .with("bybit", body),
            VerifyError::Exchange(ExchangeError::Business { body }) => {
                ApiError::deposit("Bybit API returned error").with("bybit", body)
            }
            VerifyError::Exchange(e) => ApiError::deposit(SERVER_ERROR).with("details", e.to_string()),
        }
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::InvalidPlan { ref received, .. } => {
                let received = received.clone();
                ApiError::new(StatusCode::BAD_REQUEST, err.to_string()).with("receivedPlan", received)
            }
            PaymentError::Stripe { message, error_type, code } => {
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, message)
                    .with("type", error_type)
                    .with("code", code)
            }
            other => ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        }
    }
}

impl From<ProfileError> for ApiError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::MissingFields(_) | ProfileError::InvalidPlan(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, err.to_string())
            }
            ProfileError::Rejected { message, details } => {
                ApiError::new(StatusCode::BAD_REQUEST, message).with("details", details)
            }
            other => ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR)
                .with("details", other.to_string()),
        }
    }
}

impl From<BodyError> for ApiError {
    fn from(err: BodyError) -> Self {
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR).with("details", err.to_string())
    }
}
