//! Stripe PaymentIntents client
//!
//! Form-encoded POST to `/v1/payment_intents` with the secret key as bearer
//! token. Only the fields the checkout page needs are read back.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

pub const PAYMENT_INTENTS_PATH: &str = "/v1/payment_intents";

/// Payment errors
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Invalid plan. Must be one of: {plans}")]
    InvalidPlan { plans: String, received: Value },

    /// Stripe answered with an error object
    #[error("{message}")]
    Stripe {
        message: String,
        error_type: Option<String>,
        code: Option<String>,
    },

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl PaymentError {
    pub fn error_code(&self) -> &'static str {
        match self {
            PaymentError::InvalidPlan { .. } => "VALIDATION_ERROR",
            PaymentError::Stripe { .. } => "UPSTREAM_BUSINESS_ERROR",
            PaymentError::Request(_) => "UPSTREAM_UNREACHABLE",
            PaymentError::Parse(_) => "UPSTREAM_PARSE_ERROR",
        }
    }
}

/// What to charge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntentParams {
    pub amount: u64,
    pub currency: String,
    pub plan: String,
}

impl PaymentIntentParams {
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("amount", self.amount.to_string()),
            ("currency", self.currency.clone()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
            ("metadata[plan]", self.plan.clone()),
        ]
    }
}

/// The subset of a PaymentIntent returned to the browser
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
    pub amount: u64,
    pub currency: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorObject,
}

#[derive(Debug, Deserialize)]
struct StripeErrorObject {
    message: Option<String>,
    #[serde(rename = "type")]
    error_type: Option<String>,
    code: Option<String>,
}

/// Creates payment intents
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentIntents: Send + Sync {
    async fn create_payment_intent(&self, params: &PaymentIntentParams) -> Result<PaymentIntent, PaymentError>;
}

/// reqwest-backed Stripe client
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    base_url: String,
    secret_key: String,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl StripeClient {
    pub fn new(secret_key: &str, base_url: &str, timeout: Duration) -> Result<Self, PaymentError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, PAYMENT_INTENTS_PATH)
    }
}

#[async_trait]
impl PaymentIntents for StripeClient {
    async fn create_payment_intent(&self, params: &PaymentIntentParams) -> Result<PaymentIntent, PaymentError> {
        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.secret_key)
            .form(&params.form_fields())
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        parse_stripe_response(status.is_success(), &body)
    }
}

/// Turn a Stripe response body into an intent or an error
pub fn parse_stripe_response(success: bool, body: &str) -> Result<PaymentIntent, PaymentError> {
    if success {
        return serde_json::from_str(body).map_err(|e| PaymentError::Parse(e.to_string()));
    }

    match serde_json::from_str::<StripeErrorBody>(body) {
        Ok(StripeErrorBody { error }) => Err(PaymentError::Stripe {
            message: error.message.unwrap_or_else(|| "Stripe request failed".to_string()),
            error_type: error.error_type,
            code: error.code,
        }),
        Err(_) => Err(PaymentError::Parse(format!("unexpected Stripe error body: {}", body))),
    }
}
