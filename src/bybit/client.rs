//! Signed Bybit V5 client for the deposit-history endpoint
//!
//! One call per query: sign, GET, check HTTP status and `retCode`, return rows.
//! No retries.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::signing::RequestSigner;
use super::types::{DepositQuery, DepositRecord, RawResponse, SignedRequest, DEPOSIT_RECORDS_PATH};
use crate::common::config::{BybitCredentials, BybitSettings};

/// Exchange errors
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Non-2xx HTTP status; body kept for diagnosis
    #[error("Bybit API HTTP error")]
    Http { status: u16, body: Value },

    /// 2xx with a non-zero `retCode`
    #[error("Bybit API returned error")]
    Business { body: Value },

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid exchange URL: {0}")]
    InvalidUrl(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl ExchangeError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ExchangeError::Http { .. } => "UPSTREAM_HTTP_ERROR",
            ExchangeError::Business { .. } => "UPSTREAM_BUSINESS_ERROR",
            ExchangeError::Request(_) => "UPSTREAM_UNREACHABLE",
            ExchangeError::InvalidUrl(_) => "CONFIG_ERROR",
            ExchangeError::Parse(_) => "UPSTREAM_PARSE_ERROR",
        }
    }
}

/// Sends a signed GET and returns the raw response
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExchangeTransport: Send + Sync {
    async fn get(&self, request: SignedRequest) -> Result<RawResponse, ExchangeError>;
}

/// Anything that can answer a deposit-history query
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DepositSource: Send + Sync {
    async fn deposit_records(&self, query: &DepositQuery) -> Result<Vec<DepositRecord>, ExchangeError>;
}

/// reqwest-backed transport with an explicit timeout
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, ExchangeError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ExchangeTransport for ReqwestTransport {
    async fn get(&self, request: SignedRequest) -> Result<RawResponse, ExchangeError> {
        let mut builder = self.client.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;

        Ok(RawResponse { status, body })
    }
}

/// Wall clock in epoch milliseconds
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

fn system_clock() -> Clock {
    Arc::new(|| chrono::Utc::now().timestamp_millis())
}

/// Bybit V5 client
pub struct BybitClient<T = ReqwestTransport> {
    transport: T,
    base_url: String,
    signer: RequestSigner,
    clock: Clock,
}

impl BybitClient<ReqwestTransport> {
    /// Create a client from configuration
    pub fn from_settings(
        settings: &BybitSettings,
        credentials: &BybitCredentials,
        timeout: Duration,
    ) -> Result<Self, ExchangeError> {
        Ok(Self::with_transport(
            ReqwestTransport::new(timeout)?,
            &settings.base_url,
            credentials.clone(),
            settings.recv_window_ms,
        ))
    }
}

impl<T: ExchangeTransport> BybitClient<T> {
    /// Create a client over any transport
    pub fn with_transport(
        transport: T,
        base_url: &str,
        credentials: BybitCredentials,
        recv_window_ms: u64,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            signer: RequestSigner::new(credentials, recv_window_ms),
            clock: system_clock(),
        }
    }

    /// Replace the clock used for request timestamps
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Build the signed request for a query, stamped with the current time
    pub fn build_request(&self, query: &DepositQuery) -> Result<SignedRequest, ExchangeError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, DEPOSIT_RECORDS_PATH))
            .map_err(|e| ExchangeError::InvalidUrl(e.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query.pairs() {
                pairs.append_pair(name, &value);
            }
        }

        let query_string = url.query().unwrap_or_default().to_string();
        let headers = self.signer.sign((self.clock)(), &query_string);

        Ok(SignedRequest {
            url: url.to_string(),
            headers: headers.into_pairs(),
        })
    }

    /// Query deposit records for a window
    pub async fn query_deposit_records(
        &self,
        query: &DepositQuery,
    ) -> Result<Vec<DepositRecord>, ExchangeError> {
        let request = self.build_request(query)?;

        tracing::debug!(
            target: "deposit_gate::bybit",
            coin = %query.coin,
            start_time = query.start_time,
            end_time = query.end_time,
            "querying deposit records"
        );

        let response = self.transport.get(request).await?;
        parse_deposit_response(response)
    }
}

#[async_trait]
impl<T: ExchangeTransport> DepositSource for BybitClient<T> {
    async fn deposit_records(&self, query: &DepositQuery) -> Result<Vec<DepositRecord>, ExchangeError> {
        self.query_deposit_records(query).await
    }
}

/// Turn a raw response into rows, or the matching upstream error
pub fn parse_deposit_response(response: RawResponse) -> Result<Vec<DepositRecord>, ExchangeError> {
    if !response.is_success() {
        return Err(ExchangeError::Http {
            status: response.status,
            body: response.body_value(),
        });
    }

    let body: Value = serde_json::from_str(&response.body)
        .map_err(|e| ExchangeError::Parse(format!("invalid JSON from exchange: {}", e)))?;

    let ret_code = body.get("retCode").and_then(Value::as_f64);
    if ret_code != Some(0.0) {
        return Err(ExchangeError::Business { body });
    }

    let rows = match body.pointer("/result/rows") {
        Some(Value::Array(rows)) => rows
            .iter()
            .cloned()
            .filter_map(DepositRecord::from_value)
            .collect(),
        _ => Vec::new(),
    };

    Ok(rows)
}
