//! Deposit Verifier
//!
//! validate → window → one signed exchange query → first matching row.
//! Stateless: every call recomputes from scratch.

use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

use super::matcher::MatchCriteria;
use super::request::{NormalizedRequest, SearchWindow, ValidationError, VerificationRequest};
use crate::bybit::{DepositQuery, DepositRecord, DepositSource, ExchangeError};
use crate::common::config::{DEFAULT_MAX_WINDOW_MINUTES, MAX_WINDOW_SIDE_MINUTES};
use crate::common::logging::log_verification_event;

/// Verification errors
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Exchange(#[from] ExchangeError),
}

impl VerifyError {
    pub fn error_code(&self) -> &'static str {
        match self {
            VerifyError::Validation(_) => "VALIDATION_ERROR",
            VerifyError::Exchange(e) => e.error_code(),
        }
    }
}

/// Echo of the resolved window and normalized inputs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowEcho {
    pub start_time: i64,
    pub end_time: i64,
    pub expected_amount: f64,
    pub tolerance: f64,
    pub coin: String,
    pub chain: Option<String>,
}

impl WindowEcho {
    fn new(request: &NormalizedRequest, window: SearchWindow) -> Self {
        Self {
            start_time: window.start_time,
            end_time: window.end_time,
            expected_amount: request.expected_amount,
            tolerance: request.tolerance,
            coin: request.coin.clone(),
            chain: request.chain.clone(),
        }
    }
}

/// Outcome of one verification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationResult {
    pub found: bool,
    #[serde(rename = "match")]
    pub matched: Option<DepositRecord>,
    pub window: WindowEcho,
}

/// Checks claimed deposits against the exchange's deposit history
#[derive(Clone)]
pub struct DepositVerifier {
    source: Arc<dyn DepositSource>,
    max_window_minutes: f64,
}

impl DepositVerifier {
    pub fn new(source: Arc<dyn DepositSource>) -> Self {
        Self {
            source,
            max_window_minutes: DEFAULT_MAX_WINDOW_MINUTES,
        }
    }

    /// Cap each side of the search window (minutes), at most half a query span
    pub fn with_max_window_minutes(mut self, minutes: f64) -> Self {
        if minutes.is_finite() && minutes > 0.0 {
            self.max_window_minutes = minutes.min(MAX_WINDOW_SIDE_MINUTES);
        }
        self
    }

    pub fn max_window_minutes(&self) -> f64 {
        self.max_window_minutes
    }

    /// Verify one claimed deposit
    ///
    /// Validation errors are returned before the exchange is contacted.
    pub async fn verify(&self, request: &VerificationRequest) -> Result<VerificationResult, VerifyError> {
        let normalized = request.normalize(self.max_window_minutes)?;
        let window = SearchWindow::for_request(&normalized);
        let query = DepositQuery::new(window.start_time, window.end_time, normalized.coin.clone());

        let started = Instant::now();
        let rows = match self.source.deposit_records(&query).await {
            Ok(rows) => rows,
            Err(e) => {
                log_verification_event(
                    &normalized.coin,
                    normalized.expected_amount,
                    0,
                    false,
                    started.elapsed().as_millis() as u64,
                    Some((e.error_code(), &e.to_string())),
                );
                return Err(e.into());
            }
        };

        let criteria = MatchCriteria::from_request(&normalized);
        let matched = criteria.find_first(&rows).cloned();

        log_verification_event(
            &normalized.coin,
            normalized.expected_amount,
            rows.len(),
            matched.is_some(),
            started.elapsed().as_millis() as u64,
            None,
        );

        Ok(VerificationResult {
            found: matched.is_some(),
            matched,
            window: WindowEcho::new(&normalized, window),
        })
    }
}
