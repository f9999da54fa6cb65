//! Verification request parsing and normalization

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use super::coerce::{normalize, value_to_number, value_to_number_or_zero, value_to_text};

pub const DEFAULT_TOLERANCE: f64 = 10.0;
pub const DEFAULT_WINDOW_BEFORE_MIN: f64 = 5.0;
pub const DEFAULT_WINDOW_AFTER_MIN: f64 = 15.0;

const MS_PER_MINUTE: f64 = 60_000.0;

// Longer digit strings are epoch milliseconds
const MAX_YEAR_DIGITS: usize = 4;

const OFFSET_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Input validation failures, checked in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("coin is required (e.g., USDT, BTC, ETH).")]
    MissingCoin,

    #[error("expectedAmount must be a positive number.")]
    InvalidExpectedAmount,

    #[error("pressedAt is required (ms timestamp or ISO date).")]
    MissingPressedAt,
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingCoin => "coin",
            ValidationError::InvalidExpectedAmount => "expectedAmount",
            ValidationError::MissingPressedAt => "pressedAt",
        }
    }
}

/// Request body as sent by the frontend; every field is loosely typed
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub coin: Option<Value>,
    pub chain: Option<Value>,
    pub expected_amount: Option<Value>,
    /// `Some(Value::Null)` when sent as null, `None` when missing
    #[serde(default, deserialize_with = "present")]
    pub tolerance: Option<Value>,
    pub pressed_at: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub window_before_min: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub window_after_min: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl VerificationRequest {
    /// Read a request out of a parsed body; anything but an object is an empty request
    pub fn from_body(body: &Value) -> Self {
        match body {
            Value::Object(_) => serde_json::from_value(body.clone()).unwrap_or_default(),
            _ => Self::default(),
        }
    }

    /// Validate and apply defaults
    ///
    /// `max_window_minutes` caps each side of the search window.
    pub fn normalize(&self, max_window_minutes: f64) -> Result<NormalizedRequest, ValidationError> {
        let coin = self
            .coin
            .as_ref()
            .and_then(value_to_text)
            .map(|c| normalize(&c))
            .filter(|c| !c.is_empty())
            .ok_or(ValidationError::MissingCoin)?;

        let expected_amount = self
            .expected_amount
            .as_ref()
            .and_then(value_to_number)
            .filter(|a| *a > 0.0)
            .ok_or(ValidationError::InvalidExpectedAmount)?;

        let pressed_at_ms = self
            .pressed_at
            .as_ref()
            .and_then(parse_timestamp_ms)
            .ok_or(ValidationError::MissingPressedAt)?;

        let chain = self
            .chain
            .as_ref()
            .and_then(value_to_text)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let tolerance = number_or(self.tolerance.as_ref(), DEFAULT_TOLERANCE).max(0.0);
        let window_before_min = number_or(self.window_before_min.as_ref(), DEFAULT_WINDOW_BEFORE_MIN)
            .clamp(0.0, max_window_minutes);
        let window_after_min = number_or(self.window_after_min.as_ref(), DEFAULT_WINDOW_AFTER_MIN)
            .clamp(0.0, max_window_minutes);

        Ok(NormalizedRequest {
            coin,
            chain,
            expected_amount,
            tolerance,
            pressed_at_ms,
            window_before_min,
            window_after_min,
        })
    }
}

// Missing or non-numeric takes the default; null and "" are an explicit zero
fn number_or(value: Option<&Value>, default: f64) -> f64 {
    value.and_then(value_to_number_or_zero).unwrap_or(default)
}

/// A validated request with defaults applied
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRequest {
    /// Trimmed, uppercased
    pub coin: String,
    /// Trimmed, original case
    pub chain: Option<String>,
    pub expected_amount: f64,
    pub tolerance: f64,
    pub pressed_at_ms: i64,
    pub window_before_min: f64,
    pub window_after_min: f64,
}

/// Time range sent to the exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub start_time: i64,
    pub end_time: i64,
}

impl SearchWindow {
    pub fn around(pressed_at_ms: i64, before_min: f64, after_min: f64) -> Self {
        let pressed = pressed_at_ms as f64;
        Self {
            start_time: (pressed - before_min * MS_PER_MINUTE).round() as i64,
            end_time: (pressed + after_min * MS_PER_MINUTE).round() as i64,
        }
    }

    pub fn for_request(request: &NormalizedRequest) -> Self {
        Self::around(
            request.pressed_at_ms,
            request.window_before_min,
            request.window_after_min,
        )
    }
}

/// Parse a press timestamp into epoch milliseconds
///
/// Accepts epoch-ms numbers, digit-only strings (a year when four digits or
/// fewer, epoch ms otherwise) and date/time strings down to `YYYY-MM`.
/// Zone-less date/times are read as UTC. Returns `None` for anything
/// that does not give a positive instant.
pub fn parse_timestamp_ms(value: &Value) -> Option<i64> {
    let ms = match value {
        Value::Number(n) => {
            let f = n.as_f64()?;
            if !f.is_finite() {
                return None;
            }
            f.round() as i64
        }
        Value::String(s) => parse_timestamp_str(s.trim())?,
        _ => return None,
    };

    (ms > 0).then_some(ms)
}

fn parse_timestamp_str(s: &str) -> Option<i64> {
    if s.is_empty() {
        return None;
    }

    if s.bytes().all(|b| b.is_ascii_digit()) {
        if s.len() <= MAX_YEAR_DIGITS {
            let year = s.parse::<i32>().ok()?;
            return utc_midnight(NaiveDate::from_ymd_opt(year, 1, 1)?);
        }
        return s.parse::<i64>().ok();
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.timestamp_millis());
    }

    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Some(dt.timestamp_millis());
        }
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive).timestamp_millis());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return utc_midnight(date);
    }

    // year and month only: first of the month
    NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
        .ok()
        .and_then(utc_midnight)
}

fn utc_midnight(date: NaiveDate) -> Option<i64> {
    date.and_hms_opt(0, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive).timestamp_millis())
}
