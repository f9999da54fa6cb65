//! Bybit deposit-history types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Deposit-history endpoint (on-chain deposits)
pub const DEPOSIT_RECORDS_PATH: &str = "/v5/asset/deposit/query-record";

/// Maximum rows requested per query
pub const DEPOSIT_QUERY_LIMIT: u32 = 50;

/// Query parameters for the deposit-history endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositQuery {
    /// Window start, epoch ms
    pub start_time: i64,
    /// Window end, epoch ms
    pub end_time: i64,
    /// Normalized coin code
    pub coin: String,
    pub limit: u32,
}

impl DepositQuery {
    pub fn new(start_time: i64, end_time: i64, coin: impl Into<String>) -> Self {
        Self {
            start_time,
            end_time,
            coin: coin.into(),
            limit: DEPOSIT_QUERY_LIMIT,
        }
    }

    /// Parameters in the order they are sent and signed
    pub fn pairs(&self) -> [(&'static str, String); 4] {
        [
            ("startTime", self.start_time.to_string()),
            ("endTime", self.end_time.to_string()),
            ("coin", self.coin.clone()),
            ("limit", self.limit.to_string()),
        ]
    }
}

/// One deposit row, exactly as returned by the exchange
///
/// Fields the matcher does not understand are kept and echoed back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DepositRecord(Map<String, Value>);

impl DepositRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Wrap a JSON value; rows that are not objects are dropped
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    pub fn coin(&self) -> Option<&Value> {
        self.field("coin")
    }

    pub fn amount(&self) -> Option<&Value> {
        self.field("amount")
    }

    /// `chain`, falling back to `chainType` when `chain` is absent or empty
    pub fn chain(&self) -> Option<&Value> {
        let non_empty = |v: &&Value| v.as_str().map_or(true, |s| !s.is_empty());
        self.field("chain")
            .filter(non_empty)
            .or_else(|| self.field("chainType").filter(non_empty))
    }

    pub fn status(&self) -> Option<&Value> {
        self.field("status")
    }

    pub fn success_at(&self) -> Option<&Value> {
        self.field("successAt")
    }
}

/// Raw HTTP response from the exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as JSON, or as a JSON string when it is not JSON
    pub fn body_value(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or_else(|_| Value::String(self.body.clone()))
    }
}

/// A fully signed GET request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
}

impl SignedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Encoded query string (without `?`)
    pub fn query(&self) -> &str {
        self.url.split_once('?').map_or("", |(_, q)| q)
    }
}
