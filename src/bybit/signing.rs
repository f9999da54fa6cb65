//! Bybit V5 request signing
//!
//! Signing payload for GET requests: `timestamp + apiKey + recvWindow + queryString`,
//! HMAC-SHA256 with the API secret, lowercase hex.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::common::config::BybitCredentials;

type HmacSha256 = Hmac<Sha256>;

pub const HEADER_API_KEY: &str = "X-BAPI-API-KEY";
pub const HEADER_SIGN: &str = "X-BAPI-SIGN";
pub const HEADER_TIMESTAMP: &str = "X-BAPI-TIMESTAMP";
pub const HEADER_RECV_WINDOW: &str = "X-BAPI-RECV-WINDOW";

/// HMAC-SHA256 of `message` keyed with `secret`, as lowercase hex
pub fn hmac_sha256_hex(secret: &str, message: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Exact string that gets signed
pub fn signing_payload(timestamp: &str, api_key: &str, recv_window: &str, query: &str) -> String {
    let mut payload =
        String::with_capacity(timestamp.len() + api_key.len() + recv_window.len() + query.len());
    payload.push_str(timestamp);
    payload.push_str(api_key);
    payload.push_str(recv_window);
    payload.push_str(query);
    payload
}

/// Authentication headers for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub api_key: String,
    pub sign: String,
    pub timestamp: String,
    pub recv_window: String,
}

impl SignedHeaders {
    pub fn into_pairs(self) -> Vec<(&'static str, String)> {
        vec![
            (HEADER_API_KEY, self.api_key),
            (HEADER_SIGN, self.sign),
            (HEADER_TIMESTAMP, self.timestamp),
            (HEADER_RECV_WINDOW, self.recv_window),
            ("Content-Type", "application/json".to_string()),
        ]
    }
}

/// Signs requests with one key pair and a fixed receive window
#[derive(Debug, Clone)]
pub struct RequestSigner {
    credentials: BybitCredentials,
    recv_window: String,
}

impl RequestSigner {
    pub fn new(credentials: BybitCredentials, recv_window_ms: u64) -> Self {
        Self {
            credentials,
            recv_window: recv_window_ms.to_string(),
        }
    }

    pub fn sign(&self, timestamp_ms: i64, query: &str) -> SignedHeaders {
        let timestamp = timestamp_ms.to_string();
        let payload = signing_payload(&timestamp, &self.credentials.api_key, &self.recv_window, query);
        let sign = hmac_sha256_hex(&self.credentials.api_secret, &payload);

        SignedHeaders {
            api_key: self.credentials.api_key.clone(),
            sign,
            timestamp,
            recv_window: self.recv_window.clone(),
        }
    }
}
