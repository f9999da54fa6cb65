//! Bybit V5 Exchange Client
//!
//! - **signing**: HMAC-SHA256 request signing and `X-BAPI-*` headers
//! - **types**: deposit query, raw deposit rows, transport request/response
//! - **client**: transport seam, `DepositSource` trait and the signed client

pub mod client;
pub mod signing;
pub mod types;

pub use client::{
    parse_deposit_response, BybitClient, Clock, DepositSource, ExchangeError, ExchangeTransport,
    ReqwestTransport,
};
pub use signing::{hmac_sha256_hex, signing_payload, RequestSigner, SignedHeaders};
pub use types::{
    DepositQuery, DepositRecord, RawResponse, SignedRequest, DEPOSIT_QUERY_LIMIT,
    DEPOSIT_RECORDS_PATH,
};

#[cfg(test)]
pub use client::{MockDepositSource, MockExchangeTransport};
