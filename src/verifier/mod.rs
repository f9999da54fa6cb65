//! Deposit Verification Module
//!
//! Decides whether a claimed payment reached the exchange account:
//!
//! ```text
//! request → normalize/validate → search window → signed query → match rows
//! ```
//!
//! - **coerce**: loose JSON scalar coercion shared by request and matcher
//! - **request**: request fields, validation, defaults, timestamp parsing, window
//! - **matcher**: coin / amount band / chain / completion policy
//! - **service**: `DepositVerifier` orchestrating one verification

pub mod coerce;
pub mod matcher;
pub mod request;
pub mod service;

pub use matcher::{chains_overlap, is_completed, MatchCriteria, COMPLETED_STATUSES};
pub use request::{
    parse_timestamp_ms, NormalizedRequest, SearchWindow, ValidationError, VerificationRequest,
    DEFAULT_TOLERANCE, DEFAULT_WINDOW_AFTER_MIN, DEFAULT_WINDOW_BEFORE_MIN,
};
pub use service::{DepositVerifier, VerificationResult, VerifyError, WindowEcho};
