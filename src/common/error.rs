//! Common Error Types for deposit-gate
//!
//! Request-level failures are rendered by `api::error::ApiError`; this root
//! type covers startup: configuration, logging, client construction and the
//! listener.

use thiserror::Error;

/// Root error type for deposit-gate
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),

    /// Logging errors
    #[error("logging error: {0}")]
    Logging(#[from] super::logging::LoggingError),

    /// Exchange errors
    #[error("exchange error: {0}")]
    Exchange(#[from] crate::bybit::ExchangeError),

    /// Payment processor errors
    #[error("payment error: {0}")]
    Payment(#[from] crate::payments::PaymentError),

    /// Profile store errors
    #[error("profile error: {0}")]
    Profile(#[from] crate::profiles::ProfileError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    /// Get error code for logs and API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            GatewayError::Config(_) => "CONFIG_ERROR",
            GatewayError::Logging(_) => "LOGGING_ERROR",
            GatewayError::Exchange(e) => e.error_code(),
            GatewayError::Payment(e) => e.error_code(),
            GatewayError::Profile(e) => e.error_code(),
            GatewayError::Io(_) => "IO_ERROR",
        }
    }
}

/// Result type alias using GatewayError
pub type Result<T> = std::result::Result<T, GatewayError>;
