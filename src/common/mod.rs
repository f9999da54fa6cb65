//! Common Infrastructure Module
//!
//! - Configuration loading from environment variables
//! - Structured logging setup
//! - Root error type

pub mod config;
pub mod error;
pub mod logging;

pub use config::{
    BybitCredentials, BybitSettings, ConfigError, Environment, GatewayConfig, StripeSettings,
    SupabaseSettings,
};
pub use error::{GatewayError, Result};
pub use logging::{
    generate_correlation_id, init_from_config, init_logging, log_api_request, log_api_response,
    log_collaborator_event, log_security_event, log_system_event, log_verification_event, EventCategory, LogEvent,
    LogLevel, LoggingError,
};
