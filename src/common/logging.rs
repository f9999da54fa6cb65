//! Structured Logging for deposit-gate
//!
//! - Pretty output for development, JSON for production log aggregation
//! - Correlation IDs for request tracing
//! - Structured events for verification, payment and profile calls
//!
//! # Usage
//!
//! ```no_run
//! use deposit_gate::common::logging::{init_logging, LogLevel};
//!
//! init_logging(LogLevel::Info, true).expect("logging"); // JSON mode for production
//! tracing::info!(target: "deposit_gate::api", "listening");
//! ```

use serde::Serialize;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

// ============================================================================
// Log Levels
// ============================================================================

/// Application log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<&str> for LogLevel {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "trace" => LogLevel::Trace,
            "debug" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

impl LogLevel {
    fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

// ============================================================================
// Structured Event Types
// ============================================================================

/// Event categories for structured logging
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// API request/response events
    Api,
    /// Deposit verification against the exchange
    Verification,
    /// Payment intent creation
    Payment,
    /// Profile creation
    Profile,
    /// Configuration and credential problems
    Security,
    /// System events (startup, shutdown)
    System,
}

/// Structured log event
#[derive(Debug, Serialize)]
pub struct LogEvent {
    /// Event timestamp (ISO 8601)
    pub timestamp: String,
    pub level: String,
    pub category: EventCategory,
    pub message: String,
    /// Correlation ID for request tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Duration in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
}

/// Error details for error events
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

impl LogEvent {
    pub fn new(level: LogLevel, category: EventCategory, message: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            level: level.as_filter().to_uppercase(),
            category,
            message: message.into(),
            correlation_id: None,
            data: None,
            duration_ms: None,
            error: None,
        }
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_error(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.error = Some(ErrorDetails {
            code: code.into(),
            message: message.into(),
        });
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                "{{\"error\": \"failed to serialize log\", \"message\": \"{}\"}}",
                self.message
            )
        })
    }
}

// ============================================================================
// Event Helpers
// ============================================================================

/// Log a configuration/credential problem that blocked a request
pub fn log_security_event(event_type: &str, details: serde_json::Value, correlation_id: Option<&str>) {
    let mut event = LogEvent::new(LogLevel::Warn, EventCategory::Security, event_type)
        .with_data(details);

    if let Some(id) = correlation_id {
        event = event.with_correlation_id(id);
    }

    tracing::warn!(target: "deposit_gate::security", "{}", event.to_json());
}

/// Log a startup or shutdown event
pub fn log_system_event(level: LogLevel, message: &str, data: serde_json::Value, error: Option<(&str, &str)>) {
    let mut event = LogEvent::new(level, EventCategory::System, message).with_data(data);

    if let Some((code, msg)) = error {
        event = event.with_error(code, msg);
    }

    match level {
        LogLevel::Error => tracing::error!(target: "deposit_gate::system", "{}", event.to_json()),
        LogLevel::Warn => tracing::warn!(target: "deposit_gate::system", "{}", event.to_json()),
        _ => tracing::info!(target: "deposit_gate::system", "{}", event.to_json()),
    }
}

/// Log an API request
pub fn log_api_request(method: &str, path: &str, client_ip: Option<&str>, correlation_id: &str) {
    let event = LogEvent::new(LogLevel::Info, EventCategory::Api, format!("{} {}", method, path))
        .with_correlation_id(correlation_id)
        .with_data(serde_json::json!({
            "method": method,
            "path": path,
            "client_ip": client_ip
        }));

    tracing::info!(target: "deposit_gate::api", "{}", event.to_json());
}

/// Log an API response
pub fn log_api_response(method: &str, path: &str, status: u16, duration_ms: u64, correlation_id: &str) {
    let level = if status >= 500 {
        LogLevel::Error
    } else if status >= 400 {
        LogLevel::Warn
    } else {
        LogLevel::Info
    };

    let event = LogEvent::new(level, EventCategory::Api, format!("{} {} -> {}", method, path, status))
        .with_correlation_id(correlation_id)
        .with_duration(duration_ms)
        .with_data(serde_json::json!({
            "method": method,
            "path": path,
            "status": status
        }));

    match level {
        LogLevel::Error => tracing::error!(target: "deposit_gate::api", "{}", event.to_json()),
        LogLevel::Warn => tracing::warn!(target: "deposit_gate::api", "{}", event.to_json()),
        _ => tracing::info!(target: "deposit_gate::api", "{}", event.to_json()),
    }
}

/// Log the outcome of a deposit verification
pub fn log_verification_event(
    coin: &str,
    expected_amount: f64,
    rows_scanned: usize,
    found: bool,
    duration_ms: u64,
    error: Option<(&str, &str)>,
) {
    let level = if error.is_some() { LogLevel::Warn } else { LogLevel::Info };
    let message = match (error, found) {
        (Some(_), _) => "deposit verification failed",
        (None, true) => "deposit found",
        (None, false) => "deposit not found",
    };

    let mut event = LogEvent::new(level, EventCategory::Verification, message)
        .with_duration(duration_ms)
        .with_data(serde_json::json!({
            "coin": coin,
            "expected_amount": expected_amount,
            "rows_scanned": rows_scanned,
            "found": found
        }));

    if let Some((code, msg)) = error {
        event = event.with_error(code, msg);
    }

    match level {
        LogLevel::Warn => tracing::warn!(target: "deposit_gate::verification", "{}", event.to_json()),
        _ => tracing::info!(target: "deposit_gate::verification", "{}", event.to_json()),
    }
}

/// Log a call to one of the collaborator services (Stripe, Supabase)
pub fn log_collaborator_event(
    category: EventCategory,
    event_type: &str,
    plan: &str,
    success: bool,
    error: Option<&str>,
) {
    let level = if success { LogLevel::Info } else { LogLevel::Error };
    let mut event = LogEvent::new(level, category, event_type)
        .with_data(serde_json::json!({ "plan": plan, "success": success }));

    if let Some(err) = error {
        event = event.with_error("UPSTREAM_ERROR", err);
    }

    if success {
        tracing::info!(target: "deposit_gate::collaborator", "{}", event.to_json());
    } else {
        tracing::error!(target: "deposit_gate::collaborator", "{}", event.to_json());
    }
}

// ============================================================================
// Initialization
// ============================================================================

/// Initialize the logging system
///
/// `RUST_LOG` takes precedence over `level` when it is set.
pub fn init_logging(level: LogLevel, json_format: bool) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let lvl = level.as_filter();
        EnvFilter::new(format!(
            "deposit_gate={},tower_http={},axum={}",
            lvl, lvl, lvl
        ))
    });

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .map_err(|e| LoggingError::InitFailed(e.to_string()))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()
            .map_err(|e| LoggingError::InitFailed(e.to_string()))?;
    }

    Ok(())
}

/// Initialize logging from GatewayConfig
pub fn init_from_config(config: &super::config::GatewayConfig) -> Result<(), LoggingError> {
    let level = LogLevel::from(config.log_level.as_str());
    let json_format = config.environment == super::config::Environment::Production;

    init_logging(level, json_format)
}

/// Logging errors
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to initialize logging: {0}")]
    InitFailed(String),
}

/// Generate a unique correlation ID for request tracing
pub fn generate_correlation_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
