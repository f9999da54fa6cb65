//! Environment-based Configuration for deposit-gate
//!
//! All secrets (exchange keys, Stripe key, Supabase key) come from environment
//! variables. A `.env` file is honoured by the binary through `dotenv`.
//!
//! # Exchange (Bybit V5)
//! - `BYBIT_API_KEY` / `BYBIT_API_SECRET` - signed API credentials
//! - `BYBIT_BASE_URL` - API base URL (default: `https://api.bybit.com`)
//! - `BYBIT_RECV_WINDOW` - receive window in ms (default: 5000)
//!
//! # Payments (Stripe)
//! - `STRIPE_SECRET_KEY` - secret key used as bearer token
//! - `STRIPE_BASE_URL` - API base URL (default: `https://api.stripe.com`)
//!
//! # Profiles (Supabase)
//! - `SUPABASE_URL` / `SUPABASE_ANON_KEY` - project URL and anon key
//!
//! # Optional Settings
//! - `UPSTREAM_TIMEOUT_SECS` - timeout for every outbound call (default: 10)
//! - `VERIFY_MAX_WINDOW_MIN` - cap on each side of the search window (default: 10080)
//! - `API_PORT` - listen port (default: 3001)
//! - `GATEWAY_ENV` - "production" or "development" (default: "development")
//! - `GATEWAY_LOG_LEVEL` - logging level (debug, info, warn, error)
//!
//! Missing secrets do not stop the server from starting. Each endpoint checks
//! the secrets it needs and reports a configuration error before it makes any
//! outbound call.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BYBIT_BASE_URL: &str = "https://api.bybit.com";
pub const DEFAULT_STRIPE_BASE_URL: &str = "https://api.stripe.com";
pub const DEFAULT_RECV_WINDOW_MS: u64 = 5_000;
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PORT: u16 = 3001;

/// Default cap for each side of the search window: 7 days
pub const DEFAULT_MAX_WINDOW_MINUTES: f64 = 7.0 * 24.0 * 60.0;

/// Bybit rejects deposit queries spanning more than 30 days
pub const MAX_QUERY_SPAN_MINUTES: f64 = 30.0 * 24.0 * 60.0;

/// Largest per-side cap: both sides together stay within one query span
pub const MAX_WINDOW_SIDE_MINUTES: f64 = MAX_QUERY_SPAN_MINUTES / 2.0;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Missing {0} in environment variables.")]
    MissingSecrets(String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" | "preview" => Ok(Environment::Development),
            _ => Err(ConfigError::InvalidValue(
                "GATEWAY_ENV".to_string(),
                format!("unknown environment: {}", s),
            )),
        }
    }
}

/// Bybit API key pair
#[derive(Clone)]
pub struct BybitCredentials {
    pub api_key: String,
    pub api_secret: String,
}

impl fmt::Debug for BybitCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BybitCredentials")
            .field("api_key", &mask(&self.api_key))
            .field("api_secret", &"***")
            .finish()
    }
}

/// Exchange settings
#[derive(Debug, Clone)]
pub struct BybitSettings {
    pub credentials: Option<BybitCredentials>,
    pub base_url: String,
    pub recv_window_ms: u64,
}

/// Payment processor settings
#[derive(Clone)]
pub struct StripeSettings {
    pub secret_key: Option<String>,
    pub base_url: String,
}

impl fmt::Debug for StripeSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StripeSettings")
            .field("secret_key", &self.secret_key.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Data store settings
#[derive(Clone)]
pub struct SupabaseSettings {
    pub url: Option<String>,
    pub anon_key: Option<String>,
}

impl fmt::Debug for SupabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseSettings")
            .field("url", &self.url)
            .field("anon_key", &self.anon_key.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Deployment environment
    pub environment: Environment,

    /// Exchange settings
    pub bybit: BybitSettings,

    /// Payment processor settings
    pub stripe: StripeSettings,

    /// Data store settings
    pub supabase: SupabaseSettings,

    /// Timeout applied to every outbound HTTP call
    pub upstream_timeout_secs: u64,

    /// Cap for `windowBeforeMin` and `windowAfterMin`
    pub max_window_minutes: f64,

    /// REST API port
    pub port: u16,

    /// Log level
    pub log_level: String,
}

impl GatewayConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let environment: Environment = var("GATEWAY_ENV")
            .unwrap_or_else(|| "development".to_string())
            .parse()?;

        let credentials = match (var("BYBIT_API_KEY"), var("BYBIT_API_SECRET")) {
            (Some(api_key), Some(api_secret)) => Some(BybitCredentials {
                api_key,
                api_secret,
            }),
            _ => None,
        };

        let bybit = BybitSettings {
            credentials,
            base_url: trim_url(var("BYBIT_BASE_URL").as_deref().unwrap_or(DEFAULT_BYBIT_BASE_URL)),
            recv_window_ms: parse_or("BYBIT_RECV_WINDOW", var("BYBIT_RECV_WINDOW"), DEFAULT_RECV_WINDOW_MS)?,
        };

        let stripe = StripeSettings {
            secret_key: var("STRIPE_SECRET_KEY"),
            base_url: trim_url(var("STRIPE_BASE_URL").as_deref().unwrap_or(DEFAULT_STRIPE_BASE_URL)),
        };

        let supabase = SupabaseSettings {
            url: var("SUPABASE_URL").map(|u| trim_url(&u)),
            anon_key: var("SUPABASE_ANON_KEY"),
        };

        let upstream_timeout_secs = parse_or(
            "UPSTREAM_TIMEOUT_SECS",
            var("UPSTREAM_TIMEOUT_SECS"),
            DEFAULT_UPSTREAM_TIMEOUT_SECS,
        )?;
        if upstream_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "UPSTREAM_TIMEOUT_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let max_window_minutes: f64 = parse_or(
            "VERIFY_MAX_WINDOW_MIN",
            var("VERIFY_MAX_WINDOW_MIN"),
            DEFAULT_MAX_WINDOW_MINUTES,
        )?;
        if !max_window_minutes.is_finite()
            || max_window_minutes <= 0.0
            || max_window_minutes > MAX_WINDOW_SIDE_MINUTES
        {
            return Err(ConfigError::InvalidValue(
                "VERIFY_MAX_WINDOW_MIN".to_string(),
                format!("must be within (0, {}]", MAX_WINDOW_SIDE_MINUTES),
            ));
        }

        let port = parse_or("API_PORT", var("API_PORT"), DEFAULT_PORT)?;

        let log_level = var("GATEWAY_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            environment,
            bybit,
            stripe,
            supabase,
            upstream_timeout_secs,
            max_window_minutes,
            port,
            log_level,
        })
    }

    /// Exchange credentials, or the error reported to callers
    pub fn require_bybit(&self) -> Result<&BybitCredentials, ConfigError> {
        self.bybit
            .credentials
            .as_ref()
            .ok_or_else(|| ConfigError::MissingSecrets("BYBIT_API_KEY or BYBIT_API_SECRET".to_string()))
    }

    /// Stripe secret key
    pub fn require_stripe(&self) -> Result<&str, ConfigError> {
        self.stripe
            .secret_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("STRIPE_SECRET_KEY".to_string()))
    }

    /// Supabase URL and anon key
    pub fn require_supabase(&self) -> Result<(&str, &str), ConfigError> {
        match (self.supabase.url.as_deref(), self.supabase.anon_key.as_deref()) {
            (Some(url), Some(key)) => Ok((url, key)),
            _ => Err(ConfigError::MissingSecrets(
                "SUPABASE_URL or SUPABASE_ANON_KEY".to_string(),
            )),
        }
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    /// Print configuration summary (hiding sensitive values)
    pub fn print_summary(&self) {
        println!("=== deposit-gate Configuration ===");
        println!("Environment: {:?}", self.environment);
        println!("Bybit API: {}", self.bybit.base_url);
        println!(
            "Bybit Credentials: {}",
            match &self.bybit.credentials {
                Some(c) => format!("configured (key {})", mask(&c.api_key)),
                None => "MISSING".to_string(),
            }
        );
        println!("Recv Window: {} ms", self.bybit.recv_window_ms);
        println!("Stripe API: {}", self.stripe.base_url);
        println!(
            "Stripe Key: {}",
            if self.stripe.secret_key.is_some() { "configured" } else { "MISSING" }
        );
        println!(
            "Supabase: {}",
            self.supabase.url.as_deref().unwrap_or("MISSING")
        );
        println!("Upstream Timeout: {} s", self.upstream_timeout_secs);
        println!("Max Window: {} min", self.max_window_minutes);
        println!("Port: {}", self.port);
        println!("Log Level: {}", self.log_level);
        println!("==================================");
    }
}

fn parse_or<T: FromStr>(name: &str, value: Option<String>, default: T) -> Result<T, ConfigError> {
    match value {
        Some(v) => v.parse().map_err(|_| {
            ConfigError::InvalidValue(name.to_string(), format!("cannot parse '{}'", v))
        }),
        None => Ok(default),
    }
}

fn trim_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Show only the first four characters of a key
fn mask(key: &str) -> String {
    let prefix: String = key.chars().take(4).collect();
    format!("{}***", prefix)
}
