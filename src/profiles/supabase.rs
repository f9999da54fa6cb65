//! Supabase (PostgREST) profile store

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use super::form::NewProfile;

pub const PROFILES_PATH: &str = "/rest/v1/profiles";

/// Columns returned after insert
pub const PROFILE_COLUMNS: &str = "id,full_name,email,package_id";

/// Profile errors
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Missing required fields. Required: {0}")]
    MissingFields(String),

    #[error("Invalid plan. Must be one of: {0}.")]
    InvalidPlan(String),

    /// PostgREST refused the insert (RLS, constraint, unknown column)
    #[error("{message}")]
    Rejected { message: String, details: Value },

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl ProfileError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ProfileError::MissingFields(_) | ProfileError::InvalidPlan(_) => "VALIDATION_ERROR",
            ProfileError::Rejected { .. } => "UPSTREAM_BUSINESS_ERROR",
            ProfileError::Request(_) => "UPSTREAM_UNREACHABLE",
            ProfileError::Parse(_) => "UPSTREAM_PARSE_ERROR",
        }
    }
}

/// Persists new profiles
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Insert one row and return the stored columns
    async fn insert_profile(&self, profile: &NewProfile) -> Result<Value, ProfileError>;
}

/// reqwest-backed PostgREST client
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl SupabaseClient {
    pub fn new(base_url: &str, anon_key: &str, timeout: Duration) -> Result<Self, ProfileError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        })
    }

    pub fn insert_url(&self) -> String {
        format!("{}{}?select={}", self.base_url, PROFILES_PATH, PROFILE_COLUMNS)
    }
}

#[async_trait]
impl ProfileStore for SupabaseClient {
    async fn insert_profile(&self, profile: &NewProfile) -> Result<Value, ProfileError> {
        let resp = self
            .client
            .post(self.insert_url())
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .header("Prefer", "return=representation")
            // single object instead of a one-element array
            .header("Accept", "application/vnd.pgrst.object+json")
            .json(profile)
            .send()
            .await?;

        let success = resp.status().is_success();
        let body = resp.text().await?;

        parse_insert_response(success, &body)
    }
}

/// Turn a PostgREST response body into the stored row or an error
pub fn parse_insert_response(success: bool, body: &str) -> Result<Value, ProfileError> {
    let value: Value = serde_json::from_str(body).map_err(|e| ProfileError::Parse(e.to_string()))?;

    if success {
        return Ok(value);
    }

    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("Supabase request failed")
        .to_string();

    Err(ProfileError::Rejected {
        message,
        details: value,
    })
}
