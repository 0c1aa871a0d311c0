//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADDRESSBOOK_API_URL` - Base URL of the remote account service
//!   (e.g., `http://localhost:8080`)
//!
//! ## Optional
//! - `ADDRESSBOOK_SESSION_FILE` - Path of the persisted session store
//!   (default: `<local data dir>/addressbook/session.json`)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Address book client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the remote account service, always ending in `/`
    pub api_url: Url,
    /// File backing the persisted session store
    pub session_file: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the API URL is missing or is not an
    /// `http`/`https` URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = parse_api_url(&get_required_env("ADDRESSBOOK_API_URL")?)
            .map_err(|reason| ConfigError::InvalidEnvVar("ADDRESSBOOK_API_URL".to_string(), reason))?;
        let session_file = get_optional_env("ADDRESSBOOK_SESSION_FILE")
            .map_or_else(default_session_file, PathBuf::from);
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            api_url,
            session_file,
            sentry_dsn,
        })
    }

    /// Build a configuration for an explicit service URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL is not usable as a
    /// service base.
    pub fn for_api_url(api_url: &str, session_file: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let api_url = parse_api_url(api_url)
            .map_err(|reason| ConfigError::InvalidEnvVar("ADDRESSBOOK_API_URL".to_string(), reason))?;
        Ok(Self {
            api_url,
            session_file: session_file.into(),
            sentry_dsn: None,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Default location of the session store file.
fn default_session_file() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("addressbook")
        .join("session.json")
}

/// Parse and normalize the service base URL.
///
/// The path is forced to end in `/` so relative endpoint paths such as
/// `user/address` are joined under it instead of replacing its last segment.
fn parse_api_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.cannot_be_a_base() || url.host().is_none() {
        return Err("URL has no host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("URL must not carry a query or fragment".to_string());
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}
