//! Application configuration.
//!
//! Settings come from an optional TOML file and are then overridden by
//! `LIVENESS_*` environment variables:
//!
//! ```toml
//! [api]
//! url = "https://api.example.com/v1/liveness"
//! app_id = "my-app"
//! api_key = "..."
//! timeout_secs = 30
//!
//! [capture]
//! device_id = 0
//! width = 640
//! height = 480
//! ```

use crate::capture::{CaptureConfig, CaptureConfigError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Environment variable for the API endpoint URL.
pub const ENV_API_URL: &str = "LIVENESS_API_URL";
/// Environment variable for the application identifier.
pub const ENV_APP_ID: &str = "LIVENESS_APP_ID";
/// Environment variable for the API key.
pub const ENV_API_KEY: &str = "LIVENESS_API_KEY";
/// Environment variable for the transport timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "LIVENESS_TIMEOUT_SECS";
/// Environment variable for the webcam device index.
pub const ENV_CAMERA_DEVICE: &str = "LIVENESS_CAMERA_DEVICE";

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The config file is not valid TOML for this schema.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
    /// A required setting has no value.
    #[error("missing required setting `{0}`")]
    Missing(&'static str),
    /// The API URL is not an absolute http(s) URL.
    #[error("invalid API url `{0}`")]
    InvalidUrl(String),
    /// A setting could not be parsed.
    #[error("invalid value for {key}: `{value}`")]
    InvalidValue {
        /// Setting name.
        key: &'static str,
        /// Offending value.
        value: String,
    },
    /// The `[capture]` section is invalid.
    #[error(transparent)]
    Capture(#[from] CaptureConfigError),
}

/// Liveness API endpoint and credentials.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Endpoint receiving the `POST`.
    pub url: String,
    /// Sent as the `App-ID` header.
    pub app_id: String,
    /// Sent as the `API-Key` header.
    pub api_key: String,
    /// Transport timeout; `None` leaves the call unbounded.
    pub timeout_secs: Option<u64>,
}

impl ApiConfig {
    /// Checks that every required setting is present and the URL parses.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::Missing("api.url"));
        }
        if self.app_id.trim().is_empty() {
            return Err(ConfigError::Missing("api.app_id"));
        }
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("api.api_key"));
        }
        match reqwest::Url::parse(&self.url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
            _ => Err(ConfigError::InvalidUrl(self.url.clone())),
        }
    }
}

// Keeps the key out of logs.
impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("url", &self.url)
            .field("app_id", &self.app_id)
            .field("api_key", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Full configuration file format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Liveness API endpoint and credentials.
    #[serde(default)]
    pub api: ApiConfig,
    /// Webcam snapshot settings.
    #[serde(default)]
    pub capture: CaptureConfig,
}

impl AppConfig {
    /// Loads configuration from a TOML file without validating it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Loads the optional file, applies the process environment and validates.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.with_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `LIVENESS_*` overrides using the given lookup.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            self.api.url = url;
        }
        if let Some(app_id) = lookup(ENV_APP_ID) {
            self.api.app_id = app_id;
        }
        if let Some(api_key) = lookup(ENV_API_KEY) {
            self.api.api_key = api_key;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            self.api.timeout_secs = Some(parse_env(ENV_TIMEOUT_SECS, &raw)?);
        }
        if let Some(raw) = lookup(ENV_CAMERA_DEVICE) {
            self.capture.device_id = parse_env(ENV_CAMERA_DEVICE, &raw)?;
        }
        Ok(self)
    }

    /// Validates API and capture settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.api.validate()?;
        self.capture.validate()?;
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}
