//! Client configuration from the environment.

use std::time::Duration;

use thiserror::Error;

use clinic_desk_core::mutation::{PipelineConfig, DEFAULT_RELOAD_DEBOUNCE};

pub const ENV_API_URL: &str = "CLINIC_DESK_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "CLINIC_DESK_TIMEOUT_SECS";
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "CLINIC_DESK_CONNECT_TIMEOUT_SECS";
pub const ENV_RELOAD_DEBOUNCE_MS: &str = "CLINIC_DESK_RELOAD_DEBOUNCE_MS";

pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Configuration errors.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{var} must be a whole number, got {value:?}")]
    NotANumber { var: &'static str, value: String },

    #[error("{var} must be an http(s) URL, got {value:?}")]
    InvalidUrl { var: &'static str, value: String },
}

/// Where the backend lives and how patient to be with it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL without a trailing slash
    pub api_url: String,
    /// Whole-request timeout
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Delay between a write and the reload it triggers
    pub reload_debounce: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            reload_debounce: DEFAULT_RELOAD_DEBOUNCE,
        }
    }
}

impl ClientConfig {
    /// Read the process environment, falling back to defaults for unset keys.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_API_URL) {
            config = config.with_api_url(url)?;
        }
        if let Some(secs) = number(&lookup, ENV_TIMEOUT_SECS)? {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = number(&lookup, ENV_CONNECT_TIMEOUT_SECS)? {
            config.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = number(&lookup, ENV_RELOAD_DEBOUNCE_MS)? {
            config.reload_debounce = Duration::from_millis(ms);
        }

        Ok(config)
    }

    /// Replace the base URL, normalizing away trailing slashes.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        let trimmed = url.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl {
                var: ENV_API_URL,
                value: url,
            });
        }
        self.api_url = trimmed.to_string();
        Ok(self)
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            reload_debounce: self.reload_debounce,
        }
    }
}

fn number<F>(lookup: &F, var: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::NotANumber { var, value: raw }),
    }
}
