//! Gateway configuration
//!
//! Loaded from environment variables with defaults suitable for development.
//! The API key is optional at this layer; a provider that needs one reports
//! `GatewayError::ProviderNotConfigured` when it is constructed without it.

use crate::{AeroError, AeroResult, ConfigError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default model for structured tasks.
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Default model for the conversational auditor.
pub const DEFAULT_CHAT_MODEL: &str = "gemini-3-pro-preview";

/// Default provider endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default outbound call timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Largest binary attachment accepted (20 MiB).
pub const DEFAULT_MAX_ATTACHMENT_BYTES: usize = 20 * 1024 * 1024;

/// Configuration for the inference gateway and its provider.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Provider API key. Never logged.
    pub api_key: Option<String>,
    /// Provider endpoint, without a trailing slash.
    pub base_url: String,
    /// Model used for structured tasks.
    pub model: String,
    /// Model used for the auditor chat.
    pub chat_model: String,
    /// Timeout applied to every outbound call.
    pub request_timeout: Duration,
    /// Thinking budget for latency-sensitive tasks. `None` leaves the provider default.
    pub fast_thinking_budget: Option<u32>,
    /// Largest decoded attachment size in bytes.
    pub max_attachment_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            fast_thinking_budget: Some(0),
            max_attachment_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
        }
    }
}

impl GatewayConfig {
    /// Create GatewayConfig from environment variables.
    ///
    /// Environment variables:
    /// - `AEROGATE_API_KEY`: provider key (falls back to `GEMINI_API_KEY`, then `API_KEY`)
    /// - `AEROGATE_BASE_URL`: provider endpoint (default: Gemini v1beta)
    /// - `AEROGATE_MODEL`: structured-task model (default: gemini-3-flash-preview)
    /// - `AEROGATE_CHAT_MODEL`: chat model (default: gemini-3-pro-preview)
    /// - `AEROGATE_TIMEOUT_SECS`: outbound call timeout (default: 60)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. `from_env` delegates here.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = non_empty("AEROGATE_API_KEY")
            .or_else(|| non_empty("GEMINI_API_KEY"))
            .or_else(|| non_empty("API_KEY"));

        let base_url = non_empty("AEROGATE_BASE_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url);

        let model = non_empty("AEROGATE_MODEL").unwrap_or(defaults.model);
        let chat_model = non_empty("AEROGATE_CHAT_MODEL").unwrap_or(defaults.chat_model);

        let request_timeout = non_empty("AEROGATE_TIMEOUT_SECS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        Self {
            api_key,
            base_url,
            model,
            chat_model,
            request_timeout,
            fast_thinking_budget: defaults.fast_thinking_budget,
            max_attachment_bytes: defaults.max_attachment_bytes,
        }
    }

    /// Builder: set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Builder: set the provider endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Builder: set the outbound call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - model names are non-empty
    /// - base_url is http(s)
    /// - request_timeout is positive
    /// - max_attachment_bytes is positive
    pub fn validate(&self) -> AeroResult<()> {
        for (field, value) in [("model", &self.model), ("chat_model", &self.chat_model)] {
            if value.trim().is_empty() {
                return Err(AeroError::Config(ConfigError::MissingRequired {
                    field: field.to_string(),
                }));
            }
        }

        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            return Err(AeroError::Config(ConfigError::InvalidValue {
                field: "base_url".to_string(),
                value: self.base_url.clone(),
                reason: "base_url must be an http or https URL".to_string(),
            }));
        }

        if self.request_timeout.is_zero() {
            return Err(AeroError::Config(ConfigError::InvalidValue {
                field: "request_timeout".to_string(),
                value: format!("{:?}", self.request_timeout),
                reason: "request_timeout must be positive".to_string(),
            }));
        }

        if self.max_attachment_bytes == 0 {
            return Err(AeroError::Config(ConfigError::InvalidValue {
                field: "max_attachment_bytes".to_string(),
                value: "0".to_string(),
                reason: "max_attachment_bytes must be positive".to_string(),
            }));
        }

        Ok(())
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("chat_model", &self.chat_model)
            .field("request_timeout", &self.request_timeout)
            .field("fast_thinking_budget", &self.fast_thinking_budget)
            .field("max_attachment_bytes", &self.max_attachment_bytes)
            .finish()
    }
}
