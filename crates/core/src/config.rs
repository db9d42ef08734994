//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in multi-threaded runtimes
//! and test harnesses.

use crate::constants::{
    COMPLETION_ATTEMPT_TIMEOUT, DEFAULT_COMPLETION_BASE_URL, DEFAULT_FREQUENCY_PENALTY,
    DEFAULT_HPO_API_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_ONTOLOGY_SEARCH_URL,
    DEFAULT_PRESENCE_PENALTY, DEFAULT_TEMPERATURE, DEFAULT_TOP_P, INITIAL_RETRY_DELAY,
    MAX_COMPLETION_ATTEMPTS,
};
use crate::error::{ConfigError, ConfigResult};
use reqwest::Url;
use std::time::Duration;

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_COMPLETION_BASE_URL: &str = "DDX_COMPLETION_BASE_URL";
pub const ENV_MODEL: &str = "DDX_MODEL";
pub const ENV_MAX_TOKENS: &str = "DDX_MAX_TOKENS";
pub const ENV_TEMPERATURE: &str = "DDX_TEMPERATURE";
pub const ENV_ONTOLOGY_SEARCH_URL: &str = "DDX_ONTOLOGY_SEARCH_URL";
pub const ENV_HPO_API_URL: &str = "DDX_HPO_API_URL";

/// Retry behaviour for a single logical call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first.
    pub max_attempts: u32,
    /// Upper bound on each individual attempt.
    pub attempt_timeout: Duration,
    /// Delay after the first failure. Doubles after each subsequent failure.
    pub initial_delay: Duration,
}

impl RetryPolicy {
    /// Delay to wait after attempt `failed_attempt` (1-indexed) has failed.
    pub fn backoff_delay(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(31);
        self.initial_delay.saturating_mul(1u32 << exponent)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_COMPLETION_ATTEMPTS,
            attempt_timeout: COMPLETION_ATTEMPT_TIMEOUT,
            initial_delay: INITIAL_RETRY_DELAY,
        }
    }
}

/// Settings for the chat-completion service.
#[derive(Clone, Debug)]
pub struct CompletionSettings {
    pub base_url: Url,
    /// Absent keys are reported per request, not at startup.
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub frequency_penalty: f64,
    pub presence_penalty: f64,
    pub retry: RetryPolicy,
}

impl CompletionSettings {
    /// Settings with every sampling parameter at its default.
    pub fn new(base_url: Url, api_key: Option<String>) -> Self {
        Self {
            base_url,
            api_key,
            model: DEFAULT_MODEL.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            frequency_penalty: DEFAULT_FREQUENCY_PENALTY,
            presence_penalty: DEFAULT_PRESENCE_PENALTY,
            retry: RetryPolicy::default(),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    completion: CompletionSettings,
    ontology_search_url: Url,
    hpo_api_url: Url,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(completion: CompletionSettings, ontology_search_url: Url, hpo_api_url: Url) -> Self {
        Self {
            completion,
            ontology_search_url,
            hpo_api_url,
        }
    }

    /// Resolve configuration from a key/value source such as the process environment.
    ///
    /// Missing or blank values fall back to their defaults. The API key is optional here so
    /// that a missing credential surfaces as an authentication error on first use.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if any provided value is malformed or out of range.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let base_url = url_from_env_value(
            ENV_COMPLETION_BASE_URL,
            value(ENV_COMPLETION_BASE_URL),
            DEFAULT_COMPLETION_BASE_URL,
        )?;
        let mut completion = CompletionSettings::new(base_url, value(ENV_API_KEY));
        if let Some(model) = value(ENV_MODEL) {
            completion.model = model;
        }
        completion.max_tokens = max_tokens_from_env_value(value(ENV_MAX_TOKENS))?;
        completion.temperature = temperature_from_env_value(value(ENV_TEMPERATURE))?;

        let ontology_search_url = url_from_env_value(
            ENV_ONTOLOGY_SEARCH_URL,
            value(ENV_ONTOLOGY_SEARCH_URL),
            DEFAULT_ONTOLOGY_SEARCH_URL,
        )?;
        let hpo_api_url =
            url_from_env_value(ENV_HPO_API_URL, value(ENV_HPO_API_URL), DEFAULT_HPO_API_URL)?;

        Ok(Self::new(completion, ontology_search_url, hpo_api_url))
    }

    pub fn completion(&self) -> &CompletionSettings {
        &self.completion
    }

    pub fn ontology_search_url(&self) -> &Url {
        &self.ontology_search_url
    }

    pub fn hpo_api_url(&self) -> &Url {
        &self.hpo_api_url
    }
}

/// Parse an http(s) URL from an optional value, falling back to `default`.
pub fn url_from_env_value(
    name: &'static str,
    value: Option<String>,
    default: &str,
) -> ConfigResult<Url> {
    let raw = value.unwrap_or_else(|| default.to_string());
    let url = Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl {
        name,
        value: raw.clone(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            name,
            value: raw,
            reason: format!("scheme must be http or https, got {}", url.scheme()),
        });
    }

    // Credentials belong in the API key, never in a URL that may be logged.
    if !url.username().is_empty() || url.password().is_some() {
        return Err(ConfigError::InvalidUrl {
            name,
            value: raw,
            reason: "must not contain credentials".into(),
        });
    }

    Ok(url)
}

/// Parse the response token limit. `None` yields the default.
pub fn max_tokens_from_env_value(value: Option<String>) -> ConfigResult<u32> {
    const MAX: u32 = 4096;

    let Some(raw) = value else {
        return Ok(DEFAULT_MAX_TOKENS);
    };
    let parsed: u32 = raw.parse().map_err(|_| ConfigError::InvalidNumber {
        name: ENV_MAX_TOKENS,
        value: raw.clone(),
    })?;
    if parsed == 0 || parsed > MAX {
        return Err(ConfigError::OutOfRange {
            name: ENV_MAX_TOKENS,
            value: raw,
            min: "1".into(),
            max: MAX.to_string(),
        });
    }
    Ok(parsed)
}

/// Parse the sampling temperature. `None` yields the default.
pub fn temperature_from_env_value(value: Option<String>) -> ConfigResult<f64> {
    let Some(raw) = value else {
        return Ok(DEFAULT_TEMPERATURE);
    };
    let parsed: f64 = raw.parse().map_err(|_| ConfigError::InvalidNumber {
        name: ENV_TEMPERATURE,
        value: raw.clone(),
    })?;
    if !(0.0..=2.0).contains(&parsed) {
        return Err(ConfigError::OutOfRange {
            name: ENV_TEMPERATURE,
            value: raw,
            min: "0".into(),
            max: "2".into(),
        });
    }
    Ok(parsed)
}
