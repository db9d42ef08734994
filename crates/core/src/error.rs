use std::time::Duration;

/// Errors raised while resolving configuration at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is not a valid URL ({value}): {reason}")]
    InvalidUrl {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("{name} must be a number, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: String,
        min: String,
        max: String,
    },
    #[error("{name} cannot be empty")]
    Empty { name: &'static str },
    #[error("failed to build HTTP client: {0}")]
    HttpClient(reqwest::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Errors raised by the completion client.
///
/// Only the final attempt's error reaches callers. `Timeout` is reported when that final
/// attempt ran out of time, whether on the per-attempt bound or an HTTP client timeout, so it
/// can be shown differently from other failures.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("no API key configured for the completion service")]
    MissingApiKey,
    #[error("completion service rejected the credentials (status {status})")]
    Unauthorized { status: u16 },
    #[error("completion request timed out after {attempts} attempts ({}s per attempt)", .timeout.as_secs())]
    Timeout { attempts: u32, timeout: Duration },
    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("completion service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed completion response: {0}")]
    MalformedResponse(String),
    #[error("completion service returned no text")]
    EmptyResponse,
    #[error("invalid completion URL: {0}")]
    InvalidUrl(String),
}

pub type CompletionResult<T> = std::result::Result<T, CompletionError>;

/// Errors raised by a diagnosis submission.
///
/// Ontology failures never appear here; enrichment is best effort.
#[derive(Debug, thiserror::Error)]
pub enum DiagnosisError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ddx_types::TextError),
    #[error(transparent)]
    Completion(#[from] CompletionError),
}

pub type DiagnosisResult<T> = std::result::Result<T, DiagnosisError>;
