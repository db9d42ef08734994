//! Constants used throughout the DDX core crate.
//!
//! Limits, retry timings and upstream defaults live here so the pipeline and its tests agree
//! on a single set of values.

use std::time::Duration;

/// Maximum number of case-report characters embedded in a prompt.
pub const MAX_CASE_REPORT_CHARS: usize = 2000;

/// Maximum number of ontology labels embedded in a prompt.
pub const MAX_ONTOLOGY_MATCHES: usize = 50;

/// Number of completion attempts before giving up.
pub const MAX_COMPLETION_ATTEMPTS: u32 = 3;

/// Upper bound on a single completion attempt.
pub const COMPLETION_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Delay after the first failed attempt; doubles after each further failure.
pub const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(2);

/// System message sent with every completion request.
pub const SYSTEM_PROMPT: &str = "You are a medical expert.";

/// Default chat model.
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Default response length limit, in tokens.
pub const DEFAULT_MAX_TOKENS: u32 = 500;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

pub const DEFAULT_TOP_P: f64 = 1.0;
pub const DEFAULT_FREQUENCY_PENALTY: f64 = 0.0;
pub const DEFAULT_PRESENCE_PENALTY: f64 = 0.0;

/// Default OpenAI-compatible API base URL.
pub const DEFAULT_COMPLETION_BASE_URL: &str = "https://api.openai.com/v1";

/// Default HPO label search endpoint.
pub const DEFAULT_ONTOLOGY_SEARCH_URL: &str = "https://clinicaltables.nlm.nih.gov/api/hpo/v3/search";

/// Default HPO terms API base.
pub const DEFAULT_HPO_API_URL: &str = "https://ontology.jax.org/api/hp";

/// Connect timeout for all outbound HTTP clients.
pub const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
