//! # DDX Core
//!
//! Core business logic for the DDX case report → differential diagnosis assistant.
//!
//! This crate contains the pipeline and nothing else:
//! - Term extraction from free-text case reports
//! - Best-effort ontology enrichment through the `hpo` crate
//! - Prompt composition with input budgets
//! - Chat-completion calls with bounded retry and exponential backoff
//! - The per-session presentation state machine
//!
//! **No API concerns**: HTTP servers, HTML rendering and CLI parsing belong in `api-rest`,
//! `api-shared` and `cli`.

pub mod completion;
pub mod config;
pub mod constants;
pub mod diagnosis;
pub mod error;
pub mod prompt;
pub mod retry;
pub mod session;
pub mod terms;

pub use completion::{ChatClient, Completion};
pub use config::{CompletionSettings, CoreConfig, RetryPolicy};
pub use diagnosis::{
    session_event, DefaultDiagnosisService, Diagnosis, DiagnosisService, PreparedPrompt,
};
pub use error::{
    CompletionError, CompletionResult, ConfigError, ConfigResult, DiagnosisError,
    DiagnosisResult,
};
pub use prompt::compose;
pub use retry::{retry_with_backoff, RetryError, Retryable};
pub use session::{update, Outcome, SessionEvent, SessionState, SessionView};
pub use terms::{extract_terms, TermSet};

pub use ddx_types::{CaseReport, NonEmptyText, TextError};
pub use hpo::{HpoClient, HpoTermDetails, OntologyLookup};
