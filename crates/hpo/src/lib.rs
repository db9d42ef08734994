//! Human Phenotype Ontology (HPO) wire/boundary support.
//!
//! This crate provides **wire models** and an **HTTP client** for the two public HPO services
//! DDX talks to:
//! - a label search endpoint (`?terms=<term>`) returning a positional JSON list, used to enrich
//!   case reports with phenotype labels
//! - the HPO terms API (`/terms?filter=`, `/terms/{id}`), used for symptom queries
//!
//! Nothing here is fatal to a diagnosis request. Callers treat every [`HpoError`] as a reason
//! to skip the affected term.

pub mod client;
pub mod search;
pub mod terms;

pub use client::{HpoClient, OntologyLookup};
pub use search::labels_from_search_response;
pub use terms::{HpoTermDetails, HpoTermSummary};

/// Errors returned by the `hpo` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum HpoError {
    #[error("HPO request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HPO service returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("malformed HPO response: {0}")]
    MalformedResponse(String),

    #[error("invalid HPO URL: {0}")]
    InvalidUrl(String),
}

/// Type alias for Results that can fail with an [`HpoError`].
pub type HpoResult<T> = Result<T, HpoError>;
