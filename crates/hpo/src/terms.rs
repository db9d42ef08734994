//! HPO terms API wire models.
//!
//! Only the fields DDX relies on are named. Everything else the service returns is kept in
//! `extra` so term details can be passed through to API callers unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A term returned by a `/terms?filter=` search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HpoTermSummary {
    /// Ontology identifier, for example `HP:0001945`.
    pub id: String,

    #[serde(default)]
    pub name: String,
}

/// Full record for a single term from `/terms/{id}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HpoTermDetails {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The terms search has been served both as a bare list and wrapped in an object.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum TermsSearchResponse {
    List(Vec<HpoTermSummary>),
    Wrapped { terms: Vec<HpoTermSummary> },
}

impl TermsSearchResponse {
    pub(crate) fn into_terms(self) -> Vec<HpoTermSummary> {
        match self {
            TermsSearchResponse::List(terms) => terms,
            TermsSearchResponse::Wrapped { terms } => terms,
        }
    }
}
