//! Request and response bodies for the DDX APIs.

use ddx_core::Diagnosis;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DiagnoseReq {
    /// Free-text patient case narrative.
    pub case_report: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DiagnoseRes {
    /// Lower-cased unique terms extracted from the case report.
    pub terms: Vec<String>,
    /// Ontology labels gathered for those terms, in lookup order.
    pub matches: Vec<String>,
    /// The prompt sent to the language model.
    pub prompt: String,
    /// The model's answer.
    pub result: String,
}

impl From<Diagnosis> for DiagnoseRes {
    fn from(d: Diagnosis) -> Self {
        Self {
            terms: d.terms.into_vec(),
            matches: d.matches,
            prompt: d.prompt,
            result: d.result,
        }
    }
}

#[derive(Clone, Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TermsQuery {
    /// Text to split into terms.
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TermsRes {
    pub terms: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LookupQuery {
    /// Single term to resolve against the ontology.
    pub term: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LookupRes {
    pub term: String,
    pub labels: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

impl ErrorRes {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
