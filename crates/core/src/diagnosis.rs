//! The case report → differential diagnosis pipeline.

use crate::completion::{ChatClient, Completion};
use crate::config::CoreConfig;
use crate::constants::HTTP_CONNECT_TIMEOUT;
use crate::error::{CompletionError, ConfigError, ConfigResult, DiagnosisError, DiagnosisResult};
use crate::prompt::compose;
use crate::session::{update, SessionEvent, SessionState};
use crate::terms::{extract_terms, TermSet};
use ddx_types::CaseReport;
use hpo::{HpoClient, OntologyLookup};

/// Everything produced for one case report before the completion call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedPrompt {
    pub terms: TermSet,
    /// Labels from every term, in lookup order, before any cap is applied.
    pub matches: Vec<String>,
    pub prompt: String,
}

/// A completed diagnosis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnosis {
    pub terms: TermSet,
    pub matches: Vec<String>,
    pub prompt: String,
    pub result: String,
}

/// The production service, backed by the HPO and chat-completion HTTP clients.
pub type DefaultDiagnosisService = DiagnosisService<HpoClient, ChatClient>;

/// Orchestrates term extraction, ontology enrichment, prompt composition and completion.
///
/// Pure pipeline logic; no API concerns.
#[derive(Clone, Debug)]
pub struct DiagnosisService<O, C> {
    ontology: O,
    completion: C,
}

impl DefaultDiagnosisService {
    /// Build the production service from startup configuration.
    ///
    /// A single HTTP client (and connection pool) is shared by both upstream clients.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::HttpClient` if the HTTP client cannot be constructed.
    pub fn from_config(cfg: &CoreConfig) -> ConfigResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .build()
            .map_err(ConfigError::HttpClient)?;

        let ontology = HpoClient::new(
            http.clone(),
            cfg.ontology_search_url().clone(),
            cfg.hpo_api_url().clone(),
        );
        let completion = ChatClient::new(http, cfg.completion().clone());
        Ok(Self::new(ontology, completion))
    }
}

impl<O, C> DiagnosisService<O, C>
where
    O: OntologyLookup,
    C: Completion,
{
    pub fn new(ontology: O, completion: C) -> Self {
        Self {
            ontology,
            completion,
        }
    }

    pub fn ontology(&self) -> &O {
        &self.ontology
    }

    pub fn completion(&self) -> &C {
        &self.completion
    }

    /// Look up every term, one at a time, and collect the labels in order.
    ///
    /// Enrichment is best effort: a term whose lookup fails contributes no labels and the
    /// failure is only logged.
    pub async fn collect_matches(&self, terms: &TermSet) -> Vec<String> {
        let mut matches = Vec::new();

        for term in terms {
            match self.ontology.lookup(term).await {
                Ok(labels) => matches.extend(labels),
                Err(e) => tracing::warn!("skipping ontology lookup for {term:?}: {e}"),
            }
        }

        matches
    }

    /// Extract terms, enrich them and compose the prompt for a case report.
    pub async fn prepare(&self, case_report: &CaseReport) -> PreparedPrompt {
        let terms = extract_terms(case_report.as_str());
        let matches = self.collect_matches(&terms).await;
        let prompt = compose(case_report, &matches);

        tracing::debug!(
            terms = terms.len(),
            matches = matches.len(),
            "prepared prompt"
        );

        PreparedPrompt {
            terms,
            matches,
            prompt,
        }
    }

    /// Run the full pipeline for raw user input.
    ///
    /// # Errors
    ///
    /// Returns `DiagnosisError::InvalidInput` for blank input (before any network call) and
    /// `DiagnosisError::Completion` when the completion call fails after its retries.
    pub async fn diagnose(&self, input: &str) -> DiagnosisResult<Diagnosis> {
        let case_report = CaseReport::new(input)?;
        let PreparedPrompt {
            terms,
            matches,
            prompt,
        } = self.prepare(&case_report).await;

        let result = self.completion.complete(&prompt).await?;
        tracing::info!(
            terms = terms.len(),
            matches = matches.len(),
            "diagnosis completed"
        );

        Ok(Diagnosis {
            terms,
            matches,
            prompt,
            result,
        })
    }

    /// Run one submission for a session and return the settled state.
    ///
    /// The caller is expected to have already published the `Pending` state produced by
    /// `update(previous, SessionEvent::Submitted)`, and passes it in here.
    pub async fn resolve_submission(&self, pending: SessionState, input: &str) -> SessionState {
        let outcome = self.diagnose(input).await;
        update(pending, session_event(&outcome))
    }
}

/// Translate a pipeline outcome into the session event that settles it.
pub fn session_event(outcome: &DiagnosisResult<Diagnosis>) -> SessionEvent {
    match outcome {
        Ok(diagnosis) => SessionEvent::Completed(diagnosis.result.clone()),
        Err(e) => {
            tracing::error!("diagnosis failed: {e}");
            SessionEvent::Failed(e.user_message())
        }
    }
}

impl DiagnosisError {
    /// Message suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            DiagnosisError::InvalidInput(_) => "Please enter a case report.".into(),
            DiagnosisError::Completion(CompletionError::Timeout { .. }) => {
                "The request to the language model timed out. Please try again.".into()
            }
            DiagnosisError::Completion(CompletionError::MissingApiKey) => {
                "The language model API key is not configured.".into()
            }
            DiagnosisError::Completion(CompletionError::Unauthorized { .. }) => {
                "The language model service rejected the configured API key.".into()
            }
            DiagnosisError::Completion(e) => format!("An error occurred: {e}"),
        }
    }

    /// True when the failure is a credential problem rather than a transient one.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            DiagnosisError::Completion(
                CompletionError::MissingApiKey | CompletionError::Unauthorized { .. }
            )
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, DiagnosisError::Completion(CompletionError::Timeout { .. }))
    }
}
