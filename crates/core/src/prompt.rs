//! Prompt composition.
//!
//! The composed prompt is a pure function of the case report and the ordered ontology labels.
//! Both inputs are capped before formatting to stay within the completion service's input
//! limits; truncation is silent.

use crate::constants::{MAX_CASE_REPORT_CHARS, MAX_ONTOLOGY_MATCHES};
use ddx_types::CaseReport;

const INSTRUCTIONS: &str = "Based on the following case report and the Human Phenotype \
Ontology (HPO) terms associated with it, provide a differential diagnosis. List the most \
likely diagnoses in order of likelihood, with a brief justification for each.";

const NO_MATCHES: &str = "No associated HPO terms were found.";

/// Build the user prompt for a case report.
///
/// Uses at most the first [`MAX_CASE_REPORT_CHARS`] characters of the report and the first
/// [`MAX_ONTOLOGY_MATCHES`] labels, in the order given.
pub fn compose(case_report: &CaseReport, matches: &[String]) -> String {
    let report = case_report.truncated(MAX_CASE_REPORT_CHARS);
    let matches = &matches[..matches.len().min(MAX_ONTOLOGY_MATCHES)];

    let mut prompt = String::with_capacity(INSTRUCTIONS.len() + report.len() + 64);
    prompt.push_str(INSTRUCTIONS);
    prompt.push_str("\n\nCase report:\n");
    prompt.push_str(report);
    prompt.push_str("\n\nAssociated HPO terms:\n");

    if matches.is_empty() {
        prompt.push_str(NO_MATCHES);
    } else {
        let lines: Vec<String> = matches.iter().map(|label| format!("- {label}")).collect();
        prompt.push_str(&lines.join("\n"));
    }

    prompt
}
