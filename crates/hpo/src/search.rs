//! Label search response parsing.
//!
//! The search endpoint answers with a positional JSON list:
//!
//! `[total, [codes], extra, [display entries], ...]`
//!
//! Only index 3 is used. Each display entry is either a plain string or a list of strings
//! (for example `["HP:0001945", "Fever"]`), and both forms are flattened in order.

use crate::{HpoError, HpoResult};
use serde_json::Value;

/// Position of the display entries in the search response.
const DISPLAY_INDEX: usize = 3;

/// Extract the flattened label strings from a search response body.
///
/// A missing or `null` display slot yields no labels. Non-string items nested inside an entry
/// are ignored.
///
/// # Errors
///
/// Returns `HpoError::MalformedResponse` if the body is not a JSON list, or if the display
/// slot is present but is not a list.
pub fn labels_from_search_response(body: &Value) -> HpoResult<Vec<String>> {
    let outer = body
        .as_array()
        .ok_or_else(|| HpoError::MalformedResponse("expected a JSON list".into()))?;

    let entries = match outer.get(DISPLAY_INDEX) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            return Err(HpoError::MalformedResponse(format!(
                "expected a list at index {DISPLAY_INDEX}, got {}",
                type_name(other)
            )))
        }
    };

    let mut labels = Vec::new();
    for entry in entries {
        match entry {
            Value::String(label) => labels.push(label.clone()),
            Value::Array(parts) => labels.extend(
                parts
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned),
            ),
            other => {
                tracing::debug!("ignoring HPO display entry of type {}", type_name(other));
            }
        }
    }

    Ok(labels)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
