//! Parsing of generative JSON output.
//!
//! The generator is instructed to return a JSON array, but the response is
//! untrusted text. Parsing never fails the pipeline: an unparsable response
//! becomes a typed raw-text sentinel for the repair step to handle.

use serde_json::Value;

/// Result of parsing the generator's response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// The response parsed as JSON; candidate records in response order.
    Parsed(Vec<Value>),
    /// The response was not valid JSON; carries the raw text for repair.
    Raw(String),
}

/// Parses text as a JSON candidate-record array.
///
/// A single top-level value that is not an array is wrapped into a
/// one-element list; per-record shape problems are left for the schema
/// validator. Returns `None` when the text is not valid JSON at all.
#[must_use]
pub fn try_parse_case_array(text: &str) -> Option<Vec<Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => Some(items),
        Ok(other) => Some(vec![other]),
        Err(_) => None,
    }
}

/// Parses the generator's response, falling back to the raw-text sentinel.
#[must_use]
pub fn parse_case_array(text: &str) -> GenerationOutcome {
    match try_parse_case_array(text) {
        Some(items) => GenerationOutcome::Parsed(items),
        None => GenerationOutcome::Raw(text.to_string()),
    }
}
