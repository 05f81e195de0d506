//! Test-case schema and validation.
//!
//! Generated records arrive from the LLM as untyped JSON; nothing crosses
//! into the rest of the pipeline until it has been promoted to a `TestCase`
//! here. Records that fail any constraint are rejected with a
//! `ValidationError` naming the offending field.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Test case priority levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Returns the canonical string form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl FromStr for Priority {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "High" => Ok(Self::High),
            "Medium" => Ok(Self::Medium),
            "Low" => Ok(Self::Low),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Test case types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseType {
    Functional,
    Negative,
    Edge,
    Security,
    Performance,
}

impl CaseType {
    /// Returns the canonical string form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Functional => "Functional",
            Self::Negative => "Negative",
            Self::Edge => "Edge",
            Self::Security => "Security",
            Self::Performance => "Performance",
        }
    }
}

impl FromStr for CaseType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Functional" => Ok(Self::Functional),
            "Negative" => Ok(Self::Negative),
            "Edge" => Ok(Self::Edge),
            "Security" => Ok(Self::Security),
            "Performance" => Ok(Self::Performance),
            _ => Err(()),
        }
    }
}

impl fmt::Display for CaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a candidate record was rejected by the validator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("test case must be a JSON object")]
    NotAnObject,

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("test case ID must start with \"TC-\"")]
    BadIdPrefix,

    #[error("test case ID must be \"TC-\" followed by digits")]
    NonNumericId,

    #[error("title must not be empty")]
    EmptyTitle,

    #[error("steps must contain at least one entry")]
    NoSteps,

    #[error("step {0} must be non-empty")]
    BlankStep(usize),

    #[error("expected_result must not be empty")]
    EmptyExpectedResult,

    #[error("'{0}' is not a valid priority")]
    InvalidPriority(String),

    #[error("'{0}' is not a valid test case type")]
    InvalidCaseType(String),
}

/// A validated test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// Unique identifier, "TC-" followed by digits (e.g., TC-001).
    pub id: String,
    /// Short description of what the case verifies.
    pub title: String,
    /// Requirement identifiers this case traces back to.
    #[serde(default)]
    pub requirement_ids: Vec<String>,
    /// Preconditions that must hold before the steps run.
    #[serde(default)]
    pub preconditions: Vec<String>,
    /// Ordered execution steps; never empty, no blank entries.
    pub steps: Vec<String>,
    /// The observable outcome the steps must produce.
    pub expected_result: String,
    /// Priority level.
    pub priority: Priority,
    /// Test case type.
    #[serde(rename = "type")]
    pub case_type: CaseType,
}

impl TestCase {
    /// Validates an untyped record and promotes it to a `TestCase`.
    ///
    /// Unknown extra fields are ignored. Missing or malformed fields reject
    /// the record with an error naming the field.
    ///
    /// # Errors
    /// Returns a `ValidationError` describing the first violated constraint.
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let record = value.as_object().ok_or(ValidationError::NotAnObject)?;

        let id = require_str(record, "id")?;
        let digits = id.strip_prefix("TC-").ok_or(ValidationError::BadIdPrefix)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::NonNumericId);
        }

        let title = require_str(record, "title")?;
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }

        let requirement_ids = optional_string_list(record, "requirement_ids")?;
        let preconditions = optional_string_list(record, "preconditions")?;

        let steps = match record.get("steps") {
            None => return Err(ValidationError::MissingField("steps")),
            Some(value) => string_list(value, "steps")?,
        };
        if steps.is_empty() {
            return Err(ValidationError::NoSteps);
        }
        if let Some(index) = steps.iter().position(|step| step.trim().is_empty()) {
            return Err(ValidationError::BlankStep(index + 1));
        }

        let expected_result = require_str(record, "expected_result")?;
        if expected_result.is_empty() {
            return Err(ValidationError::EmptyExpectedResult);
        }

        let priority_str = require_str(record, "priority")?;
        let priority = Priority::from_str(priority_str)
            .map_err(|()| ValidationError::InvalidPriority(priority_str.to_string()))?;

        let type_str = require_str(record, "type")?;
        let case_type = CaseType::from_str(type_str)
            .map_err(|()| ValidationError::InvalidCaseType(type_str.to_string()))?;

        Ok(Self {
            id: id.to_string(),
            title: title.to_string(),
            requirement_ids,
            preconditions,
            steps,
            expected_result: expected_result.to_string(),
            priority,
            case_type,
        })
    }

    /// Returns the numeric suffix of the identifier.
    #[must_use]
    pub fn case_number(&self) -> Option<u32> {
        self.id.strip_prefix("TC-")?.parse().ok()
    }
}

/// Returns the highest numeric identifier suffix in the given cases, or 0.
#[must_use]
pub fn highest_case_number(cases: &[TestCase]) -> u32 {
    cases.iter().filter_map(TestCase::case_number).max().unwrap_or(0)
}

fn require_str<'a>(
    record: &'a serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    match record.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField(field)),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(ValidationError::WrongType { field, expected: "a string" }),
    }
}

fn optional_string_list(
    record: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<Vec<String>, ValidationError> {
    match record.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => string_list(value, field),
    }
}

fn string_list(value: &Value, field: &'static str) -> Result<Vec<String>, ValidationError> {
    let items = value
        .as_array()
        .ok_or(ValidationError::WrongType { field, expected: "an array of strings" })?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(String::from)
                .ok_or(ValidationError::WrongType { field, expected: "an array of strings" })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_record() -> Value {
        json!({
            "id": "TC-001",
            "title": "Test user login",
            "requirement_ids": ["REQ-001"],
            "preconditions": ["User is not logged in"],
            "steps": ["Navigate to login page", "Enter credentials", "Click login"],
            "expected_result": "User is logged in successfully",
            "priority": "High",
            "type": "Functional"
        })
    }

    #[test]
    fn test_valid_test_case() {
        let case = TestCase::from_value(&valid_record()).unwrap();
        assert_eq!(case.id, "TC-001");
        assert_eq!(case.title, "Test user login");
        assert_eq!(case.priority, Priority::High);
        assert_eq!(case.case_type, CaseType::Functional);
        assert_eq!(case.steps.len(), 3);
    }

    #[test]
    fn test_minimum_required_fields() {
        let record = json!({
            "id": "TC-001",
            "title": "Minimal test case",
            "steps": ["Single step"],
            "expected_result": "It works",
            "priority": "Low",
            "type": "Edge"
        });
        let case = TestCase::from_value(&record).unwrap();
        assert!(case.requirement_ids.is_empty());
        assert!(case.preconditions.is_empty());
    }

    #[test]
    fn test_invalid_id_prefix() {
        let mut record = valid_record();
        record["id"] = json!("TEST-001");
        assert_eq!(TestCase::from_value(&record), Err(ValidationError::BadIdPrefix));
    }

    #[test]
    fn test_non_numeric_id_suffix() {
        let mut record = valid_record();
        record["id"] = json!("TC-01X");
        assert_eq!(TestCase::from_value(&record), Err(ValidationError::NonNumericId));
    }

    #[test]
    fn test_blank_step_rejected() {
        let mut record = valid_record();
        record["steps"] = json!(["Step 1", "   ", "Step 3"]);
        assert_eq!(TestCase::from_value(&record), Err(ValidationError::BlankStep(2)));
    }

    #[test]
    fn test_empty_steps_rejected() {
        let mut record = valid_record();
        record["steps"] = json!([]);
        assert_eq!(TestCase::from_value(&record), Err(ValidationError::NoSteps));
    }

    #[test]
    fn test_missing_field_named() {
        let mut record = valid_record();
        record.as_object_mut().unwrap().remove("expected_result");
        let err = TestCase::from_value(&record).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("expected_result"));
        assert!(err.to_string().contains("expected_result"));
    }

    #[test]
    fn test_invalid_priority() {
        let mut record = valid_record();
        record["priority"] = json!("Urgent");
        assert_eq!(
            TestCase::from_value(&record),
            Err(ValidationError::InvalidPriority("Urgent".to_string()))
        );
    }

    #[test]
    fn test_invalid_case_type() {
        let mut record = valid_record();
        record["type"] = json!("Smoke");
        assert_eq!(
            TestCase::from_value(&record),
            Err(ValidationError::InvalidCaseType("Smoke".to_string()))
        );
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let mut record = valid_record();
        record["reviewer"] = json!("someone");
        assert!(TestCase::from_value(&record).is_ok());
    }

    #[test]
    fn test_non_object_rejected() {
        assert_eq!(TestCase::from_value(&json!(5)), Err(ValidationError::NotAnObject));
        assert_eq!(TestCase::from_value(&json!("TC-001")), Err(ValidationError::NotAnObject));
    }

    #[test]
    fn test_case_number() {
        let case = TestCase::from_value(&valid_record()).unwrap();
        assert_eq!(case.case_number(), Some(1));
    }

    #[test]
    fn test_highest_case_number() {
        let mut cases = Vec::new();
        for id in ["TC-001", "TC-007", "TC-003"] {
            let mut record = valid_record();
            record["id"] = json!(id);
            cases.push(TestCase::from_value(&record).unwrap());
        }
        assert_eq!(highest_case_number(&cases), 7);
        assert_eq!(highest_case_number(&[]), 0);
    }

    #[test]
    fn test_serde_round_trip_uses_type_key() {
        let case = TestCase::from_value(&valid_record()).unwrap();
        let json = serde_json::to_value(&case).unwrap();
        assert_eq!(json["type"], "Functional");
        assert_eq!(json["priority"], "High");
        let back: TestCase = serde_json::from_value(json).unwrap();
        assert_eq!(back, case);
    }
}
