//! Artifact export for validated test cases.
//!
//! Each run exports three artifacts into its own directory: the full
//! test-case list as JSON, a flattened CSV table, and a traceability index
//! mapping requirement IDs to the cases that exercise them. Re-exporting a
//! run overwrites the previous artifacts.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::testcase::{CaseType, Priority, TestCase};

/// Separator used to flatten list-valued fields into CSV cells.
pub const LIST_SEPARATOR: &str = "; ";

/// Errors that can occur while writing artifacts.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// One traceability entry: a test case that references a requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceabilityEntry {
    /// The referencing test case's ID.
    pub test_case_id: String,
    /// The referencing test case's title.
    pub title: String,
    /// The referencing test case's type.
    #[serde(rename = "type")]
    pub case_type: CaseType,
    /// The referencing test case's priority.
    pub priority: Priority,
}

/// Builds the traceability index: requirement ID to the test cases that
/// reference it, in test-case order.
///
/// Requirement IDs referenced by no test case do not appear; a test case
/// with no requirement IDs contributes to no key.
#[must_use]
pub fn build_traceability(cases: &[TestCase]) -> BTreeMap<String, Vec<TraceabilityEntry>> {
    let mut index: BTreeMap<String, Vec<TraceabilityEntry>> = BTreeMap::new();

    for case in cases {
        for requirement_id in &case.requirement_ids {
            index.entry(requirement_id.clone()).or_default().push(TraceabilityEntry {
                test_case_id: case.id.clone(),
                title: case.title.clone(),
                case_type: case.case_type,
                priority: case.priority,
            });
        }
    }

    index
}

/// Writes per-run artifacts under a root directory.
#[derive(Debug, Clone)]
pub struct Exporter {
    /// Root directory; each run gets `<root>/<run_id>/`.
    root: PathBuf,
}

impl Exporter {
    /// Creates an exporter rooted at the given directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the artifact directory for a run.
    #[must_use]
    pub fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root.join(run_id)
    }

    /// Exports the validated test-case list for a run.
    ///
    /// Produces `testcases.json`, `testcases.csv`, and `traceability.json`
    /// in the run's artifact directory and returns that directory.
    ///
    /// # Errors
    /// Returns an `ExportError` if any artifact cannot be written.
    pub fn export(&self, run_id: &str, cases: &[TestCase]) -> Result<PathBuf, ExportError> {
        let dir = self.run_dir(run_id);
        fs::create_dir_all(&dir)?;

        self.write_json(&dir, cases)?;
        self.write_csv(&dir, cases)?;
        self.write_traceability(&dir, cases)?;

        debug!(run_id = %run_id, dir = %dir.display(), case_count = cases.len(), "Exported artifacts");
        Ok(dir)
    }

    /// Removes a run's artifact directory, if present.
    ///
    /// # Errors
    /// Returns an `io::Error` for filesystem failures other than absence.
    pub fn remove(&self, run_id: &str) -> io::Result<()> {
        match fs::remove_dir_all(self.run_dir(run_id)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }

    fn write_json(&self, dir: &Path, cases: &[TestCase]) -> Result<(), ExportError> {
        let file = File::create(dir.join("testcases.json"))?;
        serde_json::to_writer_pretty(file, cases)?;
        Ok(())
    }

    fn write_csv(&self, dir: &Path, cases: &[TestCase]) -> Result<(), ExportError> {
        let mut writer = csv::Writer::from_path(dir.join("testcases.csv"))?;
        writer.write_record([
            "id",
            "title",
            "requirement_ids",
            "preconditions",
            "steps",
            "expected_result",
            "priority",
            "type",
        ])?;

        for case in cases {
            let requirement_ids = case.requirement_ids.join(LIST_SEPARATOR);
            let preconditions = case.preconditions.join(LIST_SEPARATOR);
            let steps = case.steps.join(LIST_SEPARATOR);
            writer.write_record([
                case.id.as_str(),
                case.title.as_str(),
                requirement_ids.as_str(),
                preconditions.as_str(),
                steps.as_str(),
                case.expected_result.as_str(),
                case.priority.as_str(),
                case.case_type.as_str(),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }

    fn write_traceability(&self, dir: &Path, cases: &[TestCase]) -> Result<(), ExportError> {
        let index = build_traceability(cases);
        let file = File::create(dir.join("traceability.json"))?;
        serde_json::to_writer_pretty(file, &index)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn case(id: &str, title: &str, requirement_ids: &[&str]) -> TestCase {
        TestCase::from_value(&json!({
            "id": id,
            "title": title,
            "requirement_ids": requirement_ids,
            "preconditions": ["User is not logged in"],
            "steps": ["Navigate to login page", "Enter credentials"],
            "expected_result": "User is logged in",
            "priority": "High",
            "type": "Functional"
        }))
        .unwrap()
    }

    #[test]
    fn test_traceability_inverts_relation() {
        let cases = vec![
            case("TC-001", "Login", &["REQ-001", "REQ-002"]),
            case("TC-002", "Logout", &["REQ-002"]),
            case("TC-003", "Orphan", &[]),
        ];

        let index = build_traceability(&cases);

        assert_eq!(index.len(), 2);
        assert_eq!(index["REQ-001"].len(), 1);
        assert_eq!(index["REQ-001"][0].test_case_id, "TC-001");
        assert_eq!(index["REQ-002"].len(), 2);
        assert_eq!(index["REQ-002"][0].test_case_id, "TC-001");
        assert_eq!(index["REQ-002"][1].test_case_id, "TC-002");
    }

    #[test]
    fn test_traceability_empty_cases() {
        assert!(build_traceability(&[]).is_empty());
    }

    #[test]
    fn test_export_writes_all_artifacts() {
        let tmp = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(tmp.path());
        let cases = vec![case("TC-001", "Login", &["REQ-001"])];

        let dir = exporter.export("run-1", &cases).unwrap();

        assert!(dir.join("testcases.json").exists());
        assert!(dir.join("testcases.csv").exists());
        assert!(dir.join("traceability.json").exists());

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.join("testcases.json")).unwrap()).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["id"], "TC-001");
    }

    #[test]
    fn test_csv_joins_list_fields() {
        let tmp = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(tmp.path());
        let cases = vec![case("TC-001", "Login", &["REQ-001", "REQ-002"])];

        let dir = exporter.export("run-1", &cases).unwrap();
        let content = fs::read_to_string(dir.join("testcases.csv")).unwrap();

        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,title,requirement_ids,preconditions,steps,expected_result,priority,type"
        );
        let row = lines.next().unwrap();
        assert!(row.contains("REQ-001; REQ-002"));
        assert!(row.contains("Navigate to login page; Enter credentials"));
    }

    #[test]
    fn test_csv_round_trip_recovers_lists() {
        let joined = ["Navigate to login page", "Enter credentials"].join(LIST_SEPARATOR);
        let split: Vec<&str> = joined.split(LIST_SEPARATOR).collect();
        assert_eq!(split, vec!["Navigate to login page", "Enter credentials"]);
    }

    #[test]
    fn test_export_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(tmp.path());
        let cases = vec![case("TC-001", "Login", &["REQ-001"])];

        exporter.export("run-1", &cases).unwrap();
        let first = fs::read_to_string(exporter.run_dir("run-1").join("testcases.json")).unwrap();

        exporter.export("run-1", &cases).unwrap();
        let second = fs::read_to_string(exporter.run_dir("run-1").join("testcases.json")).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_export_empty_list() {
        let tmp = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(tmp.path());

        let dir = exporter.export("run-1", &[]).unwrap();
        let content = fs::read_to_string(dir.join("testcases.csv")).unwrap();
        // Header only
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_remove_missing_dir_is_ok() {
        let tmp = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(tmp.path());
        assert!(exporter.remove("never-exported").is_ok());
    }
}
