//! Run state for the document-to-test-cases pipeline.
//!
//! A run is one processing job: it owns the extracted requirement text, the
//! working test-case list, and the status/progress markers the pipeline
//! writes at every stage boundary.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::testcase::TestCase;

/// Run status enumeration, mirroring the pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Run created, waiting for ingestion or orchestration.
    Pending,
    /// Uploaded document is being stored.
    Uploading,
    /// Document text is being extracted and chunked.
    Reading,
    /// Feature analysis of the requirement chunks.
    Analyzing,
    /// Test-case generation (also used by the gap-fill stage).
    Generating,
    /// Schema validation and JSON repair.
    Validating,
    /// Coverage audit.
    Auditing,
    /// Artifact export.
    Exporting,
    /// Pipeline finished successfully.
    Completed,
    /// Pipeline aborted with an error.
    Failed,
}

impl RunStatus {
    /// Checks whether a status change follows the pipeline's state machine.
    ///
    /// Failed is reachable from any non-terminal state; Completed and Failed
    /// only leave through an explicit reset back to Pending.
    #[must_use]
    pub fn can_transition_to(self, to: Self) -> bool {
        if self == to {
            return true;
        }
        if to == Self::Failed {
            return !self.is_terminal();
        }
        matches!(
            (self, to),
            (Self::Pending, Self::Uploading | Self::Analyzing)
                | (Self::Uploading, Self::Reading)
                | (Self::Reading, Self::Pending | Self::Analyzing)
                | (Self::Analyzing, Self::Generating)
                | (Self::Generating, Self::Validating | Self::Exporting)
                | (Self::Validating, Self::Auditing | Self::Exporting)
                | (Self::Auditing, Self::Generating | Self::Exporting)
                | (Self::Exporting, Self::Completed)
                | (Self::Completed | Self::Failed, Self::Pending)
        )
    }

    /// Returns true for the two end states of a run.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Configuration captured when a run is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// LLM provider name ("openai", "mock").
    pub llm_provider: String,
    /// Model ID for the provider.
    pub model_id: String,
    /// Maximum number of test cases the generator is asked for.
    pub max_cases: u32,
    /// Retry budget for the JSON repair step (at least one attempt is made).
    pub repair_attempts: u32,
    /// Whether the coverage audit / gap fill branch may run.
    pub enable_coverage_auditor: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            llm_provider: "openai".to_string(),
            model_id: "gpt-4".to_string(),
            max_cases: 50,
            repair_attempts: 1,
            enable_coverage_auditor: true,
        }
    }
}

/// State for a single run.
#[derive(Debug, Clone, Serialize)]
pub struct RunState {
    /// Unique run identifier, immutable after creation.
    pub run_id: String,
    /// Current status.
    pub status: RunStatus,
    /// Name of the stage currently executing, if any.
    pub current_stage: Option<String>,
    /// Progress percentage (0-100), non-decreasing while the run is healthy.
    pub progress: u8,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp, refreshed by every registry write.
    pub updated_at: DateTime<Utc>,
    /// Completion timestamp, set exactly when the run completes.
    pub completed_at: Option<DateTime<Utc>>,

    /// Source document filename.
    pub filename: String,
    /// Source document size in bytes, once known.
    pub file_size: Option<u64>,

    /// Generation configuration.
    pub config: RunConfig,

    /// Extracted document text, seeded by ingestion.
    pub raw_text: Option<String>,
    /// Chunked document text, seeded by ingestion.
    pub chunks: Vec<String>,
    /// Combined per-chunk feature analysis.
    pub features_summary: Option<String>,
    /// Validated test cases.
    pub test_cases: Vec<TestCase>,
    /// Validation issues collected while building the test-case list.
    pub validation_issues: Vec<String>,
    /// Coverage gaps reported by the audit stage.
    pub coverage_gaps: Vec<String>,
    /// Final test-case count, recorded at completion.
    pub test_case_count: usize,

    /// Directory holding the exported artifacts.
    pub artifacts_path: Option<PathBuf>,
    /// Failure description, set exactly when the run fails.
    pub error_message: Option<String>,
}

impl RunState {
    /// Creates a fresh Pending run.
    #[must_use]
    pub fn new(run_id: String, filename: String, config: RunConfig) -> Self {
        let now = Utc::now();
        Self {
            run_id,
            status: RunStatus::Pending,
            current_stage: None,
            progress: 0,
            created_at: now,
            updated_at: now,
            completed_at: None,
            filename,
            file_size: None,
            config,
            raw_text: None,
            chunks: Vec::new(),
            features_summary: None,
            test_cases: Vec::new(),
            validation_issues: Vec::new(),
            coverage_gaps: Vec::new(),
            test_case_count: 0,
            artifacts_path: None,
            error_message: None,
        }
    }
}

/// Partial update merged into a stored run.
///
/// Only fields that were explicitly set are written; everything else keeps
/// its current value. Built with the `with_*`/`clear_*` methods.
#[derive(Debug, Clone, Default)]
pub struct RunUpdate {
    status: Option<RunStatus>,
    current_stage: Option<Option<String>>,
    progress: Option<u8>,
    completed_at: Option<Option<DateTime<Utc>>>,
    file_size: Option<u64>,
    raw_text: Option<String>,
    chunks: Option<Vec<String>>,
    features_summary: Option<String>,
    test_cases: Option<Vec<TestCase>>,
    validation_issues: Option<Vec<String>>,
    coverage_gaps: Option<Vec<String>>,
    test_case_count: Option<usize>,
    artifacts_path: Option<Option<PathBuf>>,
    error_message: Option<Option<String>>,
}

impl RunUpdate {
    /// Creates an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: RunStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Returns the status this update would write, if any.
    #[must_use]
    pub fn status(&self) -> Option<RunStatus> {
        self.status
    }

    /// Sets the current stage name.
    #[must_use]
    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.current_stage = Some(Some(stage.into()));
        self
    }

    /// Clears the current stage name.
    #[must_use]
    pub fn clear_stage(mut self) -> Self {
        self.current_stage = Some(None);
        self
    }

    /// Sets the progress percentage.
    #[must_use]
    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Sets the completion timestamp.
    #[must_use]
    pub fn with_completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = Some(Some(at));
        self
    }

    /// Clears the completion timestamp.
    #[must_use]
    pub fn clear_completed_at(mut self) -> Self {
        self.completed_at = Some(None);
        self
    }

    /// Sets the source file size.
    #[must_use]
    pub fn with_file_size(mut self, size: u64) -> Self {
        self.file_size = Some(size);
        self
    }

    /// Sets the extracted document text.
    #[must_use]
    pub fn with_raw_text(mut self, text: impl Into<String>) -> Self {
        self.raw_text = Some(text.into());
        self
    }

    /// Sets the chunked document text.
    #[must_use]
    pub fn with_chunks(mut self, chunks: Vec<String>) -> Self {
        self.chunks = Some(chunks);
        self
    }

    /// Sets the combined feature summary.
    #[must_use]
    pub fn with_features_summary(mut self, summary: impl Into<String>) -> Self {
        self.features_summary = Some(summary.into());
        self
    }

    /// Replaces the validated test-case list.
    #[must_use]
    pub fn with_test_cases(mut self, cases: Vec<TestCase>) -> Self {
        self.test_cases = Some(cases);
        self
    }

    /// Replaces the validation-issue list.
    #[must_use]
    pub fn with_validation_issues(mut self, issues: Vec<String>) -> Self {
        self.validation_issues = Some(issues);
        self
    }

    /// Replaces the coverage-gap list.
    #[must_use]
    pub fn with_coverage_gaps(mut self, gaps: Vec<String>) -> Self {
        self.coverage_gaps = Some(gaps);
        self
    }

    /// Sets the final test-case count.
    #[must_use]
    pub fn with_test_case_count(mut self, count: usize) -> Self {
        self.test_case_count = Some(count);
        self
    }

    /// Sets the artifact directory.
    #[must_use]
    pub fn with_artifacts_path(mut self, path: PathBuf) -> Self {
        self.artifacts_path = Some(Some(path));
        self
    }

    /// Clears the artifact directory.
    #[must_use]
    pub fn clear_artifacts_path(mut self) -> Self {
        self.artifacts_path = Some(None);
        self
    }

    /// Sets the failure description.
    #[must_use]
    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(Some(message.into()));
        self
    }

    /// Clears the failure description.
    #[must_use]
    pub fn clear_error(mut self) -> Self {
        self.error_message = Some(None);
        self
    }

    /// Merges the set fields into the given run state.
    pub fn apply(self, run: &mut RunState) {
        if let Some(status) = self.status {
            run.status = status;
        }
        if let Some(stage) = self.current_stage {
            run.current_stage = stage;
        }
        if let Some(progress) = self.progress {
            run.progress = progress;
        }
        if let Some(completed_at) = self.completed_at {
            run.completed_at = completed_at;
        }
        if let Some(file_size) = self.file_size {
            run.file_size = Some(file_size);
        }
        if let Some(raw_text) = self.raw_text {
            run.raw_text = Some(raw_text);
        }
        if let Some(chunks) = self.chunks {
            run.chunks = chunks;
        }
        if let Some(summary) = self.features_summary {
            run.features_summary = Some(summary);
        }
        if let Some(cases) = self.test_cases {
            run.test_cases = cases;
        }
        if let Some(issues) = self.validation_issues {
            run.validation_issues = issues;
        }
        if let Some(gaps) = self.coverage_gaps {
            run.coverage_gaps = gaps;
        }
        if let Some(count) = self.test_case_count {
            run.test_case_count = count;
        }
        if let Some(path) = self.artifacts_path {
            run.artifacts_path = path;
        }
        if let Some(message) = self.error_message {
            run.error_message = message;
        }
    }
}
