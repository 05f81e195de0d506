// Error types for pipeline orchestration

use caseforge_abstraction::ModelError;
use caseforge_core::ExportError;
use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Pipeline errors.
///
/// Only infrastructure faults live here; data-quality problems (malformed
/// JSON, schema violations) are absorbed into a run's validation issues and
/// never surface as errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The run does not exist in the registry
    #[error("run '{0}' not found")]
    RunNotFound(String),

    /// The LLM collaborator failed
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// A completion call exceeded its time budget
    #[error("{stage} stage timed out after {secs}s")]
    StageTimeout {
        /// Stage that was waiting on the completion
        stage: &'static str,
        /// Configured bound in seconds
        secs: u64,
    },

    /// Artifact export failed
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display_names_stage() {
        let err = PipelineError::StageTimeout { stage: "analyze", secs: 120 };
        assert_eq!(err.to_string(), "analyze stage timed out after 120s");
    }

    #[test]
    fn test_model_error_conversion() {
        let err: PipelineError = ModelError::Request("connection refused".to_string()).into();
        assert!(matches!(err, PipelineError::Model(_)));
        assert!(err.to_string().contains("connection refused"));
    }
}
