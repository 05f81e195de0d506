//! Settings for the pipeline and its collaborators.

use std::path::PathBuf;

use serde::Deserialize;

use crate::run::RunConfig;

/// Application settings.
///
/// Deserializable so a hosting layer can load it from a config file; every
/// field has a default so `Settings::default()` is always usable.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Root directory for per-run artifact output.
    #[serde(default = "default_artifacts_root")]
    pub artifacts_root: PathBuf,

    /// Default LLM provider for new runs.
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model ID for new runs.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default maximum number of generated test cases.
    #[serde(default = "default_max_cases")]
    pub max_cases: u32,

    /// Default JSON repair retry budget.
    #[serde(default = "default_repair_attempts")]
    pub repair_attempts: u32,

    /// Whether the coverage audit branch is enabled.
    #[serde(default = "default_true")]
    pub coverage_auditor_enabled: bool,

    /// Upper bound on a single completion call, in seconds.
    #[serde(default = "default_completion_timeout_secs")]
    pub completion_timeout_secs: u64,

    /// How many chunk analyses may be in flight at once.
    #[serde(default = "default_analyze_fanout")]
    pub analyze_fanout: usize,
}

fn default_artifacts_root() -> PathBuf {
    PathBuf::from("artifacts")
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini-2024-07-18".to_string()
}

fn default_max_cases() -> u32 {
    50
}

fn default_repair_attempts() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_completion_timeout_secs() -> u64 {
    120
}

fn default_analyze_fanout() -> usize {
    4
}

impl Settings {
    /// Builds the run configuration new runs start from.
    #[must_use]
    pub fn default_run_config(&self) -> RunConfig {
        RunConfig {
            llm_provider: self.default_provider.clone(),
            model_id: self.default_model.clone(),
            max_cases: self.max_cases,
            repair_attempts: self.repair_attempts,
            enable_coverage_auditor: self.coverage_auditor_enabled,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            artifacts_root: default_artifacts_root(),
            default_provider: default_provider(),
            default_model: default_model(),
            max_cases: default_max_cases(),
            repair_attempts: default_repair_attempts(),
            coverage_auditor_enabled: true,
            completion_timeout_secs: default_completion_timeout_secs(),
            analyze_fanout: default_analyze_fanout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.artifacts_root, PathBuf::from("artifacts"));
        assert_eq!(settings.default_provider, "openai");
        assert_eq!(settings.max_cases, 50);
        assert!(settings.coverage_auditor_enabled);
        assert_eq!(settings.completion_timeout_secs, 120);
    }

    #[test]
    fn test_default_run_config_mirrors_settings() {
        let settings = Settings { max_cases: 20, coverage_auditor_enabled: false, ..Settings::default() };
        let config = settings.default_run_config();
        assert_eq!(config.llm_provider, settings.default_provider);
        assert_eq!(config.model_id, settings.default_model);
        assert_eq!(config.max_cases, 20);
        assert!(!config.enable_coverage_auditor);
    }

    #[test]
    fn test_deserialize_partial() {
        let settings: Settings =
            serde_json::from_str(r#"{"coverage_auditor_enabled": false, "max_cases": 20}"#)
                .unwrap();
        assert!(!settings.coverage_auditor_enabled);
        assert_eq!(settings.max_cases, 20);
        // Unspecified fields fall back to defaults
        assert_eq!(settings.default_provider, "openai");
    }
}
