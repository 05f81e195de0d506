//! Caller-facing service facade.
//!
//! Wires the run registry, orchestrator, and exporter together behind the
//! operations a hosting layer (HTTP, CLI) exposes: create a run, seed its
//! text, execute the pipeline, inspect, list, reset, and delete.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use caseforge_core::{Exporter, RunConfig, RunState, RunStatus, RunStore, RunUpdate, Settings};

use crate::error::Result;
use crate::orchestrator::{FactoryResolver, ModelResolver, PipelineOrchestrator, PipelineOutcome};

/// Facade over the pipeline and its run registry.
pub struct PipelineService {
    store: Arc<RunStore>,
    orchestrator: PipelineOrchestrator,
    exporter: Exporter,
    default_config: RunConfig,
}

impl PipelineService {
    /// Creates a service with the given settings and model resolver.
    #[must_use]
    pub fn new(settings: &Settings, resolver: Arc<dyn ModelResolver>) -> Self {
        let store = Arc::new(RunStore::new());
        let exporter = Exporter::new(settings.artifacts_root.clone());
        let orchestrator =
            PipelineOrchestrator::new(Arc::clone(&store), exporter.clone(), resolver)
                .with_completion_timeout(Duration::from_secs(settings.completion_timeout_secs))
                .with_analyze_fanout(settings.analyze_fanout);

        Self { store, orchestrator, exporter, default_config: settings.default_run_config() }
    }

    /// Creates a service backed by the model factory.
    #[must_use]
    pub fn with_defaults(settings: &Settings) -> Self {
        Self::new(settings, Arc::new(FactoryResolver))
    }

    /// Returns the underlying run registry.
    #[must_use]
    pub fn store(&self) -> &Arc<RunStore> {
        &self.store
    }

    /// Creates a new run for the given document.
    pub async fn create_run(&self, filename: &str, config: RunConfig) -> String {
        self.store.create(filename, config).await
    }

    /// Creates a new run with the configuration derived from settings.
    pub async fn create_run_with_defaults(&self, filename: &str) -> String {
        self.store.create(filename, self.default_config.clone()).await
    }

    /// Seeds a run with extracted text and chunks.
    ///
    /// Stands in for the ingestion collaborator: walks the run through
    /// Uploading and Reading, stores the text, and parks it back in Pending
    /// ready for orchestration.
    ///
    /// # Returns
    /// Returns `false` if the run does not exist.
    pub async fn ingest_text(
        &self,
        run_id: &str,
        raw_text: String,
        chunks: Vec<String>,
        file_size: u64,
    ) -> bool {
        if !self
            .store
            .update(run_id, RunUpdate::new().with_status(RunStatus::Uploading).with_progress(5))
            .await
        {
            return false;
        }
        self.store
            .update(
                run_id,
                RunUpdate::new()
                    .with_status(RunStatus::Reading)
                    .with_stage("requirement_reader")
                    .with_progress(10),
            )
            .await;
        self.store
            .update(
                run_id,
                RunUpdate::new()
                    .with_raw_text(raw_text)
                    .with_chunks(chunks)
                    .with_file_size(file_size)
                    .with_status(RunStatus::Pending),
            )
            .await
    }

    /// Executes the pipeline for a run.
    ///
    /// # Errors
    /// Returns `PipelineError::RunNotFound` for an unknown run; every other
    /// failure is reported through the returned outcome.
    pub async fn run_pipeline(&self, run_id: &str) -> Result<PipelineOutcome> {
        self.orchestrator.run_pipeline(run_id).await
    }

    /// Returns a snapshot of a run.
    pub async fn get_run(&self, run_id: &str) -> Option<RunState> {
        self.store.get(run_id).await
    }

    /// Lists runs, newest first.
    pub async fn list_runs(&self, limit: usize) -> Vec<RunState> {
        self.store.list(limit).await
    }

    /// Resets a run back to its initial state so the pipeline can be
    /// re-invoked from the first stage.
    ///
    /// # Returns
    /// Returns `false` if the run does not exist.
    pub async fn reset_run(&self, run_id: &str) -> bool {
        self.store
            .update(
                run_id,
                RunUpdate::new()
                    .with_status(RunStatus::Pending)
                    .clear_stage()
                    .with_progress(0)
                    .with_test_cases(Vec::new())
                    .with_validation_issues(Vec::new())
                    .with_coverage_gaps(Vec::new())
                    .with_test_case_count(0)
                    .clear_completed_at()
                    .clear_artifacts_path()
                    .clear_error(),
            )
            .await
    }

    /// Deletes a run and its exported artifacts.
    ///
    /// # Returns
    /// Returns `false` if the run does not exist.
    pub async fn delete_run(&self, run_id: &str) -> bool {
        let removed = self.store.delete(run_id).await;
        if removed {
            if let Err(err) = self.exporter.remove(run_id) {
                warn!(run_id = %run_id, error = %err, "Failed to remove artifact directory");
            }
        }
        removed
    }
}
