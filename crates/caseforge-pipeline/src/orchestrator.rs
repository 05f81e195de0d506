//! The run-state-driven pipeline orchestrator.
//!
//! Sequences the stages of a run (analyze, generate, validate/repair,
//! coverage audit, gap fill, export) against the run registry. Each stage
//! boundary writes status, stage name, and progress back to the registry;
//! data-quality problems are absorbed as validation issues while
//! infrastructure faults fail the run.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use caseforge_abstraction::{ChatMessage, CompletionParams, Model, ModelError};
use caseforge_core::prompts;
use caseforge_core::{
    highest_case_number, Exporter, RunState, RunStatus, RunStore, RunUpdate, TestCase,
};
use caseforge_models::ModelFactory;

use crate::branching::{audit_decision, gap_decision, AuditDecision, GapDecision};
use crate::error::{PipelineError, Result};
use crate::parse::{parse_case_array, try_parse_case_array, GenerationOutcome};

/// Resolves a run's provider/model selection into a usable model instance.
pub trait ModelResolver: Send + Sync {
    /// Resolves a provider name and model ID.
    ///
    /// # Errors
    /// Returns a `ModelError` if the provider is unsupported or the model
    /// cannot be constructed.
    fn resolve(&self, provider: &str, model_id: &str)
        -> std::result::Result<Arc<dyn Model>, ModelError>;
}

/// Default resolver backed by the model factory.
#[derive(Debug, Clone, Copy, Default)]
pub struct FactoryResolver;

impl ModelResolver for FactoryResolver {
    fn resolve(
        &self,
        provider: &str,
        model_id: &str,
    ) -> std::result::Result<Arc<dyn Model>, ModelError> {
        ModelFactory::create_from_str(provider, model_id.to_string())
    }
}

/// Report returned to the caller once a pipeline invocation finishes.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    /// Final status: Completed or Failed.
    pub status: RunStatus,
    /// Number of validated test cases on the run.
    pub test_case_count: usize,
    /// Validation issues collected along the way.
    pub validation_issues: Vec<String>,
    /// Coverage gaps reported by the audit, if it ran.
    pub coverage_gaps: Vec<String>,
    /// Artifact directory, set on success.
    pub artifacts_path: Option<PathBuf>,
    /// Failure description, set when the run failed.
    pub error_message: Option<String>,
}

/// Orchestrator for the document-to-test-cases pipeline.
pub struct PipelineOrchestrator {
    /// Run registry; the single source of truth for run progress.
    store: Arc<RunStore>,
    /// Artifact writer.
    exporter: Exporter,
    /// Provider/model resolution.
    resolver: Arc<dyn ModelResolver>,
    /// Upper bound on a single completion call.
    completion_timeout: Duration,
    /// How many chunk analyses may be in flight at once.
    analyze_fanout: usize,
}

impl PipelineOrchestrator {
    /// Creates an orchestrator with default tuning (120s completion
    /// timeout, analyze fan-out of 4).
    #[must_use]
    pub fn new(store: Arc<RunStore>, exporter: Exporter, resolver: Arc<dyn ModelResolver>) -> Self {
        Self {
            store,
            exporter,
            resolver,
            completion_timeout: Duration::from_secs(120),
            analyze_fanout: 4,
        }
    }

    /// Overrides the completion timeout.
    #[must_use]
    pub fn with_completion_timeout(mut self, timeout: Duration) -> Self {
        self.completion_timeout = timeout;
        self
    }

    /// Overrides the analyze fan-out limit.
    #[must_use]
    pub fn with_analyze_fanout(mut self, fanout: usize) -> Self {
        self.analyze_fanout = fanout.max(1);
        self
    }

    /// Executes the pipeline for a run already holding chunked text.
    ///
    /// Business-level failures (malformed generation output, schema
    /// violations) never error; they are recorded on the run and in the
    /// returned outcome. Infrastructure faults mark the run Failed and are
    /// reported through the outcome as well.
    ///
    /// # Errors
    /// Returns `PipelineError::RunNotFound` only when the run does not
    /// exist at invocation time.
    pub async fn run_pipeline(&self, run_id: &str) -> Result<PipelineOutcome> {
        let run = self
            .store
            .get(run_id)
            .await
            .ok_or_else(|| PipelineError::RunNotFound(run_id.to_string()))?;

        match self.execute(run_id, &run).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                error!(run_id = %run_id, error = %err, "Pipeline failed");
                let message = err.to_string();
                self.store
                    .update(
                        run_id,
                        RunUpdate::new()
                            .with_status(RunStatus::Failed)
                            .with_error_message(message.clone()),
                    )
                    .await;
                Ok(PipelineOutcome {
                    status: RunStatus::Failed,
                    test_case_count: 0,
                    validation_issues: Vec::new(),
                    coverage_gaps: Vec::new(),
                    artifacts_path: None,
                    error_message: Some(message),
                })
            }
        }
    }

    async fn execute(&self, run_id: &str, run: &RunState) -> Result<PipelineOutcome> {
        let model =
            self.resolver.resolve(&run.config.llm_provider, &run.config.model_id)?;

        // Stage 1: feature analysis
        self.advance(run_id, RunStatus::Analyzing, "feature_analyzer", 25).await;
        let features_summary = self.analyze(model.as_ref(), &run.chunks).await?;
        self.store
            .update(run_id, RunUpdate::new().with_features_summary(features_summary.clone()))
            .await;

        // Stage 2: test-case generation
        self.advance(run_id, RunStatus::Generating, "test_generator", 50).await;
        let outcome =
            self.generate(model.as_ref(), &features_summary, run.config.max_cases).await?;

        // Stage 3: validation and repair
        self.advance(run_id, RunStatus::Validating, "validator", 70).await;
        let (mut cases, issues) =
            self.validate_or_repair(model.as_ref(), outcome, run.config.repair_attempts).await?;
        self.store
            .update(
                run_id,
                RunUpdate::new()
                    .with_test_cases(cases.clone())
                    .with_validation_issues(issues.clone()),
            )
            .await;

        // Stages 4 and 5: coverage audit and gap fill, conditionally
        let mut coverage_gaps = Vec::new();
        let decision =
            audit_decision(run.config.enable_coverage_auditor, &issues, cases.len());
        debug!(run_id = %run_id, decision = ?decision, "Coverage audit decision");

        if decision == AuditDecision::Audit {
            self.advance(run_id, RunStatus::Auditing, "coverage_auditor", 80).await;
            coverage_gaps = self.audit(model.as_ref(), &features_summary, &cases).await?;
            self.store
                .update(run_id, RunUpdate::new().with_coverage_gaps(coverage_gaps.clone()))
                .await;

            if gap_decision(&coverage_gaps) == GapDecision::FillGaps {
                self.advance(run_id, RunStatus::Generating, "gap_generator", 85).await;
                let additional = self.fill_gaps(model.as_ref(), &coverage_gaps, &cases).await?;
                cases.extend(additional);
                self.store
                    .update(run_id, RunUpdate::new().with_test_cases(cases.clone()))
                    .await;
            }
        }

        // Stage 6: export
        self.advance(run_id, RunStatus::Exporting, "formatter", 95).await;
        let artifacts_path = self.exporter.export(run_id, &cases)?;

        // Stage 7: complete
        self.store
            .update(
                run_id,
                RunUpdate::new()
                    .with_status(RunStatus::Completed)
                    .with_stage("formatter")
                    .with_progress(100)
                    .with_completed_at(Utc::now())
                    .with_test_case_count(cases.len())
                    .with_artifacts_path(artifacts_path.clone()),
            )
            .await;

        Ok(PipelineOutcome {
            status: RunStatus::Completed,
            test_case_count: cases.len(),
            validation_issues: issues,
            coverage_gaps,
            artifacts_path: Some(artifacts_path),
            error_message: None,
        })
    }

    /// Writes a stage boundary to the registry.
    ///
    /// A run deleted mid-flight makes the write a no-op; the pipeline keeps
    /// going and its remaining writes are dropped the same way.
    async fn advance(&self, run_id: &str, status: RunStatus, stage: &str, progress: u8) {
        let updated = self
            .store
            .update(
                run_id,
                RunUpdate::new().with_status(status).with_stage(stage).with_progress(progress),
            )
            .await;
        if !updated {
            debug!(run_id = %run_id, stage = %stage, "Run no longer in registry; update dropped");
        }
    }

    /// Requests one completion, bounded by the configured timeout.
    async fn complete(
        &self,
        model: &dyn Model,
        stage: &'static str,
        messages: Vec<ChatMessage>,
    ) -> Result<String> {
        let request = model.complete(&messages, Some(CompletionParams::default()));
        match tokio::time::timeout(self.completion_timeout, request).await {
            Ok(Ok(completion)) => Ok(completion.content.trim().to_string()),
            Ok(Err(err)) => {
                error!(stage = %stage, error = %err, "Completion failed");
                Err(err.into())
            }
            Err(_) => Err(PipelineError::StageTimeout {
                stage,
                secs: self.completion_timeout.as_secs(),
            }),
        }
    }

    /// Analyzes every chunk and combines the per-chunk feature analyses.
    ///
    /// Chunk analyses run concurrently up to the fan-out limit, but the
    /// combined summary always lists them in chunk order.
    async fn analyze(&self, model: &dyn Model, chunks: &[String]) -> Result<String> {
        let analyses: Vec<String> = stream::iter(chunks.iter().enumerate().map(|(i, chunk)| {
            let messages = vec![
                ChatMessage::system(prompts::analyzer_system()),
                ChatMessage::user(prompts::analyzer_user(chunk)),
            ];
            async move {
                let analysis = self.complete(model, "analyze", messages).await?;
                Ok::<String, PipelineError>(format!("--- Chunk {} Analysis ---\n{analysis}", i + 1))
            }
        }))
        .buffered(self.analyze_fanout)
        .try_collect()
        .await?;

        Ok(analyses.join("\n\n"))
    }

    /// Generates candidate test-case records from the feature summary.
    async fn generate(
        &self,
        model: &dyn Model,
        features_summary: &str,
        max_cases: u32,
    ) -> Result<GenerationOutcome> {
        let messages = vec![
            ChatMessage::system(prompts::generator_system()),
            ChatMessage::user(prompts::generator_user(features_summary, max_cases)),
        ];
        let response = self.complete(model, "generate", messages).await?;
        Ok(parse_case_array(&response))
    }

    /// Validates candidates, repairing unparsable generator output first.
    async fn validate_or_repair(
        &self,
        model: &dyn Model,
        outcome: GenerationOutcome,
        repair_attempts: u32,
    ) -> Result<(Vec<TestCase>, Vec<String>)> {
        let mut issues = Vec::new();

        let candidates = match outcome {
            GenerationOutcome::Parsed(items) => items,
            GenerationOutcome::Raw(raw) => {
                match self.repair(model, &raw, repair_attempts).await? {
                    Some(items) => {
                        issues.push("JSON was repaired by validator".to_string());
                        items
                    }
                    None => {
                        issues.push("Failed to repair JSON - invalid format".to_string());
                        Vec::new()
                    }
                }
            }
        };

        let mut validated = Vec::new();
        for (i, candidate) in candidates.iter().enumerate() {
            match TestCase::from_value(candidate) {
                Ok(case) => validated.push(case),
                Err(err) => {
                    issues.push(format!("Test case {} validation failed: {}", i + 1, err));
                }
            }
        }

        Ok((validated, issues))
    }

    /// Asks the model to repair unparsable output, up to the retry budget.
    ///
    /// A timeout inside the repair step consumes an attempt instead of
    /// failing the run, as long as budget remains.
    async fn repair(
        &self,
        model: &dyn Model,
        raw: &str,
        repair_attempts: u32,
    ) -> Result<Option<Vec<Value>>> {
        let budget = repair_attempts.max(1);

        for attempt in 1..=budget {
            let messages = vec![
                ChatMessage::system(prompts::repair_system()),
                ChatMessage::user(prompts::repair_user(raw)),
            ];
            match self.complete(model, "repair", messages).await {
                Ok(response) => {
                    if let Some(items) = try_parse_case_array(&response) {
                        return Ok(Some(items));
                    }
                    debug!(attempt, budget, "Repair response was not valid JSON");
                }
                Err(PipelineError::StageTimeout { .. }) if attempt < budget => {
                    warn!(attempt, budget, "Repair attempt timed out; retrying");
                }
                Err(err) => return Err(err),
            }
        }

        Ok(None)
    }

    /// Audits coverage, returning one gap description per non-blank line.
    async fn audit(
        &self,
        model: &dyn Model,
        features_summary: &str,
        cases: &[TestCase],
    ) -> Result<Vec<String>> {
        let cases_json = serde_json::to_string_pretty(cases)?;
        let messages = vec![
            ChatMessage::system(prompts::auditor_system()),
            ChatMessage::user(prompts::auditor_user(features_summary, &cases_json)),
        ];
        let response = self.complete(model, "audit", messages).await?;

        Ok(response
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }

    /// Generates cases for the reported gaps, continuing the ID sequence.
    ///
    /// Gap-fill additions are best effort: records that fail validation are
    /// discarded silently and an unparsable response contributes nothing.
    async fn fill_gaps(
        &self,
        model: &dyn Model,
        coverage_gaps: &[String],
        existing: &[TestCase],
    ) -> Result<Vec<TestCase>> {
        let highest = highest_case_number(existing);
        let messages = vec![
            ChatMessage::system(prompts::gap_system()),
            ChatMessage::user(prompts::gap_user(&coverage_gaps.join("\n"), highest)),
        ];
        let response = self.complete(model, "gap_fill", messages).await?;

        let Some(items) = try_parse_case_array(&response) else {
            debug!("Gap generator response was not valid JSON; skipping additions");
            return Ok(Vec::new());
        };

        Ok(items.iter().filter_map(|item| TestCase::from_value(item).ok()).collect())
    }
}
