//! Pipeline orchestration for Caseforge.
//!
//! This crate drives a run through the staged pipeline: analyze the
//! requirement chunks, generate candidate test cases, validate and repair
//! them, optionally audit coverage and fill gaps, then export artifacts,
//! writing status and progress back to the run registry at every stage
//! boundary.

pub mod branching;
pub mod error;
pub mod orchestrator;
pub mod parse;
pub mod service;

pub use branching::{audit_decision, gap_decision, AuditDecision, GapDecision};
pub use error::{PipelineError, Result};
pub use orchestrator::{FactoryResolver, ModelResolver, PipelineOrchestrator, PipelineOutcome};
pub use parse::{parse_case_array, try_parse_case_array, GenerationOutcome};
pub use service::PipelineService;
