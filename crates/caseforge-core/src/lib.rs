//! Core domain types and leaf components for Caseforge.
//!
//! This crate holds everything the pipeline orchestrator builds on: the run
//! state machine and registry, the test-case schema and its validator, the
//! per-stage prompt templates, the artifact exporter, and settings.

pub mod config;
pub mod export;
pub mod prompts;
pub mod run;
pub mod store;
pub mod testcase;

pub use config::Settings;
pub use export::{build_traceability, ExportError, Exporter, TraceabilityEntry, LIST_SEPARATOR};
pub use run::{RunConfig, RunState, RunStatus, RunUpdate};
pub use store::RunStore;
pub use testcase::{highest_case_number, CaseType, Priority, TestCase, ValidationError};
