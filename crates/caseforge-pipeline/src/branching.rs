//! Branch decisions for the conditional pipeline edges.
//!
//! The audit and gap-fill stages are entered conditionally. The decisions
//! are pure functions over run fields so they can be tested without
//! executing any stage.

/// Validated-case count below which coverage is considered worth auditing.
const MIN_COMFORTABLE_COVERAGE: usize = 5;

/// Whether the coverage audit stage should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditDecision {
    /// Run the coverage audit.
    Audit,
    /// Skip straight to export.
    Export,
}

/// Decides whether to audit coverage.
///
/// The audit runs only when the feature is enabled for the run and the
/// validated set looks suspect: validation issues were recorded, or fewer
/// than five cases survived.
#[must_use]
pub fn audit_decision(
    auditor_enabled: bool,
    validation_issues: &[String],
    case_count: usize,
) -> AuditDecision {
    if !auditor_enabled {
        return AuditDecision::Export;
    }
    if !validation_issues.is_empty() || case_count < MIN_COMFORTABLE_COVERAGE {
        return AuditDecision::Audit;
    }
    AuditDecision::Export
}

/// Whether the gap-fill stage should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapDecision {
    /// Generate additional cases for the reported gaps.
    FillGaps,
    /// Skip straight to export.
    Export,
}

/// Decides whether to fill coverage gaps: only when the audit reported any.
#[must_use]
pub fn gap_decision(coverage_gaps: &[String]) -> GapDecision {
    if coverage_gaps.is_empty() {
        GapDecision::Export
    } else {
        GapDecision::FillGaps
    }
}
