//! Report verification for `cmdgraph check`.

use std::path::Path;

use anyhow::{Context, Result};

use crate::core::types::DependencyReport;
use crate::io::report_store::load_report;

/// Totals of a report that passed schema and invariant checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub phases: usize,
    pub commands: usize,
    pub unresolved: usize,
    pub agents: usize,
}

impl CheckOutcome {
    fn from_report(report: &DependencyReport) -> Self {
        Self {
            phases: report.summary.phase_count,
            commands: report.summary.total_commands,
            unresolved: report.summary.unresolved_commands,
            agents: report.summary.agents.len(),
        }
    }
}

/// Load the report at `path`; any schema or invariant violation is an error.
pub fn check_report(path: &Path) -> Result<CheckOutcome> {
    let report = load_report(path).with_context(|| format!("check {}", path.display()))?;
    Ok(CheckOutcome::from_report(&report))
}
