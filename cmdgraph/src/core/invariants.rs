//! Semantic report invariants not expressible via JSON Schema.

use std::collections::HashSet;

use crate::core::types::{AgentId, DependencyReport, Entry, PhaseReport};

/// Check semantic invariants not expressible in JSON Schema:
/// - No duplicate phase ids
/// - `summary.phaseCount` matches the number of phases
/// - Entries sorted by `(depth, command)`
/// - No duplicate commands within a phase
/// - `totalCommands` matches the number of entries
/// - No duplicate agents within a phase or in the summary
pub fn validate_report_invariants(report: &DependencyReport) -> Vec<String> {
    let mut errors = Vec::new();

    if report.summary.phase_count != report.phases.len() {
        errors.push(format!(
            "summary: phaseCount {} does not match {} phases",
            report.summary.phase_count,
            report.phases.len()
        ));
    }
    if let Some(agent) = first_duplicate(&report.summary.agents) {
        errors.push(format!("summary: duplicate agent '{agent}'"));
    }

    let mut phase_ids = HashSet::new();
    for phase in &report.phases {
        if !phase_ids.insert(phase.phase.as_str()) {
            errors.push(format!("duplicate phase id '{}'", phase.phase));
        }
        validate_phase(phase, &mut errors);
    }
    errors
}

fn validate_phase(phase: &PhaseReport, errors: &mut Vec<String>) {
    let label = &phase.phase;

    if phase.total_commands != phase.entries.len() {
        errors.push(format!(
            "{}: totalCommands {} does not match {} entries",
            label,
            phase.total_commands,
            phase.entries.len()
        ));
    }

    if !entries_sorted(&phase.entries) {
        errors.push(format!("{label}: entries must be sorted by (depth,command)"));
    }

    let mut seen = HashSet::new();
    for entry in &phase.entries {
        if !seen.insert(&entry.command) {
            errors.push(format!("{}: duplicate command '{}'", label, entry.command));
        }
    }

    if let Some(agent) = first_duplicate(&phase.agents) {
        errors.push(format!("{label}: duplicate agent '{agent}'"));
    }
}

/// True if entries are sorted by `(depth, command)` ascending.
fn entries_sorted(entries: &[Entry]) -> bool {
    entries.windows(2).all(|pair| {
        let left = &pair[0];
        let right = &pair[1];
        (left.depth, &left.command) <= (right.depth, &right.command)
    })
}

fn first_duplicate(agents: &[AgentId]) -> Option<&AgentId> {
    let mut seen = HashSet::new();
    agents.iter().find(|agent| !seen.insert(*agent))
}
