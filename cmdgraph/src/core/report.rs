//! Assembly of per-phase and cross-phase reports.

use std::collections::HashSet;

use crate::core::aggregate::aggregate;
use crate::core::traverse::Traversal;
use crate::core::types::{DependencyReport, PhaseReport, Summary};

/// Build one phase's report from its traversal.
pub fn build_phase_report(phase: &str, name: &str, traversal: &Traversal) -> PhaseReport {
    let entries = aggregate(&traversal.registry);
    PhaseReport {
        phase: phase.to_string(),
        name: name.to_string(),
        total_commands: entries.len(),
        entries,
        agents: traversal.agents.clone(),
    }
}

/// Wrap phase reports, in declaration order, with a summary.
///
/// Summary agents are the union across phases in first-discovery order.
pub fn build_report(phases: Vec<PhaseReport>, generated_at: String) -> DependencyReport {
    let agents = {
        let mut seen = HashSet::new();
        phases
            .iter()
            .flat_map(|phase| phase.agents.iter())
            .filter(|agent| seen.insert(*agent))
            .cloned()
            .collect()
    };
    let summary = Summary {
        phase_count: phases.len(),
        agents,
        total_commands: phases.iter().map(|phase| phase.total_commands).sum(),
        unresolved_commands: phases
            .iter()
            .flat_map(|phase| phase.entries.iter())
            .filter(|entry| !entry.found)
            .count(),
    };
    DependencyReport {
        generated_at,
        summary,
        phases,
    }
}
