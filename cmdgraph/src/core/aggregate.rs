//! Deterministic ordering of a finished traversal.

use crate::core::traverse::VisitedRegistry;
use crate::core::types::Entry;

/// Flatten a registry into entries sorted by `(depth, command)`.
///
/// The order is independent of visitation order, so identical inputs always
/// serialize to identical bytes.
pub fn aggregate(registry: &VisitedRegistry) -> Vec<Entry> {
    let mut entries: Vec<Entry> = registry
        .iter()
        .map(|(id, visit)| Entry {
            command: id.clone(),
            depth: visit.depth,
            found: visit.found,
            confidence: visit.kind,
            path: visit.path.as_ref().map(|path| path.display().to_string()),
        })
        .collect();
    entries.sort_by(|a, b| {
        a.depth
            .cmp(&b.depth)
            .then_with(|| a.command.cmp(&b.command))
    });
    entries
}
