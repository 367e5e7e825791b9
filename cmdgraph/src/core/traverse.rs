//! Bounded breadth-first traversal of the command reference graph.
//!
//! Each command is expanded at most once per run, at the shortest distance from
//! the phase's entry points. Expansion proceeds level by level, so the first
//! time a command is recorded is already its minimum depth and no subtree is
//! ever recomputed.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use crate::core::extract::Extractor;
use crate::core::types::{AgentId, CommandId, CommandRef, Document, EdgeKind, References};

/// Resolves canonical command ids to documents.
///
/// Implementations must be deterministic for the duration of a run.
pub trait DocumentSource {
    /// The document for `id`, or `None` when no search root provides it.
    fn locate(&self, id: &CommandId) -> Option<Document>;
}

/// Registry record for one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    /// Minimum depth at which the command was reached.
    pub depth: u32,
    pub found: bool,
    /// Strongest edge kind among edges reaching the command at `depth`.
    pub kind: EdgeKind,
    pub path: Option<PathBuf>,
}

/// Per-run table of `CommandId -> Visit`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitedRegistry {
    visits: HashMap<CommandId, Visit>,
}

impl VisitedRegistry {
    pub fn get(&self, id: &CommandId) -> Option<&Visit> {
        self.visits.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CommandId, &Visit)> {
        self.visits.iter()
    }

    pub fn len(&self) -> usize {
        self.visits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }

    /// Record `reference` at `depth` unless it is already known at an equal
    /// or smaller depth. Returns true when a new record was created.
    fn observe(&mut self, reference: &CommandRef, depth: u32) -> bool {
        match self.visits.get_mut(&reference.id) {
            Some(visit) if visit.depth <= depth => {
                if visit.depth == depth {
                    visit.kind = visit.kind.strongest(reference.kind);
                }
                false
            }
            _ => true,
        }
    }

    fn insert(&mut self, id: CommandId, visit: Visit) {
        self.visits.insert(id, visit);
    }
}

/// Everything a single phase traversal discovered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Traversal {
    pub registry: VisitedRegistry,
    /// Agents referenced by the root and expanded documents, in
    /// first-discovery order.
    pub agents: Vec<AgentId>,
}

/// Traverse from the references of a root document down to `max_depth`.
///
/// The root's commands are the depth-0 entry points and its agents come first
/// in the agent list, exactly as if it were an expanded document. Commands reached at `max_depth` are located, so their `found` flag is
/// accurate, but their own references are not followed. Unresolved commands
/// are recorded with `found = false` and have no children.
pub fn traverse<S: DocumentSource + ?Sized>(
    source: &S,
    extractor: &Extractor<'_>,
    root: &References,
    max_depth: u32,
) -> Traversal {
    let mut registry = VisitedRegistry::default();
    let mut agents = Vec::new();
    let mut seen_agents = HashSet::new();
    for agent in &root.agents {
        if seen_agents.insert(agent.clone()) {
            agents.push(agent.clone());
        }
    }

    let mut frontier: Vec<CommandRef> = root.commands.clone();
    let mut depth = 0u32;
    while !frontier.is_empty() {
        let mut next = Vec::new();
        for reference in frontier {
            if !registry.observe(&reference, depth) {
                continue;
            }

            let document = source.locate(&reference.id);
            registry.insert(
                reference.id.clone(),
                Visit {
                    depth,
                    found: document.is_some(),
                    kind: reference.kind,
                    path: document.as_ref().map(|doc| doc.path.clone()),
                },
            );

            let Some(document) = document else {
                continue;
            };
            if depth >= max_depth {
                continue;
            }

            let references = extractor.extract(&document.body);
            for agent in references.agents {
                if seen_agents.insert(agent.clone()) {
                    agents.push(agent);
                }
            }
            next.extend(references.commands);
        }
        frontier = next;
        depth += 1;
    }

    Traversal { registry, agents }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alias::AliasTable;
    use crate::core::extract::ExtractOptions;
    use crate::test_support::{MemorySource, cmd, explicit};

    fn run(source: &MemorySource, roots: &[&str], max_depth: u32) -> Traversal {
        let aliases = AliasTable::default();
        let extractor = Extractor::new(&aliases, ExtractOptions::default());
        let root = References {
            commands: roots.iter().map(|id| explicit(id)).collect(),
            agents: Vec::new(),
        };
        traverse(source, &extractor, &root, max_depth)
    }

    fn depth_of(traversal: &Traversal, id: &str) -> Option<u32> {
        traversal.registry.get(&cmd(id)).map(|visit| visit.depth)
    }

    #[test]
    fn linear_chain_records_missing_leaf() {
        let source = MemorySource::new().with("p:x", "Then run /p:y");
        let traversal = run(&source, &["p:x"], 5);

        let x = traversal.registry.get(&cmd("p:x")).expect("x");
        let y = traversal.registry.get(&cmd("p:y")).expect("y");
        assert_eq!((x.depth, x.found), (0, true));
        assert_eq!((y.depth, y.found), (1, false));
        assert_eq!(y.path, None);
        assert_eq!(traversal.registry.len(), 2);
    }

    #[test]
    fn diamond_expands_shared_child_once() {
        let source = MemorySource::new()
            .with("p:a", "/p:c")
            .with("p:b", "/p:c")
            .with("p:c", "/p:d")
            .with("p:d", "");
        let traversal = run(&source, &["p:a", "p:b"], 5);

        assert_eq!(depth_of(&traversal, "p:c"), Some(1));
        assert_eq!(depth_of(&traversal, "p:d"), Some(2));
        assert_eq!(source.locate_count(&cmd("p:c")), 1);
        assert_eq!(source.locate_count(&cmd("p:d")), 1);
    }

    #[test]
    fn shorter_path_wins_over_first_discovered_path() {
        let source = MemorySource::new()
            .with("p:x", "/p:b")
            .with("p:b", "/p:a")
            .with("p:a", "/p:leaf")
            .with("p:leaf", "");
        let traversal = run(&source, &["p:x", "p:a"], 5);

        assert_eq!(depth_of(&traversal, "p:a"), Some(0));
        assert_eq!(depth_of(&traversal, "p:b"), Some(1));
        assert_eq!(depth_of(&traversal, "p:leaf"), Some(1));
        assert_eq!(source.locate_count(&cmd("p:a")), 1);
    }

    #[test]
    fn cycle_terminates_with_minimal_depths() {
        let source = MemorySource::new()
            .with("p:a", "/p:b")
            .with("p:b", "/p:c")
            .with("p:c", "/p:a");
        let traversal = run(&source, &["p:a"], 5);

        assert_eq!(traversal.registry.len(), 3);
        assert_eq!(depth_of(&traversal, "p:a"), Some(0));
        assert_eq!(depth_of(&traversal, "p:b"), Some(1));
        assert_eq!(depth_of(&traversal, "p:c"), Some(2));
        assert_eq!(source.locate_count(&cmd("p:a")), 1);
    }

    #[test]
    fn self_reference_does_not_loop() {
        let source = MemorySource::new().with("p:a", "/p:a /p:b");
        let traversal = run(&source, &["p:a"], 5);
        assert_eq!(depth_of(&traversal, "p:a"), Some(0));
        assert_eq!(depth_of(&traversal, "p:b"), Some(1));
    }

    #[test]
    fn nodes_at_max_depth_are_located_but_not_expanded() {
        let source = MemorySource::new()
            .with("p:a", "/p:b subagent_type: \"alpha\"")
            .with("p:b", "/p:c subagent_type: \"beta\"")
            .with("p:c", "/p:d");
        let traversal = run(&source, &["p:a"], 1);

        let b = traversal.registry.get(&cmd("p:b")).expect("b");
        assert_eq!((b.depth, b.found), (1, true));
        assert_eq!(depth_of(&traversal, "p:c"), None);
        let agents: Vec<&str> = traversal.agents.iter().map(AgentId::as_str).collect();
        assert_eq!(agents, vec!["alpha"]);
    }

    #[test]
    fn equal_depth_explicit_edge_upgrades_heuristic_record() {
        let source = MemorySource::new()
            .with("p:a", "see `p:c`")
            .with("p:b", "run /p:c")
            .with("p:c", "");
        let traversal = run(&source, &["p:a", "p:b"], 5);

        let c = traversal.registry.get(&cmd("p:c")).expect("c");
        assert_eq!(c.depth, 1);
        assert_eq!(c.kind, EdgeKind::Explicit);
    }

    #[test]
    fn deeper_explicit_edge_keeps_heuristic_record() {
        let source = MemorySource::new()
            .with("p:a", "see `p:c` and /p:b")
            .with("p:b", "run /p:c")
            .with("p:c", "");
        let traversal = run(&source, &["p:a"], 5);

        let c = traversal.registry.get(&cmd("p:c")).expect("c");
        assert_eq!(c.depth, 1);
        assert_eq!(c.kind, EdgeKind::Heuristic);
    }

    #[test]
    fn agents_follow_discovery_order_across_documents() {
        let source = MemorySource::new()
            .with("p:a", "@agent-one /p:b")
            .with("p:b", "@agent-two @agent-one");
        let traversal = run(&source, &["p:a"], 5);
        let agents: Vec<&str> = traversal.agents.iter().map(AgentId::as_str).collect();
        assert_eq!(agents, vec!["one", "two"]);
    }

    #[test]
    fn root_agents_come_first_and_are_not_repeated() {
        let source = MemorySource::new().with("p:a", "@agent-two @agent-one");
        let aliases = AliasTable::default();
        let extractor = Extractor::new(&aliases, ExtractOptions::default());
        let root = extractor.extract("/p:a\nTask(subagent_type: \"one\")");

        let traversal = traverse(&source, &extractor, &root, 5);
        let agents: Vec<&str> = traversal.agents.iter().map(AgentId::as_str).collect();
        assert_eq!(agents, vec!["one", "two"]);
        assert_eq!(depth_of(&traversal, "p:a"), Some(0));
    }

    #[test]
    fn recorded_depths_match_reference_bfs_on_generated_graphs() {
        for seed in 1..=40u64 {
            let (source, adjacency) = MemorySource::generated(seed, 12, 3);
            let traversal = run(&source, &["g:n0", "g:n5"], 6);
            let expected = reference_depths(&adjacency, &["g:n0", "g:n5"], 6);

            assert_eq!(traversal.registry.len(), expected.len(), "seed {seed}");
            for (id, depth) in &expected {
                assert_eq!(depth_of(&traversal, id), Some(*depth), "seed {seed} id {id}");
            }
        }
    }

    /// Textbook BFS over the adjacency list, bounded the same way.
    fn reference_depths(
        adjacency: &HashMap<String, Vec<String>>,
        roots: &[&str],
        max_depth: u32,
    ) -> HashMap<String, u32> {
        let mut depths = HashMap::new();
        let mut queue = std::collections::VecDeque::new();
        for root in roots {
            if !depths.contains_key(*root) {
                depths.insert(root.to_string(), 0);
                queue.push_back(root.to_string());
            }
        }
        while let Some(node) = queue.pop_front() {
            let depth = depths[&node];
            if depth >= max_depth {
                continue;
            }
            for child in adjacency.get(&node).into_iter().flatten() {
                if !depths.contains_key(child) {
                    depths.insert(child.clone(), depth + 1);
                    queue.push_back(child.clone());
                }
            }
        }
        depths
    }
}
