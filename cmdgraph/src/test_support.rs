//! Test-only helpers: in-memory document sources, report builders, and
//! on-disk fixtures.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::core::traverse::DocumentSource;
use crate::core::types::{
    AgentId, CommandId, CommandRef, Document, EdgeKind, Entry, PhaseReport,
};

/// Parse `"namespace:name"` into a `CommandId` (panics on malformed input).
pub fn cmd(id: &str) -> CommandId {
    id.parse().expect("valid command id")
}

/// Explicit reference to `"namespace:name"`.
pub fn explicit(id: &str) -> CommandRef {
    CommandRef::explicit(cmd(id))
}

/// Deterministic report entry with explicit confidence.
pub fn entry(id: &str, depth: u32, found: bool) -> Entry {
    Entry {
        command: cmd(id),
        depth,
        found,
        confidence: EdgeKind::Explicit,
        path: found.then(|| format!("mem/{id}.md")),
    }
}

/// Phase report with `name = "Phase <id>"` and a consistent total.
pub fn phase_report(id: &str, entries: Vec<Entry>, agents: &[&str]) -> PhaseReport {
    PhaseReport {
        phase: id.to_string(),
        name: format!("Phase {id}"),
        total_commands: entries.len(),
        entries,
        agents: agents.iter().map(|a| AgentId(a.to_string())).collect(),
    }
}

/// In-memory `DocumentSource` that counts lookups per command.
#[derive(Debug, Default)]
pub struct MemorySource {
    documents: HashMap<CommandId, Arc<str>>,
    lookups: Mutex<HashMap<CommandId, usize>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document for `"namespace:name"`.
    pub fn with(mut self, id: &str, body: &str) -> Self {
        self.documents.insert(cmd(id), Arc::from(body));
        self
    }

    /// Number of times `id` was located.
    pub fn locate_count(&self, id: &CommandId) -> usize {
        self.lookups
            .lock()
            .expect("lookup lock")
            .get(id)
            .copied()
            .unwrap_or(0)
    }

    /// Pseudo-random graph over `g:n0..g:n{nodes-1}`.
    ///
    /// Roughly one node in five has no document, and some edges point past the
    /// last node, so unresolved references are always part of the mix. Returns
    /// the source plus the adjacency list of every node that has a document.
    pub fn generated(seed: u64, nodes: u64, fanout: u64) -> (Self, HashMap<String, Vec<String>>) {
        let mut state = seed;
        let mut next = move || {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            state >> 33
        };

        let mut source = Self::new();
        let mut adjacency = HashMap::new();
        for i in 0..nodes {
            if next() % 5 == 0 {
                continue;
            }
            let children: Vec<String> = (0..next() % (fanout + 1))
                .map(|_| format!("g:n{}", next() % (nodes + 2)))
                .collect();
            let body = children
                .iter()
                .map(|child| format!("Run /{child}."))
                .collect::<Vec<_>>()
                .join("\n");
            let id = format!("g:n{i}");
            source = source.with(&id, &body);
            adjacency.insert(id, children);
        }
        (source, adjacency)
    }
}

impl DocumentSource for MemorySource {
    fn locate(&self, id: &CommandId) -> Option<Document> {
        *self
            .lookups
            .lock()
            .expect("lookup lock")
            .entry(id.clone())
            .or_default() += 1;
        self.documents.get(id).map(|body| Document {
            path: PathBuf::from(format!("mem/{id}.md")),
            body: Arc::clone(body),
        })
    }
}

/// Temporary directory laid out like a real project: search roots containing
/// `{namespace}/commands/{name}.md` documents, phase files, and a config.
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir().context("create fixture dir")?,
        })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) -> Result<PathBuf> {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    /// Write the document for `id` under search root directory `root`.
    pub fn command(&self, root: &str, id: &str, body: &str) -> Result<PathBuf> {
        let id = cmd(id);
        self.write(
            &format!("{root}/{}/commands/{}.md", id.namespace, id.name),
            body,
        )
    }

    /// Write `cmdgraph.toml` at the fixture root.
    pub fn write_config(&self, contents: &str) -> Result<PathBuf> {
        self.write("cmdgraph.toml", contents)
    }
}
