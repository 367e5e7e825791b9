//! Shared deterministic types for resolver core logic.
//!
//! These types define stable contracts between core components. They should not
//! depend on external state or I/O and must remain deterministic across runs.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

/// Canonical `(namespace, name)` identity of a command document.
///
/// The namespace is already alias-resolved. Ordering is `(namespace, name)`,
/// which is the secondary sort key of every report.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct CommandId {
    pub namespace: String,
    pub name: String,
}

impl CommandId {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)
    }
}

impl FromStr for CommandId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (namespace, name) = s
            .split_once(':')
            .ok_or_else(|| anyhow!("command id must be '<namespace>:<name>' (got '{s}')"))?;
        if namespace.is_empty() || name.is_empty() {
            return Err(anyhow!("command id has an empty part (got '{s}')"));
        }
        Ok(Self::new(namespace, name))
    }
}

impl From<CommandId> for String {
    fn from(id: CommandId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for CommandId {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Identifier of an agent a document delegates to. Agents are never traversed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a reference was recognised in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Canonical slash-command syntax (`/namespace:name`).
    Explicit,
    /// Fallback pass over looser mentions (`` `namespace:name` ``).
    Heuristic,
}

impl EdgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeKind::Explicit => "explicit",
            EdgeKind::Heuristic => "heuristic",
        }
    }

    /// The stronger of two kinds; `Explicit` wins.
    pub fn strongest(self, other: EdgeKind) -> EdgeKind {
        if self == EdgeKind::Explicit || other == EdgeKind::Explicit {
            EdgeKind::Explicit
        } else {
            EdgeKind::Heuristic
        }
    }
}

/// A command reference extracted from a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRef {
    pub id: CommandId,
    pub kind: EdgeKind,
}

impl CommandRef {
    pub fn explicit(id: CommandId) -> Self {
        Self {
            id,
            kind: EdgeKind::Explicit,
        }
    }

    pub fn heuristic(id: CommandId) -> Self {
        Self {
            id,
            kind: EdgeKind::Heuristic,
        }
    }
}

/// Direct references of a single document, de-duplicated in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct References {
    pub commands: Vec<CommandRef>,
    pub agents: Vec<AgentId>,
}

/// A resolved command document. The body is immutable for the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: PathBuf,
    pub body: Arc<str>,
}

/// One row of a phase report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub command: CommandId,
    pub depth: u32,
    pub found: bool,
    pub confidence: EdgeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Dependency report for one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseReport {
    pub phase: String,
    pub name: String,
    pub entries: Vec<Entry>,
    pub agents: Vec<AgentId>,
    pub total_commands: usize,
}

/// Cross-phase summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub phase_count: usize,
    pub agents: Vec<AgentId>,
    pub total_commands: usize,
    pub unresolved_commands: usize,
}

/// Final output: every phase in declaration order plus a summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyReport {
    pub generated_at: String,
    pub summary: Summary,
    pub phases: Vec<PhaseReport>,
}
