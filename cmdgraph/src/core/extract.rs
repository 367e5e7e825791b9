//! Reference extraction from command documents.
//!
//! Edge syntax:
//!
//! - `/namespace:name` is an explicit command invocation. It must not follow a
//!   word character, `/`, `.`, `:` or `-`, which keeps URLs and file paths out.
//! - `` `namespace:name` `` (backticks, no slash) is a heuristic mention, only
//!   collected when the heuristic pass is enabled.
//! - `subagent_type: "name"` and `@agent-name` delegate to an agent.
//!
//! Extraction looks at one document only and never follows references.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::core::alias::AliasTable;
use crate::core::types::{AgentId, CommandRef, EdgeKind, References};

static EXPLICIT_COMMAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\w/.:-])/([A-Za-z0-9][\w-]*):([A-Za-z0-9][\w-]*)")
        .expect("explicit command pattern")
});

static HEURISTIC_COMMAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"`([A-Za-z][\w-]*):([A-Za-z][\w-]*)`").expect("heuristic command pattern")
});

static SUBAGENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"subagent_type\s*[:=]\s*["']?([A-Za-z0-9][\w-]*(?::[A-Za-z0-9][\w-]*)?)"#)
        .expect("subagent pattern")
});

static AGENT_MENTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\w@.-])@agent-([A-Za-z0-9][\w-]*(?::[A-Za-z0-9][\w-]*)?)")
        .expect("agent mention pattern")
});

/// Extraction switches taken from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Collect backtick mentions in addition to slash invocations.
    pub heuristic: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self { heuristic: true }
    }
}

/// Applies the edge syntax to document text, resolving namespaces on the way.
#[derive(Debug, Clone, Copy)]
pub struct Extractor<'a> {
    aliases: &'a AliasTable,
    options: ExtractOptions,
}

impl<'a> Extractor<'a> {
    pub fn new(aliases: &'a AliasTable, options: ExtractOptions) -> Self {
        Self { aliases, options }
    }

    /// Direct command and agent references of `text`, ordered by first
    /// occurrence and unique by canonical id.
    ///
    /// An id first seen through a heuristic mention and later invoked
    /// explicitly keeps its position and becomes explicit.
    pub fn extract(&self, text: &str) -> References {
        References {
            commands: self.extract_commands(text),
            agents: self.extract_agents(text),
        }
    }

    fn extract_commands(&self, text: &str) -> Vec<CommandRef> {
        let mut hits = self.command_hits(&EXPLICIT_COMMAND_RE, text, EdgeKind::Explicit);
        if self.options.heuristic {
            hits.extend(self.command_hits(&HEURISTIC_COMMAND_RE, text, EdgeKind::Heuristic));
        }
        hits.sort_by_key(|(offset, _)| *offset);

        let mut commands: Vec<CommandRef> = Vec::new();
        let mut index = HashMap::new();
        for (_, hit) in hits {
            match index.get(&hit.id) {
                Some(&pos) => {
                    let existing: &mut CommandRef = &mut commands[pos];
                    existing.kind = existing.kind.strongest(hit.kind);
                }
                None => {
                    index.insert(hit.id.clone(), commands.len());
                    commands.push(hit);
                }
            }
        }
        commands
    }

    fn command_hits(&self, re: &Regex, text: &str, kind: EdgeKind) -> Vec<(usize, CommandRef)> {
        re.captures_iter(text)
            .filter_map(|caps| {
                let namespace = caps.get(1)?;
                let name = caps.get(2)?;
                let id = self.aliases.command_id(namespace.as_str(), name.as_str());
                Some((namespace.start(), CommandRef { id, kind }))
            })
            .collect()
    }

    fn extract_agents(&self, text: &str) -> Vec<AgentId> {
        let mut hits: Vec<(usize, AgentId)> = [&*SUBAGENT_RE, &*AGENT_MENTION_RE]
            .into_iter()
            .flat_map(|re| re.captures_iter(text))
            .filter_map(|caps| {
                let agent = caps.get(1)?;
                Some((agent.start(), self.aliases.agent_id(agent.as_str())))
            })
            .collect();
        hits.sort_by_key(|(offset, _)| *offset);

        let mut seen = HashSet::new();
        hits.into_iter()
            .filter_map(|(_, agent)| seen.insert(agent.clone()).then_some(agent))
            .collect()
    }
}
