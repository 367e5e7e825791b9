//! Namespace alias resolution.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Result, anyhow};

use crate::core::types::{AgentId, CommandId};

/// Read-only mapping from raw namespace to canonical namespace.
///
/// Chains are flattened on construction, so `resolve` is a single lookup and
/// can never loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    canonical: BTreeMap<String, String>,
}

impl AliasTable {
    /// Build a table from raw entries.
    ///
    /// Errors on empty keys or values and on alias cycles. Identity entries
    /// (`a = "a"`) are dropped.
    pub fn new(entries: BTreeMap<String, String>) -> Result<Self> {
        for (raw, target) in &entries {
            if raw.trim().is_empty() {
                return Err(anyhow!("alias table: empty alias name"));
            }
            if target.trim().is_empty() {
                return Err(anyhow!("alias table: alias '{raw}' has an empty target"));
            }
        }

        let mut canonical = BTreeMap::new();
        for raw in entries.keys() {
            let target = follow_chain(raw, &entries)?;
            if &target != raw {
                canonical.insert(raw.clone(), target);
            }
        }
        Ok(Self { canonical })
    }

    /// Canonical form of `namespace` (pass-through when no alias exists).
    pub fn resolve<'a>(&'a self, namespace: &'a str) -> &'a str {
        self.canonical
            .get(namespace)
            .map(String::as_str)
            .unwrap_or(namespace)
    }

    pub fn command_id(&self, namespace: &str, name: &str) -> CommandId {
        CommandId::new(self.resolve(namespace), name)
    }

    /// Resolve the namespace part of a `namespace:name` agent id.
    pub fn agent_id(&self, raw: &str) -> AgentId {
        match raw.split_once(':') {
            Some((namespace, name)) if !namespace.is_empty() && !name.is_empty() => {
                AgentId(format!("{}:{}", self.resolve(namespace), name))
            }
            _ => AgentId(raw.to_string()),
        }
    }

    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }
}

fn follow_chain(start: &str, entries: &BTreeMap<String, String>) -> Result<String> {
    let mut seen = BTreeSet::new();
    let mut current = start;
    while let Some(next) = entries.get(current) {
        if next == current {
            break;
        }
        if !seen.insert(current) {
            let cycle: Vec<&str> = seen.into_iter().collect();
            return Err(anyhow!(
                "alias table: cycle through '{}' ({})",
                start,
                cycle.join(", ")
            ));
        }
        current = next.as_str();
    }
    Ok(current.to_string())
}
