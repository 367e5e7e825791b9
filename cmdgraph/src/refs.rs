//! Reference listing for `cmdgraph refs`.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::core::extract::Extractor;
use crate::core::types::References;
use crate::io::config::ResolverConfig;

/// Direct references of the document at `path`, resolved with the aliases
/// and extraction switches of `cfg`.
///
/// `cfg` does not need to be valid for `resolve`; only its alias settings
/// are consulted.
pub fn document_refs(path: &Path, cfg: &ResolverConfig) -> Result<References> {
    let body =
        fs::read_to_string(path).with_context(|| format!("read document {}", path.display()))?;
    let aliases = cfg.alias_table().context("load alias table")?;
    let extractor = Extractor::new(&aliases, cfg.extract_options());
    Ok(extractor.extract(&body))
}

/// One line per reference: `command <id> <kind>` then `agent <id>`.
pub fn format_refs(refs: &References) -> String {
    let mut out = String::new();
    for command in &refs.commands {
        let _ = writeln!(out, "command {} {}", command.id, command.kind.as_str());
    }
    for agent in &refs.agents {
        let _ = writeln!(out, "agent {agent}");
    }
    out
}
