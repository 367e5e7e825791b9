//! Phase root documents.
//!
//! All phase documents are read before any traversal begins, so a missing
//! phase file aborts the run without partial output.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::debug;

use crate::io::config::PhaseConfig;

/// A phase root document, loaded and named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseDocument {
    pub id: String,
    pub name: String,
    pub path: PathBuf,
    pub body: String,
}

/// Read every configured phase document, in declaration order.
pub fn load_phases(phases: &[PhaseConfig]) -> Result<Vec<PhaseDocument>> {
    phases.iter().map(load_phase).collect()
}

fn load_phase(cfg: &PhaseConfig) -> Result<PhaseDocument> {
    if !cfg.path.is_file() {
        return Err(anyhow!(
            "phase '{}': missing file {}",
            cfg.id,
            cfg.path.display()
        ));
    }
    let body = fs::read_to_string(&cfg.path)
        .with_context(|| format!("phase '{}': read {}", cfg.id, cfg.path.display()))?;
    let name = match &cfg.name {
        Some(name) => name.clone(),
        None => first_heading(&body).unwrap_or_else(|| file_stem(&cfg.path)),
    };
    debug!(phase = %cfg.id, name = %name, path = %cfg.path.display(), "phase loaded");
    Ok(PhaseDocument {
        id: cfg.id.clone(),
        name,
        path: cfg.path.clone(),
        body,
    })
}

/// Text of the first `# ` heading, ignoring YAML frontmatter.
fn first_heading(contents: &str) -> Option<String> {
    strip_frontmatter(contents)
        .lines()
        .filter_map(|line| line.strip_prefix("# "))
        .map(str::trim)
        .find(|title| !title.is_empty())
        .map(str::to_string)
}

/// Body after a leading `---` fenced block. Accepts LF and CRLF line endings.
fn strip_frontmatter(contents: &str) -> &str {
    let mut lines = contents.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return contents;
    };
    if first.trim_end() != "---" {
        return contents;
    }
    let mut offset = first.len();
    for line in lines {
        offset += line.len();
        if line.trim_end() == "---" {
            return &contents[offset..];
        }
    }
    contents
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
