//! Resolver configuration stored in `cmdgraph.toml`.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use tracing::debug;

use crate::core::alias::AliasTable;
use crate::core::extract::ExtractOptions;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "cmdgraph.toml";

/// Default document layout below a search root.
pub const DEFAULT_LAYOUT: &str = "{namespace}/commands/{name}.md";

/// Resolver configuration (TOML).
///
/// Relative paths are resolved against the directory holding the config file.
/// Missing fields default to sensible values; a config without search roots or
/// phases only becomes valid once CLI overrides supply them.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ResolverConfig {
    /// Depth at which traversal stops expanding (entry points are depth 0).
    pub max_depth: u32,

    /// Run phases on separate threads.
    pub parallel: bool,

    /// Also collect backtick-quoted `namespace:name` mentions.
    pub heuristic_references: bool,

    /// Optional JSON object of `raw namespace -> canonical namespace`.
    pub alias_file: Option<PathBuf>,

    /// Inline aliases; these override entries from `alias_file`.
    pub aliases: BTreeMap<String, String>,

    /// Searched in order; the first root holding a document wins.
    pub search_roots: Vec<SearchRootConfig>,

    /// Phase documents in declaration order.
    pub phases: Vec<PhaseConfig>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SearchRootConfig {
    pub path: PathBuf,

    /// Relative document path with `{namespace}` and `{name}` placeholders.
    #[serde(default = "default_layout")]
    pub layout: String,
}

impl SearchRootConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            layout: default_layout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PhaseConfig {
    pub id: String,

    /// Display name; falls back to the document's first heading.
    #[serde(default)]
    pub name: Option<String>,

    pub path: PathBuf,
}

fn default_layout() -> String {
    DEFAULT_LAYOUT.to_string()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            parallel: false,
            heuristic_references: true,
            alias_file: None,
            aliases: BTreeMap::new(),
            search_roots: Vec::new(),
            phases: Vec::new(),
        }
    }
}

impl ResolverConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(anyhow!("max_depth must be > 0"));
        }
        if self.search_roots.is_empty() {
            return Err(anyhow!("no search roots configured"));
        }
        for root in &self.search_roots {
            if root.path.as_os_str().is_empty() {
                return Err(anyhow!("search_roots: path must not be empty"));
            }
            if !root.layout.contains("{name}") {
                return Err(anyhow!(
                    "search_roots: layout '{}' must contain {{name}}",
                    root.layout
                ));
            }
        }
        if self.phases.is_empty() {
            return Err(anyhow!("no phases configured"));
        }
        let mut ids = HashSet::new();
        for phase in &self.phases {
            if phase.id.trim().is_empty() {
                return Err(anyhow!("phases: id must not be empty"));
            }
            if !ids.insert(phase.id.as_str()) {
                return Err(anyhow!("phases: duplicate id '{}'", phase.id));
            }
        }
        Ok(())
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            heuristic: self.heuristic_references,
        }
    }

    /// Resolve relative paths against `base`.
    fn rebase(mut self, base: &Path) -> Self {
        for root in &mut self.search_roots {
            root.path = base.join(&root.path);
        }
        for phase in &mut self.phases {
            phase.path = base.join(&phase.path);
        }
        self.alias_file = self.alias_file.map(|path| base.join(path));
        self
    }

    /// Build the alias table: `alias_file` entries first, inline entries on top.
    ///
    /// A missing or malformed alias file is an error.
    pub fn alias_table(&self) -> Result<AliasTable> {
        let mut entries = match &self.alias_file {
            Some(path) => load_alias_file(path)?,
            None => BTreeMap::new(),
        };
        entries.extend(self.aliases.clone());
        AliasTable::new(entries)
    }
}

/// Command-line adjustments applied on top of the file configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Extra search roots, appended after configured ones.
    pub roots: Vec<PathBuf>,
    /// Extra phase documents, appended with their file stem as id.
    pub phases: Vec<PathBuf>,
    pub max_depth: Option<u32>,
    pub parallel: bool,
    pub no_heuristic: bool,
}

/// Apply overrides to the base config and validate the result.
pub fn apply_overrides(
    mut base: ResolverConfig,
    overrides: &ConfigOverrides,
) -> Result<ResolverConfig> {
    base.search_roots
        .extend(overrides.roots.iter().cloned().map(SearchRootConfig::new));
    for path in &overrides.phases {
        let id = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow!("phase path has no file name: {}", path.display()))?;
        base.phases.push(PhaseConfig {
            id,
            name: None,
            path: path.clone(),
        });
    }
    if let Some(max_depth) = overrides.max_depth {
        base.max_depth = max_depth;
    }
    if overrides.parallel {
        base.parallel = true;
    }
    if overrides.no_heuristic {
        base.heuristic_references = false;
    }
    base.validate()?;
    Ok(base)
}

/// Load config from a TOML file, resolving relative paths against its directory.
///
/// If the file is missing, returns `ResolverConfig::default()`. The result is
/// not validated; call [`apply_overrides`] once CLI input is known.
pub fn load_config(path: &Path) -> Result<ResolverConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "config missing, using defaults");
        return Ok(ResolverConfig::default());
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ResolverConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    debug!(
        path = %path.display(),
        roots = cfg.search_roots.len(),
        phases = cfg.phases.len(),
        "config loaded"
    );
    Ok(cfg.rebase(base))
}

fn load_alias_file(path: &Path) -> Result<BTreeMap<String, String>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read alias file {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| {
        format!(
            "parse alias file {} (expected a JSON object of strings)",
            path.display()
        )
    })
}
