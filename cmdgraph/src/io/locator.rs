//! Command lookup across ordered search roots.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::core::alias::AliasTable;
use crate::core::traverse::DocumentSource;
use crate::core::types::{CommandId, Document};
use crate::io::config::SearchRootConfig;

/// One base directory plus the layout of documents below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRoot {
    pub base: PathBuf,
    pub layout: String,
}

impl SearchRoot {
    /// Expected document path for `id` below this root.
    pub fn document_path(&self, id: &CommandId) -> PathBuf {
        let relative = self
            .layout
            .replace("{namespace}", &id.namespace)
            .replace("{name}", &id.name);
        self.base.join(relative)
    }
}

impl From<&SearchRootConfig> for SearchRoot {
    fn from(cfg: &SearchRootConfig) -> Self {
        Self {
            base: cfg.path.clone(),
            layout: cfg.layout.clone(),
        }
    }
}

/// Path-keyed document bodies, shared by every phase of a run.
///
/// Populated once per path and read many times. Two phases racing on the same
/// path both read identical content, so the second insert is a no-op.
#[derive(Debug, Default)]
pub struct DocumentCache {
    bodies: RwLock<HashMap<PathBuf, Arc<str>>>,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Body of `path`, reading it on first use.
    pub fn read(&self, path: &Path) -> Result<Arc<str>> {
        if let Some(body) = self
            .bodies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
        {
            return Ok(Arc::clone(body));
        }

        let contents =
            fs::read_to_string(path).with_context(|| format!("read document {}", path.display()))?;
        let mut bodies = self.bodies.write().unwrap_or_else(PoisonError::into_inner);
        let body = bodies
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::from(contents));
        Ok(Arc::clone(body))
    }

    pub fn len(&self) -> usize {
        self.bodies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolves `(namespace, name)` to a document: alias first, then roots in
/// configured order.
#[derive(Debug)]
pub struct CommandLocator {
    roots: Vec<SearchRoot>,
    aliases: AliasTable,
    cache: DocumentCache,
}

impl CommandLocator {
    pub fn new(roots: Vec<SearchRoot>, aliases: AliasTable) -> Self {
        Self {
            roots,
            aliases,
            cache: DocumentCache::new(),
        }
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    /// Locate `namespace:name`. `None` means no root holds it, which callers
    /// record as an unresolved node rather than an error.
    ///
    /// A document that exists but cannot be read is logged and treated as
    /// unresolved.
    pub fn locate_command(&self, namespace: &str, name: &str) -> Option<Document> {
        let id = self.aliases.command_id(namespace, name);
        for root in &self.roots {
            let path = root.document_path(&id);
            if !path.is_file() {
                continue;
            }
            match self.cache.read(&path) {
                Ok(body) => {
                    debug!(command = %id, path = %path.display(), "located");
                    return Some(Document { path, body });
                }
                Err(err) => {
                    warn!(command = %id, error = %format!("{err:#}"), "unreadable document");
                    return None;
                }
            }
        }
        debug!(command = %id, roots = self.roots.len(), "unresolved");
        None
    }
}

impl DocumentSource for CommandLocator {
    fn locate(&self, id: &CommandId) -> Option<Document> {
        self.locate_command(&id.namespace, &id.name)
    }
}
