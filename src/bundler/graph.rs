//! Module graph data structures
//!
//! The host bundler owns the real module graph; the classifier only needs to
//! ask it three questions per module (kind, resource, issuers). [`ModuleQuery`]
//! is that seam, and [`ModuleGraph`] is an index-based arena implementing it.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MixError, Result};
use crate::naming::AssetKind;

/// Unique identifier for a module
pub type ModuleId = usize;

/// Default cap on issuer hops before giving up on finding an entry
pub const DEFAULT_MAX_ISSUER_DEPTH: usize = 256;

/// Kind tag the classifier cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    Style,
    Script,
    Asset,
}

impl ModuleKind {
    /// Determine module kind from file extension
    pub fn from_extension(ext: &str) -> Self {
        match AssetKind::from_extension(ext) {
            Some(AssetKind::Style) => ModuleKind::Style,
            Some(AssetKind::Image | AssetKind::Media | AssetKind::Font) => ModuleKind::Asset,
            // json, ts and friends are compiled into script chunks
            Some(AssetKind::Script) | None => ModuleKind::Script,
        }
    }

    /// Detect kind from a resource path, ignoring any query string
    pub fn detect(resource: &str) -> Self {
        let path = resource.split('?').next().unwrap_or(resource);
        let file = path.rsplit(&['/', '\\'][..]).next().unwrap_or(path);
        file.rsplit_once('.')
            .map(|(_, ext)| ModuleKind::from_extension(ext))
            .unwrap_or(ModuleKind::Script)
    }
}

/// The thing that caused a module to be included
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Issuer {
    /// A named entry point; the top of every issuer chain
    Entry(String),
    /// Another module
    Module(ModuleId),
}

/// A module in the dependency graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Resource path as reported by the bundler
    pub resource: String,

    pub kind: ModuleKind,

    /// Issuer edges in the order they were recorded
    pub issuers: Vec<Issuer>,
}

/// Read-only view of the bundler's module graph
pub trait ModuleQuery {
    fn kind(&self, id: ModuleId) -> Option<ModuleKind>;

    fn resource(&self, id: ModuleId) -> Option<&str>;

    fn issuers(&self, id: ModuleId) -> &[Issuer];
}

/// The module dependency graph
#[derive(Debug, Default, Clone)]
pub struct ModuleGraph {
    /// All modules, indexed by their ID
    modules: Vec<Module>,

    /// Map from resource to module ID
    resource_to_id: HashMap<String, ModuleId>,
}

impl ModuleGraph {
    /// Create a new empty module graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module to the graph, returning the existing ID for known resources
    pub fn add_module(&mut self, resource: &str, kind: ModuleKind) -> ModuleId {
        if let Some(&id) = self.resource_to_id.get(resource) {
            return id;
        }

        let id = self.modules.len();
        self.modules.push(Module {
            resource: resource.to_string(),
            kind,
            issuers: Vec::new(),
        });
        self.resource_to_id.insert(resource.to_string(), id);

        id
    }

    /// Record that `issuer` included module `id`; repeated edges are ignored
    pub fn add_issuer(&mut self, id: ModuleId, issuer: Issuer) {
        if let Some(module) = self.modules.get_mut(id) {
            if !module.issuers.contains(&issuer) {
                module.issuers.push(issuer);
            }
        }
    }

    /// Get module ID from resource
    pub fn get_module_id(&self, resource: &str) -> Option<ModuleId> {
        self.resource_to_id.get(resource).copied()
    }

    /// Get a module by ID
    pub fn get_module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(id)
    }

    /// Get all module IDs
    pub fn all_module_ids(&self) -> Vec<ModuleId> {
        (0..self.modules.len()).collect()
    }

    /// Total number of modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if graph is empty
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Build a graph from serialized module records.
    ///
    /// Module issuers refer to other records by resource, so they may be
    /// listed in any order. Kinds default to detection from the extension.
    pub fn from_records(records: &[ModuleRecord]) -> Result<Self> {
        let mut graph = ModuleGraph::new();

        for record in records {
            let kind = record.kind.unwrap_or_else(|| ModuleKind::detect(&record.resource));
            graph.add_module(&record.resource, kind);
        }

        for record in records {
            let id = graph.resource_to_id[&record.resource];
            for issuer in &record.issuers {
                let edge = match issuer {
                    IssuerRecord::Entry(chunk) => Issuer::Entry(chunk.clone()),
                    IssuerRecord::Module(resource) => {
                        let issuer_id = graph.get_module_id(resource).ok_or_else(|| {
                            MixError::Config(format!(
                                "module '{}' is issued by unknown module '{}'",
                                record.resource, resource
                            ))
                        })?;
                        Issuer::Module(issuer_id)
                    }
                };
                graph.add_issuer(id, edge);
            }
        }

        Ok(graph)
    }
}

impl ModuleQuery for ModuleGraph {
    fn kind(&self, id: ModuleId) -> Option<ModuleKind> {
        self.modules.get(id).map(|m| m.kind)
    }

    fn resource(&self, id: ModuleId) -> Option<&str> {
        self.modules.get(id).map(|m| m.resource.as_str())
    }

    fn issuers(&self, id: ModuleId) -> &[Issuer] {
        self.modules.get(id).map(|m| m.issuers.as_slice()).unwrap_or(&[])
    }
}

/// Serialized form of a module, as accepted by `mixture build`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub resource: String,

    #[serde(default)]
    pub kind: Option<ModuleKind>,

    #[serde(default)]
    pub issuers: Vec<IssuerRecord>,
}

/// Serialized issuer edge: `{"entry": "<chunk>"}` or `{"module": "<resource>"}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssuerRecord {
    Entry(String),
    Module(String),
}

/// Which issuer edge to follow when a module has several
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    /// The first edge recorded for the module
    #[default]
    InsertionOrder,
    /// Entry edges first (by name), then the lowest module ID
    LowestId,
}

/// Walks issuer edges upward until an entry boundary is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssuerResolver {
    pub tie_break: TieBreak,
    pub max_depth: usize,
}

impl Default for IssuerResolver {
    fn default() -> Self {
        Self {
            tie_break: TieBreak::default(),
            max_depth: DEFAULT_MAX_ISSUER_DEPTH,
        }
    }
}

impl IssuerResolver {
    pub fn new(tie_break: TieBreak, max_depth: usize) -> Self {
        Self { tie_break, max_depth }
    }

    /// The entry whose inclusion ultimately pulled in `id`.
    ///
    /// Returns `None` for modules without issuers, for cycles, and for chains
    /// longer than `max_depth`.
    pub fn resolve<'g, Q>(&self, graph: &'g Q, id: ModuleId) -> Option<&'g str>
    where
        Q: ModuleQuery + ?Sized,
    {
        let mut visited = HashSet::new();
        let mut current = id;

        for _ in 0..=self.max_depth {
            if !visited.insert(current) {
                debug!("Issuer cycle through module {}", current);
                return None;
            }

            match self.pick(graph.issuers(current))? {
                Issuer::Entry(chunk) => return Some(chunk.as_str()),
                Issuer::Module(next) => current = *next,
            }
        }

        debug!("Issuer chain of module {} exceeds {} hops", id, self.max_depth);
        None
    }

    fn pick<'a>(&self, issuers: &'a [Issuer]) -> Option<&'a Issuer> {
        match self.tie_break {
            TieBreak::InsertionOrder => issuers.first(),
            TieBreak::LowestId => issuers.iter().min(),
        }
    }
}
