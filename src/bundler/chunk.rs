//! Chunk group classification
//!
//! Decides which enforced chunk group a module is emitted in, independent of
//! the bundler's size heuristics. Rules are plain data; the issuer walk they
//! need is passed in through [`IssuerResolver`].

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use super::graph::{IssuerResolver, ModuleId, ModuleKind, ModuleQuery};
use crate::error::{MixError, Result};

/// How matched modules are aggregated into a chunk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Always a separate chunk, whatever its size
    #[default]
    Enforce,
}

/// What a rule tests a module for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RuleTest {
    /// Style module whose issuer chain ends at `entry`
    StyleOwnedBy { entry: String },
    /// Non-style module living under one of `directories`
    Vendor { directories: Vec<String> },
}

/// A named chunk group and the test that selects its modules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkGroupRule {
    pub name: String,
    pub test: RuleTest,
    #[serde(default)]
    pub policy: Aggregation,
}

impl ChunkGroupRule {
    pub fn style_owned_by(name: &str, entry_chunk: &str) -> Self {
        Self {
            name: name.to_string(),
            test: RuleTest::StyleOwnedBy {
                entry: entry_chunk.to_string(),
            },
            policy: Aggregation::Enforce,
        }
    }

    pub fn vendor(name: &str, directories: &[String]) -> Self {
        Self {
            name: name.to_string(),
            test: RuleTest::Vendor {
                directories: directories.to_vec(),
            },
            policy: Aggregation::Enforce,
        }
    }

    /// Higher runs first; vendor is the catch-all
    pub fn priority(&self) -> i32 {
        match self.test {
            RuleTest::StyleOwnedBy { .. } => 0,
            RuleTest::Vendor { .. } => -10,
        }
    }

    pub fn matches<Q>(&self, graph: &Q, id: ModuleId, resolver: &IssuerResolver) -> bool
    where
        Q: ModuleQuery + ?Sized,
    {
        let Some(kind) = graph.kind(id) else {
            return false;
        };

        match &self.test {
            RuleTest::StyleOwnedBy { entry } => {
                kind == ModuleKind::Style && resolver.resolve(graph, id) == Some(entry.as_str())
            }
            RuleTest::Vendor { directories } => {
                kind != ModuleKind::Style
                    && graph
                        .resource(id)
                        .map(|resource| under_directory(resource, directories))
                        .unwrap_or(false)
            }
        }
    }
}

/// Whether any path component of `resource` is one of `directories`
fn under_directory(resource: &str, directories: &[String]) -> bool {
    resource
        .split(&['/', '\\'][..])
        .any(|component| directories.iter().any(|dir| dir == component))
}

/// Append-only rule table filled in while the configuration is composed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkGroupTable {
    rules: Vec<ChunkGroupRule>,
}

impl ChunkGroupTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule; an identical rule already present is not added twice
    pub fn push(&mut self, rule: ChunkGroupRule) {
        if !self.rules.contains(&rule) {
            self.rules.push(rule);
        }
    }

    pub fn extend(&mut self, other: ChunkGroupTable) {
        for rule in other.rules {
            self.push(rule);
        }
    }

    pub fn rules(&self) -> &[ChunkGroupRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Freeze the table into a shareable classifier
    pub fn freeze(&self, resolver: IssuerResolver) -> Classifier {
        let mut rules = self.rules.clone();
        // stable: contribution order is kept within a priority
        rules.sort_by_key(|rule| -rule.priority());
        Classifier {
            rules: rules.into(),
            resolver,
        }
    }
}

/// Kind of chunk a group produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkType {
    /// One entry's own stylesheet
    Dedicated,
    /// Modules shared across entries, e.g. vendor code
    Shared,
}

/// A group of modules that will be emitted together
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Chunk group name
    pub name: String,

    /// Type of chunk
    pub chunk_type: ChunkType,

    /// Module IDs included in this chunk
    pub module_ids: Vec<ModuleId>,
}

impl Chunk {
    /// Check if chunk is empty
    pub fn is_empty(&self) -> bool {
        self.module_ids.is_empty()
    }

    /// Number of modules in chunk
    pub fn len(&self) -> usize {
        self.module_ids.len()
    }
}

/// Frozen, ordered rule table; cheap to clone and safe to share across threads
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Arc<[ChunkGroupRule]>,
    resolver: IssuerResolver,
}

impl Classifier {
    /// Rules in evaluation order
    pub fn rules(&self) -> &[ChunkGroupRule] {
        &self.rules
    }

    pub fn resolver(&self) -> &IssuerResolver {
        &self.resolver
    }

    /// The group module `id` belongs to, or `None` for default chunking
    pub fn classify<Q>(&self, graph: &Q, id: ModuleId) -> Option<&str>
    where
        Q: ModuleQuery + ?Sized,
    {
        let group = self
            .rules
            .iter()
            .find(|rule| rule.matches(graph, id, &self.resolver))
            .map(|rule| rule.name.as_str());

        debug!(
            "Classified {} -> {}",
            graph.resource(id).unwrap_or("<unknown>"),
            group.unwrap_or("<default>")
        );

        group
    }

    /// Classify every listed module and gather the enforced chunks, by name
    pub fn group<Q>(&self, graph: &Q, ids: &[ModuleId]) -> Vec<Chunk>
    where
        Q: ModuleQuery + ?Sized,
    {
        self.partition(graph, ids).0
    }

    /// Enforced chunks plus the modules left to default chunking, from a
    /// single classification pass
    pub fn partition<Q>(&self, graph: &Q, ids: &[ModuleId]) -> (Vec<Chunk>, Vec<ModuleId>)
    where
        Q: ModuleQuery + ?Sized,
    {
        let mut grouped: BTreeMap<&str, Vec<ModuleId>> = BTreeMap::new();
        let mut unassigned = Vec::new();
        for &id in ids {
            match self.classify(graph, id) {
                Some(name) => grouped.entry(name).or_default().push(id),
                None => unassigned.push(id),
            }
        }

        let chunks = grouped
            .into_iter()
            .map(|(name, module_ids)| Chunk {
                name: name.to_string(),
                chunk_type: self.chunk_type(name),
                module_ids,
            })
            .collect();

        (chunks, unassigned)
    }

    fn chunk_type(&self, name: &str) -> ChunkType {
        match self.rules.iter().find(|r| r.name == name).map(|r| &r.test) {
            Some(RuleTest::StyleOwnedBy { .. }) => ChunkType::Dedicated,
            _ => ChunkType::Shared,
        }
    }

    /// Fail on the first listed module matched by more than one rule
    pub fn check_exclusive<Q>(&self, graph: &Q, ids: &[ModuleId]) -> Result<()>
    where
        Q: ModuleQuery + ?Sized,
    {
        for &id in ids {
            let groups: Vec<String> = self
                .rules
                .iter()
                .filter(|rule| rule.matches(graph, id, &self.resolver))
                .map(|rule| rule.name.clone())
                .collect();

            if groups.len() > 1 {
                return Err(MixError::ClassificationAmbiguity {
                    resource: graph.resource(id).unwrap_or_default().to_string(),
                    groups,
                });
            }
        }
        Ok(())
    }
}

impl Serialize for Classifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.rules.iter())
    }
}
