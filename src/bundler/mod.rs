//! Bundler-facing build driver
//!
//! The host bundler owns module processing and emission. This module holds
//! what it needs from us while it runs: the module graph seam, the frozen
//! chunk classifier, and the phase hooks that run cleanup at the right time.

mod chunk;
mod graph;

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::composer::BundlerConfig;
use crate::error::Result;
use crate::lifecycle::CleanupPlugin;
use crate::plugins::PluginManager;
use crate::utils::format_duration;

pub use chunk::{
    Aggregation, Chunk, ChunkGroupRule, ChunkGroupTable, ChunkType, Classifier, RuleTest,
};
pub use graph::{
    Issuer, IssuerRecord, IssuerResolver, Module, ModuleGraph, ModuleId, ModuleKind, ModuleQuery,
    ModuleRecord, TieBreak, DEFAULT_MAX_ISSUER_DEPTH,
};

/// Pipeline points the host bundler signals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    /// Before the first module is read
    PreProcess,
    /// After every asset has been written
    PostEmit,
}

/// Result of a build pass
#[derive(Debug)]
pub struct BuildResult {
    /// Enforced chunks, by group name
    pub chunks: Vec<Chunk>,

    /// Modules left to the bundler's default chunking
    pub unassigned: Vec<ModuleId>,
}

/// Drives one build against a composed configuration
pub struct Bundler {
    /// Composed configuration
    config: Arc<BundlerConfig>,

    /// Phase hooks
    plugins: PluginManager,
}

impl Bundler {
    /// Create a bundler driver with the configuration's cleanup attached
    pub fn new(config: BundlerConfig) -> Self {
        let mut plugins = PluginManager::new(config.output.path.clone());
        plugins.register(Arc::new(CleanupPlugin::new(config.cleanup_specs())));

        Self {
            config: Arc::new(config),
            plugins,
        }
    }

    pub fn config(&self) -> &Arc<BundlerConfig> {
        &self.config
    }

    /// Run the hooks registered for `phase`
    pub async fn signal(&self, phase: BuildPhase) -> Result<()> {
        debug!("Build phase {:?}", phase);
        match phase {
            BuildPhase::PreProcess => self.plugins.run_build_start().await,
            BuildPhase::PostEmit => self.plugins.run_build_end().await,
        }
    }

    /// Run a build pass over an already-constructed module graph.
    ///
    /// Emission itself belongs to the host; between the two phase signals
    /// this only assigns every module to its chunk.
    pub async fn build<Q>(&self, graph: &Q, modules: &[ModuleId]) -> Result<BuildResult>
    where
        Q: ModuleQuery + Sync + ?Sized,
    {
        let start = Instant::now();

        info!("Cleaning stale outputs...");
        self.signal(BuildPhase::PreProcess).await?;

        info!("Classifying {} module(s)...", modules.len());
        let (chunks, unassigned) = self.config.classifier().partition(graph, modules);

        info!("Removing build byproducts...");
        self.signal(BuildPhase::PostEmit).await?;

        debug!("Build pass completed in {}", format_duration(start.elapsed()));

        Ok(BuildResult { chunks, unassigned })
    }
}
