//! Build-phase hooks
//!
//! Work that must happen at a precise point of the host bundler's pipeline
//! (before the first module is read, after emission) is expressed as a
//! [`Plugin`]. The [`PluginManager`] runs every plugin's hook for a phase in
//! registration order and stops at the first failure.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;

/// Plugin hook context
pub struct PluginContext {
    /// Project root directory
    pub root: PathBuf,
}

/// Implement this to run code at a build phase
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Plugin name for logging and debugging
    fn name(&self) -> &str;

    /// Called before any module is processed
    async fn build_start(&self, _ctx: &PluginContext) -> Result<()> {
        Ok(())
    }

    /// Called after the bundler has emitted every asset
    async fn build_end(&self, _ctx: &PluginContext) -> Result<()> {
        Ok(())
    }
}

/// Plugin manager
pub struct PluginManager {
    plugins: Vec<Arc<dyn Plugin>>,
    context: PluginContext,
}

impl PluginManager {
    /// Create a new plugin manager
    pub fn new(root: PathBuf) -> Self {
        Self {
            plugins: Vec::new(),
            context: PluginContext { root },
        }
    }

    /// Register a plugin
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    /// Run build_start hooks
    pub async fn run_build_start(&self) -> Result<()> {
        debug!(
            "Running build_start for {} plugin(s) in {}",
            self.plugins.len(),
            self.context.root.display()
        );
        for plugin in &self.plugins {
            debug!("build_start: {}", plugin.name());
            plugin.build_start(&self.context).await?;
        }
        Ok(())
    }

    /// Run build_end hooks
    pub async fn run_build_end(&self) -> Result<()> {
        debug!(
            "Running build_end for {} plugin(s) in {}",
            self.plugins.len(),
            self.context.root.display()
        );
        for plugin in &self.plugins {
            debug!("build_end: {}", plugin.name());
            plugin.build_end(&self.context).await?;
        }
        Ok(())
    }
}
