//! Build command implementation

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tracing::info;

use crate::bundler::{Bundler, ModuleGraph, ModuleQuery, ModuleRecord};
use crate::utils::format_duration;

use super::{compose, FlagArgs};

/// Clean, classify a module graph, then remove byproducts
#[derive(Args, Debug)]
pub struct BuildCommand {
    #[command(flatten)]
    pub flags: FlagArgs,

    /// JSON module graph exported by the bundler
    #[arg(short, long)]
    pub graph: PathBuf,

    /// Fail when a module matches more than one chunk group
    #[arg(long)]
    pub strict: bool,
}

impl BuildCommand {
    pub async fn execute(&self, config_path: &str) -> Result<()> {
        let start = Instant::now();

        let config = compose(config_path, &self.flags)?;

        info!("Reading module graph from {}", self.graph.display());
        let content = fs::read_to_string(&self.graph)
            .with_context(|| format!("Failed to read module graph: {}", self.graph.display()))?;
        let records: Vec<ModuleRecord> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse module graph: {}", self.graph.display()))?;
        let graph = ModuleGraph::from_records(&records)?;
        let modules = graph.all_module_ids();

        if self.strict {
            config.classifier().check_exclusive(&graph, &modules)?;
        }

        eprintln!("{} Building {} module(s)...", "→".blue(), modules.len());

        let bundler = Bundler::new(config);
        let result = bundler.build(&graph, &modules).await?;

        eprintln!(
            "\n{} Assigned {} chunk group(s) in {}\n",
            "✓".green().bold(),
            result.chunks.len(),
            format_duration(start.elapsed())
        );

        for chunk in &result.chunks {
            eprintln!(
                "  {} {} {}",
                "•".dimmed(),
                chunk.name.cyan(),
                format!("{} module(s)", chunk.len()).dimmed()
            );
            for &id in &chunk.module_ids {
                eprintln!("      {}", graph.resource(id).unwrap_or_default().dimmed());
            }
        }

        if !result.unassigned.is_empty() {
            eprintln!(
                "  {} {} {}",
                "•".dimmed(),
                "default".yellow(),
                format!("{} module(s)", result.unassigned.len()).dimmed()
            );
        }

        eprintln!();

        Ok(())
    }
}
