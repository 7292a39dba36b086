//! Clean command implementation

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;

use crate::lifecycle::{CleanupPhase, CleanupPlugin};
use crate::utils::relative_slash;

use super::{compose, FlagArgs};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseArg {
    /// Stale outputs of previous builds
    Pre,
    /// Byproducts of the last build
    Post,
}

impl From<PhaseArg> for CleanupPhase {
    fn from(phase: PhaseArg) -> Self {
        match phase {
            PhaseArg::Pre => CleanupPhase::Pre,
            PhaseArg::Post => CleanupPhase::Post,
        }
    }
}

/// Run a single cleanup phase
#[derive(Args, Debug)]
pub struct CleanCommand {
    #[command(flatten)]
    pub flags: FlagArgs,

    /// Which phase to run
    #[arg(long, value_enum, default_value = "pre")]
    pub phase: PhaseArg,

    /// List what would be removed without deleting anything
    #[arg(long)]
    pub dry_run: bool,
}

impl CleanCommand {
    pub async fn execute(&self, config_path: &str) -> Result<()> {
        let config = compose(config_path, &self.flags)?;
        let phase = CleanupPhase::from(self.phase);
        let root = config.output.path.clone();

        let removed = if self.dry_run {
            let mut candidates = Vec::new();
            for spec in config.cleanup_specs_for(phase) {
                candidates.extend(spec.candidates()?);
            }
            candidates
        } else {
            CleanupPlugin::new(config.cleanup_specs())
                .run_phase(phase)
                .context("Cleanup failed")?
        };

        let verb = if self.dry_run { "Would remove" } else { "Removed" };
        eprintln!("{} {} {} file(s)\n", "✓".green().bold(), verb, removed.len());
        for path in &removed {
            let shown = relative_slash(&root, path).unwrap_or_else(|| path.display().to_string());
            eprintln!("  {} {}", "•".dimmed(), shown.cyan());
        }

        Ok(())
    }
}
