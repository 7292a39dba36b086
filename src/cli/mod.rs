//! Command-line interface for Mixture
//!
//! Provides the main CLI structure using clap with subcommands for:
//! - `config`: Print the composed bundler configuration
//! - `build`: Run cleanup and chunk classification around a module graph
//! - `clean`: Run one cleanup phase on its own
//! - `init`: Project scaffolding

mod build;
mod clean;
mod config;
mod init;

use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use crate::composer::{BundlerConfig, Composer};
use crate::config::{BuildFlags, Config};

pub use build::BuildCommand;
pub use clean::{CleanCommand, PhaseArg};
pub use config::ConfigCommand;
pub use init::InitCommand;

/// Mixture - bundler configuration with per-entry stylesheets and artifact cleanup
#[derive(Parser, Debug)]
#[command(name = "mixture")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to mixture.toml config file
    #[arg(short, long, global = true, default_value = "mixture.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the bundler configuration as JSON
    Config(ConfigCommand),

    /// Clean, classify a module graph, then remove byproducts
    Build(BuildCommand),

    /// Run a single cleanup phase
    Clean(CleanCommand),

    /// Initialize a new project
    Init(InitCommand),
}

/// Build-wide switches shared by every command that composes a configuration
#[derive(Args, Debug, Clone, Copy)]
pub struct FlagArgs {
    /// Production build (also enabled by NODE_ENV=production)
    #[arg(long, env = "MIX_PRODUCTION", value_parser = BoolishValueParser::new())]
    pub production: bool,

    /// Embed content hashes in output filenames
    #[arg(long, env = "MIX_VERSIONING", value_parser = BoolishValueParser::new())]
    pub versioning: bool,
}

impl FlagArgs {
    pub fn resolve(&self) -> BuildFlags {
        BuildFlags::resolve(self.production, self.versioning)
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Config(cmd) => cmd.execute(&self.config).await,
            Commands::Build(cmd) => {
                print_banner();
                cmd.execute(&self.config).await
            }
            Commands::Clean(cmd) => {
                print_banner();
                cmd.execute(&self.config).await
            }
            Commands::Init(cmd) => {
                print_banner();
                cmd.execute().await
            }
        }
    }
}

/// Load the project file and compose this build's configuration
pub(crate) fn compose(config_path: &str, flags: &FlagArgs) -> Result<BundlerConfig> {
    info!("Loading configuration from {}", config_path);
    let config = Config::load(config_path)
        .with_context(|| format!("Failed to load {}", config_path))?;

    let flags = flags.resolve();
    let composer = Composer::from_config(&config, flags)
        .context("Failed to compose bundler configuration")?;
    Ok(composer.finish())
}

/// Print the Mixture banner
fn print_banner() {
    eprintln!(
        "\n{} {} {}\n",
        "⚗".cyan(),
        "Mixture".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}
