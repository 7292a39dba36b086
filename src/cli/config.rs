//! Config command implementation

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use super::{compose, FlagArgs};

/// Print the bundler configuration as JSON
#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(flatten)]
    pub flags: FlagArgs,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

impl ConfigCommand {
    pub async fn execute(&self, config_path: &str) -> Result<()> {
        let config = compose(config_path, &self.flags)?;
        let json = config
            .to_json_pretty()
            .context("Failed to serialize bundler configuration")?;

        match &self.out {
            Some(path) => fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?,
            None => println!("{}", json),
        }

        Ok(())
    }
}
