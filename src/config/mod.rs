//! Configuration handling for Mixture
//!
//! Parses `mixture.toml` project files and carries the per-build flags.

mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MixError, Result};

pub use schema::*;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Project metadata
    pub project: ProjectConfig,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Chunk classification settings
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Extra transpiler options, merged over the defaults
    #[serde(default)]
    pub babel: Option<toml::Table>,

    /// Script entries
    #[serde(default)]
    pub scripts: Vec<EntryConfig>,

    /// Style entries, each emitted as its own stylesheet
    #[serde(default)]
    pub styles: Vec<EntryConfig>,

    /// Root directory (computed from config file location)
    #[serde(skip)]
    pub root: PathBuf,
}

impl Config {
    /// Load configuration from a file path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let canonical_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|e| {
                    MixError::Config(format!("cannot determine working directory: {}", e))
                })?
                .join(path)
        };

        let content = fs::read_to_string(&canonical_path).map_err(|e| {
            MixError::Config(format!("failed to read {}: {}", canonical_path.display(), e))
        })?;

        let root = canonical_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        Self::from_toml(&content, root)
    }

    /// Parse configuration text, resolving paths against `root`
    pub fn from_toml(content: &str, root: PathBuf) -> Result<Self> {
        let mut config: Config = toml::from_str(content)
            .map_err(|e| MixError::Config(format!("failed to parse mixture.toml: {}", e)))?;
        config.root = root;

        config.validate()?;

        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            project: ProjectConfig {
                name: "my-site".to_string(),
                prefix: String::new(),
            },
            output: OutputConfig::default(),
            classifier: ClassifierConfig::default(),
            babel: None,
            scripts: vec![EntryConfig {
                file: "app.js".into(),
                name: Some("main".to_string()),
                output_dir: None,
                entry_dir: None,
            }],
            styles: Vec::new(),
            root: PathBuf::from("."),
        }
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.scripts.is_empty() && self.styles.is_empty() {
            return Err(MixError::Config(
                "at least one script or style entry must be specified in mixture.toml".to_string(),
            ));
        }

        for entry in self.scripts.iter().chain(&self.styles) {
            if entry.file.first().is_none() {
                return Err(MixError::Config(format!(
                    "entry '{}' lists no files",
                    entry.name.as_deref().unwrap_or("<unnamed>")
                )));
            }
        }

        let is_plain = |d: &String| !d.is_empty() && !d.contains('/') && !d.contains('\\');
        if !self.classifier.vendor_dirs.iter().all(is_plain) {
            return Err(MixError::Config(
                "classifier.vendor_dirs must be plain directory names".to_string(),
            ));
        }

        Ok(())
    }

    /// Transpiler options as JSON, if any were configured
    pub fn babel_options(&self) -> serde_json::Value {
        self.babel
            .as_ref()
            .and_then(|table| serde_json::to_value(table).ok())
            .unwrap_or_else(|| serde_json::Value::Object(Default::default()))
    }
}

/// Build-wide switches, resolved once before configuration generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildFlags {
    pub production: bool,
    pub versioning: bool,
}

impl BuildFlags {
    pub fn new(production: bool, versioning: bool) -> Self {
        Self { production, versioning }
    }

    /// Combine explicit switches with `NODE_ENV=production`
    pub fn resolve(production: bool, versioning: bool) -> Self {
        let node_env = std::env::var("NODE_ENV").unwrap_or_default();
        Self {
            production: production || node_env == "production",
            versioning,
        }
    }
}
