//! Configuration schema definitions

use serde::{Deserialize, Serialize};

use crate::bundler::{TieBreak, DEFAULT_MAX_ISSUER_DEPTH};
use crate::entry::EntrySources;

/// Project metadata configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name
    pub name: String,

    /// Prefix joined in front of every source and output directory
    #[serde(default)]
    pub prefix: String,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Public URL prefix for assets
    #[serde(default = "default_public_path")]
    pub public_path: String,

    /// Manifest file name, relative to the output root
    #[serde(default = "default_manifest")]
    pub manifest: String,

    /// Emit the manifest at all
    #[serde(default)]
    pub emit_manifest: bool,

    /// Runtime chunk name, without extension
    #[serde(default = "default_runtime")]
    pub runtime: String,

    /// Vendor chunk name, without extension
    #[serde(default = "default_vendor")]
    pub vendor: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            public_path: default_public_path(),
            manifest: default_manifest(),
            emit_manifest: false,
            runtime: default_runtime(),
            vendor: default_vendor(),
        }
    }
}

fn default_public_path() -> String {
    "/".to_string()
}

fn default_manifest() -> String {
    "manifest.json".to_string()
}

fn default_runtime() -> String {
    "includes/js/runtime".to_string()
}

fn default_vendor() -> String {
    "includes/js/vendor".to_string()
}

/// Chunk classification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Directory names that mark third-party code
    #[serde(default = "default_vendor_dirs")]
    pub vendor_dirs: Vec<String>,

    /// Which issuer to follow when a module has several
    #[serde(default)]
    pub tie_break: TieBreak,

    /// Issuer hops before a module counts as unowned
    #[serde(default = "default_max_issuer_depth")]
    pub max_issuer_depth: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            vendor_dirs: default_vendor_dirs(),
            tie_break: TieBreak::default(),
            max_issuer_depth: default_max_issuer_depth(),
        }
    }
}

fn default_vendor_dirs() -> Vec<String> {
    vec!["node_modules".to_string()]
}

fn default_max_issuer_depth() -> usize {
    DEFAULT_MAX_ISSUER_DEPTH
}

/// A script or style entry declared in the project file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryConfig {
    /// Source file, or list of files, relative to the entry directory
    pub file: EntrySources,

    /// Chunk name; defaults to the first file's stem
    #[serde(default)]
    pub name: Option<String>,

    /// Override the output directory
    #[serde(default)]
    pub output_dir: Option<String>,

    /// Override the source directory
    #[serde(default)]
    pub entry_dir: Option<String>,
}
