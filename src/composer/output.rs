//! The configuration object handed to the bundler

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::bundler::Classifier;
use crate::entry::EntryRegistry;
use crate::lifecycle::{CleanupPhase, CleanupSpec};
use crate::naming::{AssetKind, NamingTemplate};

use super::rules::ModuleRule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Production,
    Development,
}

/// Pipeline extensions, in the order the bundler should apply them
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "plugin", rename_all = "kebab-case")]
pub enum PluginSpec {
    /// Build progress reporting
    Progress,
    /// Artifact cleanup at its phase
    Clean(CleanupSpec),
    /// Write extracted styles using this template
    ExtractStyles { filename: NamingTemplate },
    /// Compile-time constants
    Environment { variables: BTreeMap<String, String> },
    /// Asset manifest
    Manifest { file_name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "minimizer", rename_all = "kebab-case")]
pub enum Minimizer {
    Script { parallel: bool },
    Style,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputSpec {
    /// Absolute output root
    pub path: PathBuf,
    pub public_path: String,
    /// Script chunk filename
    pub filename: NamingTemplate,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleSpec {
    pub rules: Vec<ModuleRule>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolveSpec {
    pub extensions: Vec<String>,
    pub alias: BTreeMap<String, PathBuf>,
    /// Node built-ins that must not be polyfilled for the browser
    pub fallback: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Optimization {
    pub runtime_chunk: String,
    /// Enforced chunk groups, in evaluation order
    pub split_chunks: Classifier,
    pub minimize: bool,
    pub minimizer: Vec<Minimizer>,
}

/// Everything the bundler needs for one build; immutable once composed
#[derive(Debug, Clone, Serialize)]
pub struct BundlerConfig {
    pub mode: Mode,
    pub output: OutputSpec,
    pub entry: EntryRegistry,
    pub module: ModuleSpec,
    pub devtool: String,
    pub resolve: ResolveSpec,
    pub plugins: Vec<PluginSpec>,
    pub optimization: Optimization,
    /// Output filename template per emitted asset kind
    pub filenames: BTreeMap<AssetKind, NamingTemplate>,
}

impl BundlerConfig {
    pub fn classifier(&self) -> &Classifier {
        &self.optimization.split_chunks
    }

    /// Output filename template for `kind`
    pub fn filename_for(&self, kind: AssetKind) -> Option<&NamingTemplate> {
        self.filenames.get(&kind)
    }

    /// Cleanup specs attached as plugins, in plugin order
    pub fn cleanup_specs(&self) -> Vec<CleanupSpec> {
        self.plugins
            .iter()
            .filter_map(|plugin| match plugin {
                PluginSpec::Clean(spec) => Some(spec.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn cleanup_specs_for(&self, phase: CleanupPhase) -> Vec<CleanupSpec> {
        self.cleanup_specs()
            .into_iter()
            .filter(|spec| spec.phase == phase)
            .collect()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
