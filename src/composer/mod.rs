//! Configuration composition
//!
//! The bundler configuration is assembled from a base fragment (module
//! rules, default plugins, the vendor group) plus one fragment per
//! ingredient. Fragments only ever add: entries are merged with duplicate
//! detection, rules, plugins and chunk groups are appended in contribution
//! order.

mod ingredients;
mod output;
mod rules;

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::Value;
use tracing::{debug, info};

use crate::bundler::{ChunkGroupRule, ChunkGroupTable, IssuerResolver};
use crate::config::{BuildFlags, Config, EntryConfig};
use crate::entry::EntryRegistry;
use crate::error::Result;
use crate::lifecycle::CleanupSpec;
use crate::naming::{AssetKind, NamingStrategy, NamingTemplate};
use crate::utils::{join_slash, project_path};

pub use ingredients::{
    ScriptIngredient, StyleIngredient, SCRIPT_ENTRY_DIR, SCRIPT_OUTPUT_DIR, STYLE_ENTRY_DIR,
    STYLE_OUTPUT_DIR,
};
pub use output::{
    BundlerConfig, Minimizer, Mode, ModuleSpec, Optimization, OutputSpec, PluginSpec, ResolveSpec,
};
pub use rules::{
    asset_rules, merge_json, script_rule, style_rules, LoaderSpec, ModuleRule, RuleHandler,
    StyleLoaderOptions,
};

/// Vendor chunk group name
pub const VENDOR_GROUP: &str = "vendor";

/// Per-build facts every ingredient may depend on
#[derive(Debug, Clone)]
pub struct MixContext {
    /// Absolute project root; also the output root
    pub root: PathBuf,
    /// Prefix joined in front of every source and output directory
    pub prefix: String,
    pub flags: BuildFlags,
    pub naming: NamingStrategy,
}

impl MixContext {
    pub fn new(root: PathBuf, prefix: &str, flags: BuildFlags) -> Self {
        Self {
            root,
            prefix: prefix.to_string(),
            flags,
            naming: NamingStrategy::new(flags.versioning),
        }
    }

    /// Absolute path of a `/`-separated project-relative path
    pub fn absolute(&self, relative: &str) -> PathBuf {
        project_path(&self.root, relative)
    }

    /// Prefix-qualified logical path
    pub fn qualified(&self, relative: &str) -> String {
        join_slash([self.prefix.as_str(), relative])
    }
}

/// What one ingredient adds to the configuration
#[derive(Debug, Clone, Default)]
pub struct Fragment {
    pub entries: EntryRegistry,
    pub rules: Vec<ModuleRule>,
    pub plugins: Vec<PluginSpec>,
    pub cache_groups: ChunkGroupTable,
}

impl Fragment {
    /// Append `other` after this fragment's contributions
    pub fn merge(&mut self, other: Fragment) -> Result<()> {
        self.entries.merge(other.entries)?;
        self.rules.extend(other.rules);
        for plugin in other.plugins {
            if !self.plugins.contains(&plugin) {
                self.plugins.push(plugin);
            }
        }
        self.cache_groups.extend(other.cache_groups);
        Ok(())
    }
}

/// An independently contributed piece of configuration
pub trait Ingredient {
    /// Short label used in logs
    fn kind(&self) -> &str;

    fn contribute(&self, ctx: &MixContext) -> Result<Fragment>;
}

/// Settings that shape the base fragment
#[derive(Debug, Clone)]
pub struct ComposerSettings {
    pub public_path: String,
    pub manifest: String,
    pub emit_manifest: bool,
    pub runtime: String,
    pub vendor: String,
    pub vendor_dirs: Vec<String>,
    pub resolver: IssuerResolver,
    pub babel_options: Value,
}

impl Default for ComposerSettings {
    fn default() -> Self {
        Self::from_config(&Config::default_config())
    }
}

impl ComposerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            public_path: config.output.public_path.clone(),
            manifest: config.output.manifest.clone(),
            emit_manifest: config.output.emit_manifest,
            runtime: config.output.runtime.clone(),
            vendor: config.output.vendor.clone(),
            vendor_dirs: config.classifier.vendor_dirs.clone(),
            resolver: IssuerResolver::new(
                config.classifier.tie_break,
                config.classifier.max_issuer_depth,
            ),
            babel_options: config.babel_options(),
        }
    }
}

/// Builds one [`BundlerConfig`] per build invocation
pub struct Composer {
    ctx: MixContext,
    settings: ComposerSettings,
    fragment: Fragment,
}

impl Composer {
    pub fn new(ctx: MixContext, settings: ComposerSettings) -> Self {
        let fragment = base_fragment(&ctx, &settings);
        Self {
            ctx,
            settings,
            fragment,
        }
    }

    /// Composer seeded with every ingredient the project file declares
    pub fn from_config(config: &Config, flags: BuildFlags) -> Result<Self> {
        let ctx = MixContext::new(config.root.clone(), &config.project.prefix, flags);
        let mut composer = Self::new(ctx, ComposerSettings::from_config(config));

        for entry in &config.scripts {
            let mut ingredient = ScriptIngredient::new(entry.file.clone());
            apply_overrides(
                entry,
                &mut ingredient.name,
                &mut ingredient.output_dir,
                &mut ingredient.entry_dir,
            );
            composer.add(&ingredient)?;
        }
        for entry in &config.styles {
            let mut ingredient = StyleIngredient::new(entry.file.clone());
            apply_overrides(
                entry,
                &mut ingredient.name,
                &mut ingredient.output_dir,
                &mut ingredient.entry_dir,
            );
            composer.add(&ingredient)?;
        }

        Ok(composer)
    }

    pub fn context(&self) -> &MixContext {
        &self.ctx
    }

    /// Merge one ingredient's contribution
    pub fn add(&mut self, ingredient: &dyn Ingredient) -> Result<&mut Self> {
        let fragment = ingredient.contribute(&self.ctx)?;
        debug!(
            "Adding {} ingredient: {} entr(y/ies), {} rule(s), {} plugin(s), {} chunk group(s)",
            ingredient.kind(),
            fragment.entries.len(),
            fragment.rules.len(),
            fragment.plugins.len(),
            fragment.cache_groups.len()
        );
        self.fragment.merge(fragment)?;
        Ok(self)
    }

    /// Freeze the chunk groups and produce the final configuration
    pub fn finish(self) -> BundlerConfig {
        let Composer {
            ctx,
            settings,
            fragment,
        } = self;

        let production = ctx.flags.production;
        let filenames: BTreeMap<AssetKind, NamingTemplate> = AssetKind::ALL
            .into_iter()
            .map(|kind| (kind, ctx.naming.template(kind)))
            .collect();

        let config = BundlerConfig {
            mode: if production { Mode::Production } else { Mode::Development },
            output: OutputSpec {
                path: ctx.root.clone(),
                public_path: settings.public_path.clone(),
                filename: ctx.naming.template(AssetKind::Script),
            },
            entry: fragment.entries,
            module: ModuleSpec {
                rules: fragment.rules,
            },
            devtool: if production {
                "source-map".to_string()
            } else {
                "eval-cheap-module-source-map".to_string()
            },
            resolve: resolve_spec(&ctx),
            plugins: fragment.plugins,
            optimization: Optimization {
                runtime_chunk: ctx.qualified(&settings.runtime),
                split_chunks: fragment.cache_groups.freeze(settings.resolver),
                minimize: production,
                minimizer: vec![Minimizer::Script { parallel: true }, Minimizer::Style],
            },
            filenames,
        };

        info!(
            "Composed {} configuration: {} entries, {} chunk group(s), {} plugin(s)",
            if production { "production" } else { "development" },
            config.entry.len(),
            config.classifier().rules().len(),
            config.plugins.len()
        );

        config
    }
}

fn apply_overrides(
    entry: &EntryConfig,
    name: &mut Option<String>,
    output_dir: &mut String,
    entry_dir: &mut String,
) {
    if let Some(n) = &entry.name {
        *name = Some(n.clone());
    }
    if let Some(dir) = &entry.output_dir {
        *output_dir = dir.clone();
    }
    if let Some(dir) = &entry.entry_dir {
        *entry_dir = dir.clone();
    }
}

/// Rules, default plugins and the vendor group present in every build
fn base_fragment(ctx: &MixContext, settings: &ComposerSettings) -> Fragment {
    let script = ctx.naming.template(AssetKind::Script);
    let manifest = ctx.qualified(&settings.manifest);

    let mut rules = vec![script_rule(&settings.babel_options)];
    rules.extend(asset_rules(&ctx.naming));
    rules.extend(style_rules(StyleLoaderOptions {
        source_map: true,
        extract: true,
    }));

    let stale = vec![
        NamingTemplate::new(manifest.as_str()).glob_for(""),
        script.glob_for(&ctx.qualified(&settings.runtime)),
        script.glob_for(&ctx.qualified(&settings.vendor)),
    ];

    let mut plugins = vec![
        PluginSpec::Progress,
        PluginSpec::Clean(CleanupSpec::stale_outputs(ctx.root.clone(), stale)),
        PluginSpec::ExtractStyles {
            filename: ctx.naming.template(AssetKind::Style),
        },
        PluginSpec::Environment {
            variables: BTreeMap::from([(
                "NODE_ENV".to_string(),
                if ctx.flags.production { "production" } else { "development" }.to_string(),
            )]),
        },
    ];
    if settings.emit_manifest {
        plugins.push(PluginSpec::Manifest { file_name: manifest });
    }

    let mut cache_groups = ChunkGroupTable::new();
    cache_groups.push(ChunkGroupRule::vendor(VENDOR_GROUP, &settings.vendor_dirs));

    Fragment {
        entries: EntryRegistry::new(),
        rules,
        plugins,
        cache_groups,
    }
}

fn resolve_spec(ctx: &MixContext) -> ResolveSpec {
    let fallback = ["child_process", "dgram", "fs", "net", "setImmediate", "tls"]
        .into_iter()
        .map(|name| (name.to_string(), false))
        .collect();

    ResolveSpec {
        extensions: vec![".js".to_string(), ".json".to_string()],
        alias: BTreeMap::from([("@".to_string(), ctx.absolute(SCRIPT_ENTRY_DIR))]),
        fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MixError;
    use crate::lifecycle::{CleanupPhase, FileMatcher};
    use pretty_assertions::assert_eq;

    fn composer(flags: BuildFlags) -> Composer {
        Composer::new(
            MixContext::new(PathBuf::from("/srv/site"), "", flags),
            ComposerSettings::default(),
        )
    }

    #[test]
    fn test_base_configuration() {
        let config = composer(BuildFlags::new(false, false)).finish();

        assert_eq!(config.mode, Mode::Development);
        assert_eq!(config.devtool, "eval-cheap-module-source-map");
        assert_eq!(config.output.filename.as_str(), "[name].js");
        assert_eq!(config.optimization.runtime_chunk, "includes/js/runtime");
        assert!(!config.optimization.minimize);
        assert_eq!(config.classifier().rules().len(), 1);
        assert_eq!(config.classifier().rules()[0].name, VENDOR_GROUP);
        assert_eq!(config.module.rules.len(), 1 + 3 + 7);
        assert_eq!(config.resolve.alias["@"], PathBuf::from("/srv/site/resources/assets/js"));
        assert_eq!(config.resolve.fallback.len(), 6);
    }

    #[test]
    fn test_pre_build_globs_follow_versioning() {
        let plain = composer(BuildFlags::new(false, false)).finish();
        let hashed = composer(BuildFlags::new(true, true)).finish();

        let globs = |config: &BundlerConfig| {
            match &config.cleanup_specs_for(CleanupPhase::Pre)[0].matcher {
                FileMatcher::Glob(globs) => globs.clone(),
                other => panic!("unexpected matcher {:?}", other),
            }
        };

        assert_eq!(
            globs(&plain),
            vec!["manifest.json", "includes/js/runtime.js", "includes/js/vendor.js"]
        );
        assert_eq!(
            globs(&hashed),
            vec!["manifest.json", "includes/js/runtime.*.js", "includes/js/vendor.*.js"]
        );
    }

    #[test]
    fn test_production_flags() {
        let config = composer(BuildFlags::new(true, true)).finish();

        assert_eq!(config.mode, Mode::Production);
        assert_eq!(config.devtool, "source-map");
        assert!(config.optimization.minimize);
        assert!(config.plugins.contains(&PluginSpec::Environment {
            variables: BTreeMap::from([("NODE_ENV".to_string(), "production".to_string())]),
        }));
        for kind in AssetKind::ALL {
            assert!(config.filename_for(kind).unwrap().is_versioned());
        }
    }

    #[test]
    fn test_ingredients_append_without_clobbering() {
        let mut composer = composer(BuildFlags::default());
        composer
            .add(&ScriptIngredient::new("app.js").named("main"))
            .unwrap()
            .add(&StyleIngredient::new("home.css"))
            .unwrap()
            .add(&StyleIngredient::new("about.css"))
            .unwrap();
        let config = composer.finish();

        let chunks: Vec<&str> = config.entry.iter().map(|e| e.chunk.as_str()).collect();
        assert_eq!(chunks, vec!["includes/js/main", "includes/css/home", "includes/css/about"]);

        let groups: Vec<&str> =
            config.classifier().rules().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(groups, vec!["home", "about", "vendor"]);

        // both style ingredients share one output directory
        assert_eq!(config.cleanup_specs_for(CleanupPhase::Post).len(), 1);
        assert_eq!(config.cleanup_specs_for(CleanupPhase::Pre).len(), 2);
    }

    #[test]
    fn test_conflicting_entries_abort() {
        let mut composer = composer(BuildFlags::default());
        composer.add(&StyleIngredient::new("home.css")).unwrap();
        let err = composer
            .add(&StyleIngredient::new("home-v2.css").named("home"))
            .err()
            .unwrap();
        assert!(matches!(err, MixError::DuplicateEntry { .. }));
    }

    #[test]
    fn test_manifest_plugin_is_optional() {
        let mut settings = ComposerSettings::default();
        settings.emit_manifest = true;
        let config = Composer::new(
            MixContext::new(PathBuf::from("/srv/site"), "", BuildFlags::default()),
            settings,
        )
        .finish();

        assert!(config.plugins.contains(&PluginSpec::Manifest {
            file_name: "manifest.json".to_string()
        }));
    }

    #[test]
    fn test_prefix_qualifies_names() {
        let ctx = MixContext::new(PathBuf::from("/srv"), "site", BuildFlags::default());
        let mut composer = Composer::new(ctx, ComposerSettings::default());
        composer.add(&StyleIngredient::new("home.css")).unwrap();
        let config = composer.finish();

        assert!(config.entry.get("site/includes/css/home").is_some());
        assert_eq!(config.optimization.runtime_chunk, "site/includes/js/runtime");
        assert_eq!(
            config.cleanup_specs_for(CleanupPhase::Post)[0].root,
            PathBuf::from("/srv/site/includes/css")
        );
    }

    #[test]
    fn test_serializes_to_json() {
        let mut composer = composer(BuildFlags::new(false, true));
        composer.add(&StyleIngredient::new("home.css")).unwrap();
        let rendered = composer.finish().to_json_pretty().unwrap();
        let json: Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(json["mode"], "development");
        assert_eq!(json["output"]["filename"], "[name].[chunkhash].js");
        assert_eq!(json["entry"]["includes/css/home"], "./resources/assets/css/home.css");
        assert_eq!(json["optimization"]["splitChunks"][0]["name"], "home");
        assert_eq!(json["optimization"]["runtimeChunk"], "includes/js/runtime");
        assert_eq!(json["filenames"]["image"], "images/[name].[contenthash:7].[ext]");
        assert_eq!(json["plugins"][0]["plugin"], "progress");
        assert_eq!(json["plugins"][1]["plugin"], "clean");
        assert_eq!(json["plugins"][1]["phase"], "pre");
    }
}
