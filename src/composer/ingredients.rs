//! Built-in ingredients

use crate::bundler::ChunkGroupRule;
use crate::entry::{EntryDirs, EntrySources};
use crate::error::{MixError, Result};
use crate::lifecycle::CleanupSpec;
use crate::utils::without_extension;

use super::output::PluginSpec;
use super::{Fragment, Ingredient, MixContext};

pub const SCRIPT_OUTPUT_DIR: &str = "includes/js/";
pub const SCRIPT_ENTRY_DIR: &str = "resources/assets/js/";
pub const STYLE_OUTPUT_DIR: &str = "includes/css/";
pub const STYLE_ENTRY_DIR: &str = "resources/assets/css/";

fn entry_name(name: &Option<String>, files: &EntrySources) -> Result<String> {
    match name {
        Some(name) => Ok(name.clone()),
        None => files
            .first()
            .map(without_extension)
            .ok_or_else(|| MixError::Config("entry lists no files".to_string())),
    }
}

/// A script entry point
#[derive(Debug, Clone)]
pub struct ScriptIngredient {
    pub files: EntrySources,
    pub name: Option<String>,
    pub output_dir: String,
    pub entry_dir: String,
}

impl ScriptIngredient {
    pub fn new(files: impl Into<EntrySources>) -> Self {
        Self {
            files: files.into(),
            name: None,
            output_dir: SCRIPT_OUTPUT_DIR.to_string(),
            entry_dir: SCRIPT_ENTRY_DIR.to_string(),
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }
}

impl Ingredient for ScriptIngredient {
    fn kind(&self) -> &str {
        "script"
    }

    fn contribute(&self, ctx: &MixContext) -> Result<Fragment> {
        let name = entry_name(&self.name, &self.files)?;
        let dirs = EntryDirs::new(&ctx.prefix, &self.output_dir, &self.entry_dir);

        let mut fragment = Fragment::default();
        fragment.entries.register(&name, self.files.clone(), &dirs)?;
        Ok(fragment)
    }
}

/// A stylesheet entry point emitted as its own file.
///
/// Besides the entry, it contributes the chunk group that keeps every style
/// module reached from this entry in its stylesheet, a pre-build wipe of
/// its output directory, and the post-build removal of the script files
/// style extraction leaves behind.
#[derive(Debug, Clone)]
pub struct StyleIngredient {
    pub files: EntrySources,
    pub name: Option<String>,
    pub output_dir: String,
    pub entry_dir: String,
}

impl StyleIngredient {
    pub fn new(files: impl Into<EntrySources>) -> Self {
        Self {
            files: files.into(),
            name: None,
            output_dir: STYLE_OUTPUT_DIR.to_string(),
            entry_dir: STYLE_ENTRY_DIR.to_string(),
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }
}

impl Ingredient for StyleIngredient {
    fn kind(&self) -> &str {
        "style"
    }

    fn contribute(&self, ctx: &MixContext) -> Result<Fragment> {
        let name = entry_name(&self.name, &self.files)?;
        let dirs = EntryDirs::new(&ctx.prefix, &self.output_dir, &self.entry_dir);
        let output_root = ctx.absolute(&dirs.expanded_output_dir());

        let mut fragment = Fragment::default();
        let chunk = fragment.entries.register(&name, self.files.clone(), &dirs)?.chunk.clone();
        fragment
            .cache_groups
            .push(ChunkGroupRule::style_owned_by(&name, &chunk));
        fragment
            .plugins
            .push(PluginSpec::Clean(CleanupSpec::byproducts(output_root.clone())));
        fragment
            .plugins
            .push(PluginSpec::Clean(CleanupSpec::wipe(output_root)));
        Ok(fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::RuleTest;
    use crate::config::BuildFlags;
    use crate::lifecycle::CleanupPhase;
    use std::path::PathBuf;

    fn ctx() -> MixContext {
        MixContext::new(PathBuf::from("/srv/site"), "", BuildFlags::default())
    }

    #[test]
    fn test_script_entry() {
        let fragment = ScriptIngredient::new("app.js").named("main").contribute(&ctx()).unwrap();
        let entry = fragment.entries.get("includes/js/main").unwrap();
        assert_eq!(entry.sources, vec!["./resources/assets/js/app.js"]);
        assert!(fragment.cache_groups.is_empty());
        assert!(fragment.plugins.is_empty());
    }

    #[test]
    fn test_style_contributions() {
        let fragment = StyleIngredient::new("home.css").contribute(&ctx()).unwrap();

        assert!(fragment.entries.get("includes/css/home").is_some());
        assert_eq!(
            fragment.cache_groups.rules()[0].test,
            RuleTest::StyleOwnedBy { entry: "includes/css/home".to_string() }
        );
        assert_eq!(fragment.cache_groups.rules()[0].name, "home");

        let phases: Vec<CleanupPhase> = fragment
            .plugins
            .iter()
            .filter_map(|p| match p {
                PluginSpec::Clean(spec) => Some(spec.phase),
                _ => None,
            })
            .collect();
        assert_eq!(phases, vec![CleanupPhase::Post, CleanupPhase::Pre]);

        let PluginSpec::Clean(spec) = &fragment.plugins[0] else {
            panic!("expected cleanup");
        };
        assert_eq!(spec.root, PathBuf::from("/srv/site").join("includes").join("css"));
    }

    #[test]
    fn test_style_name_from_first_file() {
        let fragment = StyleIngredient::new(vec!["print.scss", "extra.scss"])
            .contribute(&ctx())
            .unwrap();
        let entry = fragment.entries.get("includes/css/print").unwrap();
        assert_eq!(entry.sources.len(), 2);
    }
}
