//! Entry point registry
//!
//! Maps fully-qualified chunk identifiers (`includes/css/home`) to the
//! source files the bundler starts from (`./resources/assets/css/home.css`).

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::error::{MixError, Result};
use crate::utils::join_slash;

/// One source path or an ordered list of them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntrySources {
    One(String),
    Many(Vec<String>),
}

impl EntrySources {
    pub fn paths(&self) -> Vec<&str> {
        match self {
            EntrySources::One(path) => vec![path.as_str()],
            EntrySources::Many(paths) => paths.iter().map(String::as_str).collect(),
        }
    }

    /// First path, used to derive a default entry name
    pub fn first(&self) -> Option<&str> {
        self.paths().into_iter().next()
    }
}

impl From<&str> for EntrySources {
    fn from(path: &str) -> Self {
        EntrySources::One(path.to_string())
    }
}

impl From<String> for EntrySources {
    fn from(path: String) -> Self {
        EntrySources::One(path)
    }
}

impl From<Vec<String>> for EntrySources {
    fn from(paths: Vec<String>) -> Self {
        EntrySources::Many(paths)
    }
}

impl From<Vec<&str>> for EntrySources {
    fn from(paths: Vec<&str>) -> Self {
        EntrySources::Many(paths.into_iter().map(str::to_string).collect())
    }
}

/// Directories an entry is resolved against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDirs {
    /// Project prefix shared by sources and outputs
    pub prefix: String,
    /// Where the chunk is emitted, e.g. `includes/css/`
    pub output_dir: String,
    /// Where sources live, e.g. `resources/assets/css/`
    pub entry_dir: String,
}

impl EntryDirs {
    pub fn new(prefix: &str, output_dir: &str, entry_dir: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            output_dir: output_dir.to_string(),
            entry_dir: entry_dir.to_string(),
        }
    }

    /// Output directory joined with the prefix
    pub fn expanded_output_dir(&self) -> String {
        join_slash([self.prefix.as_str(), self.output_dir.as_str()])
    }
}

/// A registered entry point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Logical name, e.g. `home`
    pub name: String,
    /// Fully-qualified chunk identifier, e.g. `includes/css/home`
    pub chunk: String,
    /// Fully-qualified source references
    pub sources: Vec<String>,
    /// Whether the entry was declared with a list of sources
    multi: bool,
}

/// Insertion-ordered entry mapping handed to the bundler
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryRegistry {
    entries: Vec<Entry>,
}

impl EntryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` with its sources and return the stored entry
    pub fn register(
        &mut self,
        name: &str,
        sources: impl Into<EntrySources>,
        dirs: &EntryDirs,
    ) -> Result<&Entry> {
        let sources = sources.into();
        let paths = sources.paths();
        if paths.is_empty() {
            return Err(MixError::Config(format!("entry '{}' has no sources", name)));
        }

        let chunk = join_slash([dirs.expanded_output_dir().as_str(), name]);
        let qualified = paths
            .iter()
            .map(|path| {
                format!(
                    "./{}",
                    join_slash([dirs.prefix.as_str(), dirs.entry_dir.as_str(), path])
                )
            })
            .collect();

        self.insert(Entry {
            name: name.to_string(),
            chunk,
            sources: qualified,
            multi: matches!(sources, EntrySources::Many(_)),
        })
    }

    fn insert(&mut self, entry: Entry) -> Result<&Entry> {
        if let Some(idx) = self.entries.iter().position(|e| e.chunk == entry.chunk) {
            let existing = &self.entries[idx];
            if existing.sources != entry.sources {
                return Err(MixError::DuplicateEntry {
                    chunk: entry.chunk,
                    existing: existing.sources.clone(),
                    requested: entry.sources,
                });
            }
            debug!("Entry {} registered again with identical sources", entry.chunk);
            return Ok(&self.entries[idx]);
        }

        debug!("Registered entry {} -> {:?}", entry.chunk, entry.sources);
        let idx = self.entries.len();
        self.entries.push(entry);
        Ok(&self.entries[idx])
    }

    /// Fold another registry into this one, keeping this one's order first
    pub fn merge(&mut self, other: EntryRegistry) -> Result<()> {
        for entry in other.entries {
            self.insert(entry)?;
        }
        Ok(())
    }

    pub fn get(&self, chunk: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.chunk == chunk)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for EntryRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            if entry.multi {
                map.serialize_entry(&entry.chunk, &entry.sources)?;
            } else {
                map.serialize_entry(&entry.chunk, &entry.sources[0])?;
            }
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn css_dirs() -> EntryDirs {
        EntryDirs::new("", "includes/css/", "resources/assets/css/")
    }

    #[test]
    fn test_register_single_source() {
        let mut registry = EntryRegistry::new();
        let entry = registry.register("home", "home.css", &css_dirs()).unwrap();

        assert_eq!(entry.chunk, "includes/css/home");
        assert_eq!(entry.sources, vec!["./resources/assets/css/home.css"]);
    }

    #[test]
    fn test_register_multi_source_with_prefix() {
        let mut registry = EntryRegistry::new();
        let dirs = EntryDirs::new("site", "includes/js/", "resources/assets/js/");
        let entry = registry.register("app", vec!["a.js", "b.js"], &dirs).unwrap();

        assert_eq!(entry.chunk, "site/includes/js/app");
        assert_eq!(
            entry.sources,
            vec!["./site/resources/assets/js/a.js", "./site/resources/assets/js/b.js"]
        );
    }

    #[test]
    fn test_duplicate_with_different_sources_fails() {
        let mut registry = EntryRegistry::new();
        registry.register("home", "home.css", &css_dirs()).unwrap();

        let err = registry.register("home", "other.css", &css_dirs()).unwrap_err();
        assert!(matches!(
            err,
            MixError::DuplicateEntry { ref chunk, .. } if chunk == "includes/css/home"
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_identical_reregistration_is_noop() {
        let mut registry = EntryRegistry::new();
        registry.register("home", "home.css", &css_dirs()).unwrap();
        registry.register("home", "home.css", &css_dirs()).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_same_name_in_different_dirs_is_distinct() {
        let mut registry = EntryRegistry::new();
        registry.register("app", "app.css", &css_dirs()).unwrap();
        registry
            .register("app", "app.js", &EntryDirs::new("", "includes/js/", "resources/assets/js/"))
            .unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_empty_sources_rejected() {
        let mut registry = EntryRegistry::new();
        let err = registry.register("x", Vec::<String>::new(), &css_dirs()).unwrap_err();
        assert!(matches!(err, MixError::Config(_)));
    }

    #[test]
    fn test_serializes_as_ordered_map() {
        let mut registry = EntryRegistry::new();
        registry.register("home", "home.css", &css_dirs()).unwrap();
        registry.register("print", vec!["print.css"], &css_dirs()).unwrap();

        let json = serde_json::to_string(&registry).unwrap();
        assert_eq!(
            json,
            r#"{"includes/css/home":"./resources/assets/css/home.css","includes/css/print":["./resources/assets/css/print.css"]}"#
        );
    }
}
