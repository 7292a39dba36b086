//! Output artifact cleanup
//!
//! Hashed filenames cannot be predicted from one build to the next, so the
//! bundler never overwrites the previous build's `runtime.<hash>.js`. Before a
//! build we remove everything the current naming templates could have
//! produced; after a build we remove the script byproducts that style
//! extraction leaves next to the stylesheets.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{MixError, Result};
use crate::plugins::{Plugin, PluginContext};
use crate::utils::{project_path, relative_slash};

/// Script files emitted next to extracted stylesheets
pub const BYPRODUCT_PATTERN: &str = r"\.js(\.map)?$";

/// When a cleanup runs relative to the bundler's build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanupPhase {
    Pre,
    Post,
}

/// Which files under a cleanup root are deleted.
///
/// Patterns are matched against the path relative to the root, with `/` as
/// the separator on every platform. Globs only look inside the directories
/// they name, a regex only looks at files directly under the root, and
/// `All` takes the whole tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "patterns", rename_all = "lowercase")]
pub enum FileMatcher {
    /// Any of these globs; `*` does not cross directories
    Glob(Vec<String>),
    /// Files directly under the root whose name matches
    Regex(String),
    /// Every file under the root
    All,
}

impl FileMatcher {
    fn compile(&self) -> Result<CompiledMatcher> {
        match self {
            FileMatcher::Glob(globs) => {
                let mut builder = GlobSetBuilder::new();
                for glob in globs {
                    let glob = GlobBuilder::new(glob)
                        .literal_separator(true)
                        .build()
                        .map_err(|e| MixError::InvalidPattern {
                            pattern: glob.clone(),
                            reason: e.to_string(),
                        })?;
                    builder.add(glob);
                }
                let set = builder.build().map_err(|e| MixError::InvalidPattern {
                    pattern: globs.join(", "),
                    reason: e.to_string(),
                })?;
                Ok(CompiledMatcher::Glob(set))
            }
            FileMatcher::Regex(pattern) => Regex::new(pattern)
                .map(CompiledMatcher::Regex)
                .map_err(|e| MixError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                }),
            FileMatcher::All => Ok(CompiledMatcher::All),
        }
    }

    /// Directories to walk, relative to the root, with their depth limit
    fn scopes(&self) -> BTreeMap<String, Option<usize>> {
        let mut scopes = BTreeMap::new();
        match self {
            FileMatcher::Glob(globs) => {
                for glob in globs {
                    let (dir, depth) = glob_scope(glob);
                    scopes
                        .entry(dir)
                        .and_modify(|d| *d = widest(*d, depth))
                        .or_insert(depth);
                }
            }
            FileMatcher::Regex(_) => {
                scopes.insert(String::new(), Some(1));
            }
            FileMatcher::All => {
                scopes.insert(String::new(), None);
            }
        }
        scopes
    }
}

const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// Literal directory prefix of `glob` and how many levels below it a match
/// can sit; `None` when a `**` makes the depth unbounded
fn glob_scope(glob: &str) -> (String, Option<usize>) {
    let segments: Vec<&str> = glob.split('/').collect();
    let dirs = &segments[..segments.len() - 1];
    let literal = dirs.iter().take_while(|s| !s.contains(GLOB_META)).count();

    let depth = if segments[literal..].iter().any(|s| s.contains("**")) {
        None
    } else {
        Some(dirs.len() - literal + 1)
    };
    (dirs[..literal].join("/"), depth)
}

fn widest(a: Option<usize>, b: Option<usize>) -> Option<usize> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        _ => None,
    }
}

enum CompiledMatcher {
    Glob(GlobSet),
    Regex(Regex),
    All,
}

impl CompiledMatcher {
    fn is_match(&self, relative: &str) -> bool {
        match self {
            CompiledMatcher::Glob(set) => set.is_match(relative),
            CompiledMatcher::Regex(regex) => regex.is_match(relative),
            CompiledMatcher::All => true,
        }
    }
}

/// A directory, the files to delete under it, and when
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupSpec {
    pub root: PathBuf,
    pub matcher: FileMatcher,
    pub phase: CleanupPhase,
}

impl CleanupSpec {
    /// Stale outputs of previous builds, matched by glob
    pub fn stale_outputs(root: PathBuf, globs: Vec<String>) -> Self {
        Self {
            root,
            matcher: FileMatcher::Glob(globs),
            phase: CleanupPhase::Pre,
        }
    }

    /// Everything under `root`, before the build
    pub fn wipe(root: PathBuf) -> Self {
        Self {
            root,
            matcher: FileMatcher::All,
            phase: CleanupPhase::Pre,
        }
    }

    /// Script byproducts of style extraction, after the build
    pub fn byproducts(root: PathBuf) -> Self {
        Self {
            root,
            matcher: FileMatcher::Regex(BYPRODUCT_PATTERN.to_string()),
            phase: CleanupPhase::Post,
        }
    }

    /// Files under the root this spec would delete, sorted.
    ///
    /// Only the matcher's scopes are read, so unrelated directories under
    /// the root are never visited. A missing root or scope yields nothing.
    pub fn candidates(&self) -> Result<Vec<PathBuf>> {
        let matcher = self.matcher.compile()?;

        if !self.root.exists() {
            debug!("Cleanup root {} does not exist", self.root.display());
            return Ok(Vec::new());
        }

        let mut matched = BTreeSet::new();
        for (dir, max_depth) in self.matcher.scopes() {
            let start = project_path(&self.root, &dir);
            if !start.is_dir() {
                continue;
            }

            let mut walker = WalkDir::new(&start).follow_links(false).sort_by_file_name();
            if let Some(depth) = max_depth {
                walker = walker.max_depth(depth);
            }

            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        let path = err.path().unwrap_or(&start).to_path_buf();
                        if is_not_found(err.io_error()) {
                            continue;
                        }
                        return Err(MixError::CleanupIo {
                            path,
                            source: io::Error::from(err),
                        });
                    }
                };

                if entry.file_type().is_dir() {
                    continue;
                }

                let Some(relative) = relative_slash(&self.root, entry.path()) else {
                    continue;
                };
                if matcher.is_match(&relative) {
                    matched.insert(entry.into_path());
                }
            }
        }

        Ok(matched.into_iter().collect())
    }

    /// Delete every candidate, returning what was actually removed
    pub fn run(&self) -> Result<Vec<PathBuf>> {
        let mut removed = Vec::new();
        for path in self.candidates()? {
            if remove_file(&path)? {
                removed.push(path);
            }
        }

        info!(
            "Cleaned {} file(s) from {} ({:?})",
            removed.len(),
            self.root.display(),
            self.phase
        );
        Ok(removed)
    }
}

fn is_not_found(err: Option<&io::Error>) -> bool {
    err.map(|e| e.kind() == io::ErrorKind::NotFound).unwrap_or(false)
}

/// `Ok(false)` when the file was already gone
fn remove_file(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed {}", path.display());
            Ok(true)
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(MixError::CleanupIo {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Runs cleanup specs at the phase they are tagged with
pub struct CleanupPlugin {
    specs: Vec<CleanupSpec>,
}

impl CleanupPlugin {
    pub fn new(specs: Vec<CleanupSpec>) -> Self {
        Self { specs }
    }

    pub fn specs(&self) -> &[CleanupSpec] {
        &self.specs
    }

    /// Fail on any spec of `phase` rooted outside `root`
    fn check_within(&self, phase: CleanupPhase, root: &Path) -> Result<()> {
        for spec in self.specs.iter().filter(|s| s.phase == phase) {
            if !spec.root.starts_with(root) {
                return Err(MixError::Config(format!(
                    "cleanup root {} is outside the project root {}",
                    spec.root.display(),
                    root.display()
                )));
            }
        }
        Ok(())
    }

    /// Run the specs of one phase in order, returning the removed files
    pub fn run_phase(&self, phase: CleanupPhase) -> Result<Vec<PathBuf>> {
        let mut removed = Vec::new();
        for spec in self.specs.iter().filter(|s| s.phase == phase) {
            removed.extend(spec.run()?);
        }
        Ok(removed)
    }
}

#[async_trait]
impl Plugin for CleanupPlugin {
    fn name(&self) -> &str {
        "cleanup"
    }

    async fn build_start(&self, ctx: &PluginContext) -> Result<()> {
        self.check_within(CleanupPhase::Pre, &ctx.root)?;
        self.run_phase(CleanupPhase::Pre).map(|_| ())
    }

    async fn build_end(&self, ctx: &PluginContext) -> Result<()> {
        self.check_within(CleanupPhase::Post, &ctx.root)?;
        self.run_phase(CleanupPhase::Post).map(|_| ())
    }
}
