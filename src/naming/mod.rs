//! Output filename templates
//!
//! Every emitted asset kind has two templates: one embedding a content hash
//! for versioned builds and a plain one. The choice is made once per build
//! through [`NamingStrategy`] and applies to every kind at once.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// `[name]`, `[ext]`, `[chunkhash]`, `[contenthash]`, optionally `:<len>`
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[(name|ext|chunkhash|contenthash)(?::(\d+))?\]").unwrap()
});

/// Kinds of emitted assets
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Script,
    Style,
    Image,
    Media,
    Font,
}

impl AssetKind {
    pub const ALL: [AssetKind; 5] = [
        AssetKind::Script,
        AssetKind::Style,
        AssetKind::Image,
        AssetKind::Media,
        AssetKind::Font,
    ];

    /// Determine asset kind from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "js" | "jsx" | "mjs" | "cjs" => Some(AssetKind::Script),
            "css" | "scss" | "sass" | "less" | "styl" | "stylus" | "pcss" => Some(AssetKind::Style),
            "png" | "jpg" | "jpeg" | "gif" | "svg" => Some(AssetKind::Image),
            "mp4" | "webm" | "ogg" | "mp3" | "wav" | "flac" | "aac" => Some(AssetKind::Media),
            "woff" | "woff2" | "eot" | "ttf" | "otf" => Some(AssetKind::Font),
            _ => None,
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssetKind::Script => "script",
            AssetKind::Style => "style",
            AssetKind::Image => "image",
            AssetKind::Media => "media",
            AssetKind::Font => "font",
        };
        f.write_str(name)
    }
}

/// A filename template such as `[name].[chunkhash].js`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamingTemplate(String);

impl NamingTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the template embeds a content hash
    pub fn is_versioned(&self) -> bool {
        PLACEHOLDER
            .captures_iter(&self.0)
            .any(|cap| &cap[1] != "name" && &cap[1] != "ext")
    }

    /// Glob matching every file this template produces for `name`,
    /// whatever hash or extension a previous build used
    pub fn glob_for(&self, name: &str) -> String {
        let mut glob = String::new();
        let mut last = 0;
        for cap in PLACEHOLDER.captures_iter(&self.0) {
            let Some(whole) = cap.get(0) else {
                continue;
            };
            glob.push_str(&escape_glob(&self.0[last..whole.start()]));
            match &cap[1] {
                "name" => glob.push_str(&escape_glob(name)),
                _ => glob.push('*'),
            }
            last = whole.end();
        }
        glob.push_str(&escape_glob(&self.0[last..]));
        glob
    }
}

impl fmt::Display for NamingTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn escape_glob(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    for c in literal.chars() {
        match c {
            '*' | '?' | '[' | ']' | '{' | '}' => {
                out.push('[');
                out.push(c);
                out.push(']');
            }
            _ => out.push(c),
        }
    }
    out
}

/// Template for `kind` in a versioned or unversioned build
pub fn name_for(kind: AssetKind, versioning: bool) -> NamingTemplate {
    let template = match (kind, versioning) {
        (AssetKind::Script, true) => "[name].[chunkhash].js",
        (AssetKind::Script, false) => "[name].js",
        (AssetKind::Style, true) => "[name].[contenthash].css",
        (AssetKind::Style, false) => "[name].css",
        (AssetKind::Image, true) => "images/[name].[contenthash:7].[ext]",
        (AssetKind::Image, false) => "images/[name].[ext]",
        (AssetKind::Media, true) => "media/[name].[contenthash:7].[ext]",
        (AssetKind::Media, false) => "media/[name].[ext]",
        (AssetKind::Font, true) => "fonts/[name].[contenthash:7].[ext]",
        (AssetKind::Font, false) => "fonts/[name].[ext]",
    };
    NamingTemplate::new(template)
}

/// Naming decisions for one build; the versioning flag is fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamingStrategy {
    versioning: bool,
}

impl NamingStrategy {
    pub fn new(versioning: bool) -> Self {
        Self { versioning }
    }

    pub fn versioning(&self) -> bool {
        self.versioning
    }

    pub fn template(&self, kind: AssetKind) -> NamingTemplate {
        name_for(kind, self.versioning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_for_is_idempotent() {
        for kind in AssetKind::ALL {
            for versioning in [false, true] {
                assert_eq!(name_for(kind, versioning), name_for(kind, versioning));
            }
        }
    }

    #[test]
    fn test_versioning_changes_every_kind() {
        for kind in AssetKind::ALL {
            let plain = name_for(kind, false);
            let hashed = name_for(kind, true);
            assert_ne!(plain, hashed, "{} template unchanged by versioning", kind);
            assert!(!plain.is_versioned());
            assert!(hashed.is_versioned());
        }
    }

    #[test]
    fn test_glob_for() {
        assert_eq!(name_for(AssetKind::Script, true).glob_for("runtime"), "runtime.*.js");
        assert_eq!(name_for(AssetKind::Script, false).glob_for("runtime"), "runtime.js");
        assert_eq!(name_for(AssetKind::Font, true).glob_for("icons"), "fonts/icons.*.*");
        assert_eq!(NamingTemplate::new("[name].json").glob_for("a[1]"), "a[[]1[]].json");
    }

    #[test]
    fn test_extension_detection() {
        assert_eq!(AssetKind::from_extension("SCSS"), Some(AssetKind::Style));
        assert_eq!(AssetKind::from_extension("woff2"), Some(AssetKind::Font));
        assert_eq!(AssetKind::from_extension("flac"), Some(AssetKind::Media));
        assert_eq!(AssetKind::from_extension("json"), None);
    }

    #[test]
    fn test_strategy_holds_flag() {
        let strategy = NamingStrategy::new(true);
        assert!(strategy.versioning());
        assert_eq!(strategy.template(AssetKind::Style).as_str(), "[name].[contenthash].css");
    }
}
