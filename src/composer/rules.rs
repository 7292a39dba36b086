//! Module rules: which loader or asset handler a file type goes through

use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value};

use crate::naming::{AssetKind, NamingStrategy, NamingTemplate};

/// Files inlined below this size, in bytes
const IMAGE_INLINE_LIMIT: u64 = 10_000;
const MEDIA_INLINE_LIMIT: u64 = 10_000;
const FONT_INLINE_LIMIT: u64 = 1_000;

/// One entry of the bundler's module rule list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleRule {
    /// Regex tested against the resource path
    pub test: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,

    #[serde(flatten)]
    pub handler: RuleHandler,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RuleHandler {
    /// Transpile through a single loader
    Loader { loader: String, options: Value },
    /// Emit as a file, or inline it when small enough
    Asset {
        inline_limit: u64,
        filename: NamingTemplate,
    },
    /// Loader chain, applied last to first
    Style { loaders: Vec<LoaderSpec> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoaderSpec {
    pub loader: String,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub options: Value,
}

impl LoaderSpec {
    fn new(loader: &str, options: Value) -> Self {
        Self {
            loader: loader.to_string(),
            options,
        }
    }
}

impl ModuleRule {
    /// Whether the rule applies to `resource`; invalid patterns never match
    pub fn matches(&self, resource: &str) -> bool {
        let hit = |pattern: &str| {
            Regex::new(pattern)
                .map(|re| re.is_match(resource))
                .unwrap_or(false)
        };
        hit(&self.test) && !self.exclude.as_deref().map(hit).unwrap_or(false)
    }
}

/// Script transpilation; project options come first, defaults are merged in
pub fn script_rule(project_options: &Value) -> ModuleRule {
    let mut options = project_options.clone();
    merge_json(
        &mut options,
        json!({
            "presets": [
                ["@babel/preset-env", {
                    "modules": false,
                    "targets": { "browsers": ["> 2%"] }
                }]
            ],
            "plugins": ["@babel/plugin-proposal-object-rest-spread"]
        }),
    );

    ModuleRule {
        test: r"\.jsx?$".to_string(),
        exclude: Some("node_modules".to_string()),
        handler: RuleHandler::Loader {
            loader: "babel-loader".to_string(),
            options,
        },
    }
}

/// Image, media and font rules named by the build's strategy
pub fn asset_rules(naming: &NamingStrategy) -> Vec<ModuleRule> {
    [
        (r"\.(png|jpe?g|gif|svg)(\?.*)?$", AssetKind::Image, IMAGE_INLINE_LIMIT),
        (r"\.(mp4|webm|ogg|mp3|wav|flac|aac)(\?.*)?$", AssetKind::Media, MEDIA_INLINE_LIMIT),
        (r"\.(woff2?|eot|ttf|otf)(\?.*)?$", AssetKind::Font, FONT_INLINE_LIMIT),
    ]
    .into_iter()
    .map(|(test, kind, inline_limit)| ModuleRule {
        test: test.to_string(),
        exclude: None,
        handler: RuleHandler::Asset {
            inline_limit,
            filename: naming.template(kind),
        },
    })
    .collect()
}

/// Options shared by every style loader chain
#[derive(Debug, Clone, Copy)]
pub struct StyleLoaderOptions {
    pub source_map: bool,
    /// Extract into stylesheets instead of injecting from scripts
    pub extract: bool,
}

/// One rule per stylesheet language
pub fn style_rules(options: StyleLoaderOptions) -> Vec<ModuleRule> {
    let chain = |preprocessor: Option<(&str, Value)>| {
        let source_map = json!({ "sourceMap": options.source_map });
        let mut loaders = vec![
            LoaderSpec::new(
                if options.extract { "mini-css-extract-loader" } else { "style-loader" },
                Value::Null,
            ),
            LoaderSpec::new("css-loader", source_map.clone()),
            LoaderSpec::new("postcss-loader", source_map.clone()),
        ];
        if let Some((loader, extra)) = preprocessor {
            let mut loader_options = source_map;
            merge_json(&mut loader_options, extra);
            loaders.push(LoaderSpec::new(loader, loader_options));
        }
        loaders
    };

    let languages: [(&str, Option<(&str, Value)>); 7] = [
        ("css", None),
        ("postcss", None),
        ("less", Some(("less-loader", json!({})))),
        ("sass", Some(("sass-loader", json!({ "indentedSyntax": true })))),
        ("scss", Some(("sass-loader", json!({})))),
        ("stylus", Some(("stylus-loader", json!({})))),
        ("styl", Some(("stylus-loader", json!({})))),
    ];

    languages
        .into_iter()
        .map(|(ext, preprocessor)| ModuleRule {
            test: format!(r"\.{}$", ext),
            exclude: None,
            handler: RuleHandler::Style {
                loaders: chain(preprocessor),
            },
        })
        .collect()
}

/// Merge `overlay` into `base`: objects recursively, arrays appended,
/// anything else replaced
pub fn merge_json(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(base), Value::Array(overlay)) => base.extend(overlay),
        (base, overlay) => *base = overlay,
    }
}
