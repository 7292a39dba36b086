use std::fs;
use std::path::Path;

use mixture::bundler::{Bundler, ChunkType, Issuer, ModuleGraph, ModuleKind, ModuleQuery};
use mixture::composer::{Composer, ComposerSettings, MixContext, ScriptIngredient, StyleIngredient};
use mixture::config::{BuildFlags, Config};
use mixture::lifecycle::CleanupPhase;
use mixture::{BundlerConfig, MixError};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn compose(root: &Path, flags: BuildFlags) -> BundlerConfig {
    let mut composer = Composer::new(
        MixContext::new(root.to_path_buf(), "", flags),
        ComposerSettings::default(),
    );
    composer
        .add(&ScriptIngredient::new("app.js").named("main"))
        .unwrap()
        .add(&StyleIngredient::new("home.css"))
        .unwrap();
    composer.finish()
}

fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, "").unwrap();
}

#[test]
fn test_style_and_vendor_classification() {
    let dir = TempDir::new().unwrap();
    let config = compose(dir.path(), BuildFlags::default());
    let classifier = config.classifier();

    let mut graph = ModuleGraph::new();
    let app = graph.add_module("resources/assets/js/app.js", ModuleKind::Script);
    let home = graph.add_module("resources/assets/css/home.css", ModuleKind::Style);
    let partial = graph.add_module("resources/assets/css/_header.css", ModuleKind::Style);
    let lodash = graph.add_module("node_modules/lodash/lodash.js", ModuleKind::Script);
    let orphan = graph.add_module("resources/assets/css/unused.css", ModuleKind::Style);
    let from_script = graph.add_module("resources/assets/css/widget.css", ModuleKind::Style);

    graph.add_issuer(app, Issuer::Entry("includes/js/main".into()));
    graph.add_issuer(home, Issuer::Entry("includes/css/home".into()));
    graph.add_issuer(partial, Issuer::Module(home));
    graph.add_issuer(lodash, Issuer::Module(app));
    graph.add_issuer(from_script, Issuer::Module(app));

    assert_eq!(classifier.classify(&graph, home), Some("home"));
    assert_eq!(classifier.classify(&graph, partial), Some("home"));
    assert_eq!(classifier.classify(&graph, lodash), Some("vendor"));
    assert_eq!(classifier.classify(&graph, orphan), None);
    assert_eq!(classifier.classify(&graph, from_script), None);
    assert_eq!(classifier.classify(&graph, app), None);

    let ids = graph.all_module_ids();
    classifier.check_exclusive(&graph, &ids).unwrap();

    let chunks = classifier.group(&graph, &ids);
    let names: Vec<&str> = chunks.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["home", "vendor"]);
    assert_eq!(chunks[0].chunk_type, ChunkType::Dedicated);
    assert_eq!(chunks[0].module_ids, vec![home, partial]);
    assert_eq!(chunks[1].chunk_type, ChunkType::Shared);
}

#[test]
fn test_vendor_style_stays_with_its_entry() {
    let dir = TempDir::new().unwrap();
    let config = compose(dir.path(), BuildFlags::default());

    let mut graph = ModuleGraph::new();
    let home = graph.add_module("resources/assets/css/home.css", ModuleKind::Style);
    let normalize = graph.add_module("node_modules/normalize.css/normalize.css", ModuleKind::Style);
    graph.add_issuer(home, Issuer::Entry("includes/css/home".into()));
    graph.add_issuer(normalize, Issuer::Module(home));

    assert_eq!(config.classifier().classify(&graph, normalize), Some("home"));
}

#[test]
fn test_two_style_entries_keep_their_own_modules() {
    let dir = TempDir::new().unwrap();
    let mut composer = Composer::new(
        MixContext::new(dir.path().to_path_buf(), "", BuildFlags::default()),
        ComposerSettings::default(),
    );
    composer.add(&StyleIngredient::new("home.css")).unwrap();
    composer.add(&StyleIngredient::new("about.css")).unwrap();
    let config = composer.finish();

    let mut graph = ModuleGraph::new();
    let home = graph.add_module("resources/assets/css/home.css", ModuleKind::Style);
    let about = graph.add_module("resources/assets/css/about.css", ModuleKind::Style);
    let shared = graph.add_module("resources/assets/css/_type.css", ModuleKind::Style);
    graph.add_issuer(home, Issuer::Entry("includes/css/home".into()));
    graph.add_issuer(about, Issuer::Entry("includes/css/about".into()));
    // Imported by both; the first recorded issuer wins
    graph.add_issuer(shared, Issuer::Module(about));
    graph.add_issuer(shared, Issuer::Module(home));

    let classifier = config.classifier();
    assert_eq!(classifier.classify(&graph, home), Some("home"));
    assert_eq!(classifier.classify(&graph, about), Some("about"));
    assert_eq!(classifier.classify(&graph, shared), Some("about"));
}

#[test]
fn test_graph_from_json_records() {
    let json = r#"[
        {"resource": "resources/assets/css/_grid.css", "issuers": [{"module": "resources/assets/css/home.css"}]},
        {"resource": "resources/assets/css/home.css", "issuers": [{"entry": "includes/css/home"}]},
        {"resource": "node_modules/jquery/dist/jquery.js", "issuers": [{"module": "resources/assets/js/app.js"}]},
        {"resource": "resources/assets/js/app.js", "issuers": [{"entry": "includes/js/main"}]}
    ]"#;
    let records = serde_json::from_str::<Vec<mixture::bundler::ModuleRecord>>(json).unwrap();
    let graph = ModuleGraph::from_records(&records).unwrap();

    let dir = TempDir::new().unwrap();
    let config = compose(dir.path(), BuildFlags::default());
    let classifier = config.classifier();

    let grid = graph.get_module_id("resources/assets/css/_grid.css").unwrap();
    let jquery = graph.get_module_id("node_modules/jquery/dist/jquery.js").unwrap();
    assert_eq!(graph.kind(grid), Some(ModuleKind::Style));
    assert_eq!(classifier.classify(&graph, grid), Some("home"));
    assert_eq!(classifier.classify(&graph, jquery), Some("vendor"));
}

#[test]
fn test_pre_build_cleanup_removes_only_stale_outputs() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    touch(&root.join("manifest.json"));
    touch(&root.join("includes/js/runtime.0a1b2c3d.js"));
    touch(&root.join("includes/js/app.js"));
    touch(&root.join("resources/assets/css/app.css"));

    let config = compose(root, BuildFlags::new(false, true));
    let mut removed = Vec::new();
    for spec in config.cleanup_specs_for(CleanupPhase::Pre) {
        removed.extend(spec.run().unwrap());
    }

    assert!(!root.join("manifest.json").exists());
    assert!(!root.join("includes/js/runtime.0a1b2c3d.js").exists());
    assert!(root.join("includes/js/app.js").exists());
    assert!(root.join("resources/assets/css/app.css").exists());
    assert_eq!(removed.len(), 2);
}

#[tokio::test]
async fn test_build_cleans_before_and_after() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    touch(&root.join("manifest.json"));
    touch(&root.join("includes/css/stale.css"));

    let bundler = Bundler::new(compose(root, BuildFlags::default()));

    let mut graph = ModuleGraph::new();
    let home = graph.add_module("resources/assets/css/home.css", ModuleKind::Style);
    graph.add_issuer(home, Issuer::Entry("includes/css/home".into()));

    bundler.signal(mixture::bundler::BuildPhase::PreProcess).await.unwrap();
    assert!(!root.join("manifest.json").exists());
    assert!(!root.join("includes/css/stale.css").exists());

    // What the host bundler emits between the two phases
    touch(&root.join("includes/css/home.css"));
    touch(&root.join("includes/css/home.js"));
    touch(&root.join("includes/css/home.js.map"));
    bundler.signal(mixture::bundler::BuildPhase::PostEmit).await.unwrap();

    assert!(root.join("includes/css/home.css").exists());
    assert!(!root.join("includes/css/home.js").exists());
    assert!(!root.join("includes/css/home.js.map").exists());

    let result = bundler.build(&graph, &graph.all_module_ids()).await.unwrap();
    assert_eq!(result.chunks.len(), 1);
    assert!(result.unassigned.is_empty());
}

#[test]
fn test_conflicting_entries_are_rejected() {
    let dir = TempDir::new().unwrap();
    let mut composer = Composer::new(
        MixContext::new(dir.path().to_path_buf(), "", BuildFlags::default()),
        ComposerSettings::default(),
    );
    composer.add(&StyleIngredient::new("home.css")).unwrap();
    let err = composer
        .add(&StyleIngredient::new("landing.css").named("home"))
        .err()
        .unwrap();

    match err {
        MixError::DuplicateEntry { chunk, .. } => assert_eq!(chunk, "includes/css/home"),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_project_file_composes_json() {
    let dir = TempDir::new().unwrap();
    let config = Config::from_toml(
        r#"
[project]
name = "shop"

[[scripts]]
file = "app.js"
name = "main"

[[styles]]
file = ["home.css", "print.css"]
name = "home"
"#,
        dir.path().to_path_buf(),
    )
    .unwrap();

    let bundler_config = Composer::from_config(&config, BuildFlags::new(true, true))
        .unwrap()
        .finish();
    let json: serde_json::Value =
        serde_json::from_str(&bundler_config.to_json_pretty().unwrap()).unwrap();

    assert_eq!(json["mode"], "production");
    assert_eq!(json["entry"]["includes/js/main"], "./resources/assets/js/app.js");
    assert_eq!(
        json["entry"]["includes/css/home"],
        serde_json::json!(["./resources/assets/css/home.css", "./resources/assets/css/print.css"])
    );
    assert_eq!(json["output"]["filename"], "[name].[chunkhash].js");
}
