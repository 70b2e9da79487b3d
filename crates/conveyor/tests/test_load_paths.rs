use std::{fs, path::Path};

use conveyor::{config::Config, resolver::AssetResolver};
use tempfile::TempDir;

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

#[test]
fn test_logical_references_search_load_paths_in_order() {
    let temp_dir = TempDir::new().unwrap();
    let vendor = temp_dir.path().join("vendor/assets/javascripts");
    let lib = temp_dir.path().join("lib/assets/javascripts");

    // Same logical name in both load paths; the first declared path wins
    write(&vendor.join("codemirror.js"), "// vendor copy\n");
    write(&lib.join("codemirror.js"), "// lib copy\n");
    write(&lib.join("models.js"), "// models\n");

    let config = Config {
        load_paths: vec![vendor.clone(), lib.clone()],
        ..Default::default()
    };
    let mut resolver = AssetResolver::new(config);
    let requiring_dir = temp_dir.path().to_path_buf();

    let resolved = resolver
        .resolve_asset("codemirror", &requiring_dir)
        .expect("codemirror should resolve through the load paths");
    assert_eq!(resolved, vendor.join("codemirror.js").canonicalize().unwrap());

    let resolved = resolver
        .resolve_asset("models", &requiring_dir)
        .expect("models should resolve through the second load path");
    assert_eq!(resolved, lib.join("models.js").canonicalize().unwrap());
}

#[test]
fn test_extension_inference_appends_rather_than_replaces() {
    let temp_dir = TempDir::new().unwrap();
    let vendor = temp_dir.path().join("vendor");
    write(&vendor.join("select2.min.js"), "// select2\n");
    write(&vendor.join("d3.v2.js"), "// d3\n");

    let config = Config {
        load_paths: vec![vendor.clone()],
        ..Default::default()
    };
    let mut resolver = AssetResolver::new(config);
    let requiring_dir = temp_dir.path().to_path_buf();

    // "min" and "v2" are not configured extensions, so ".js" is appended
    assert_eq!(
        resolver.resolve_asset("select2.min", &requiring_dir).unwrap(),
        vendor.join("select2.min.js").canonicalize().unwrap()
    );
    assert_eq!(
        resolver.resolve_asset("d3.v2", &requiring_dir).unwrap(),
        vendor.join("d3.v2.js").canonicalize().unwrap()
    );
    // An explicit configured extension is used as-is
    assert_eq!(
        resolver.resolve_asset("select2.min.js", &requiring_dir).unwrap(),
        vendor.join("select2.min.js").canonicalize().unwrap()
    );
}

#[test]
fn test_relative_references_resolve_against_the_requiring_asset() {
    let temp_dir = TempDir::new().unwrap();
    let manifest_dir = temp_dir.path().join("app/assets/javascripts");
    let utils = temp_dir.path().join("lib/assets/javascripts/utils");
    write(&manifest_dir.join("table.js"), "");
    write(&utils.join("postgres.codemirror.js"), "// mode\n");

    let mut resolver = AssetResolver::new(Config::default());

    let resolved = resolver
        .resolve_asset(
            "../../../lib/assets/javascripts/utils/postgres.codemirror",
            &manifest_dir,
        )
        .expect("relative reference should resolve without any load paths");
    assert_eq!(
        resolved,
        utils.join("postgres.codemirror.js").canonicalize().unwrap()
    );
}

#[test]
fn test_missing_references_resolve_to_none() {
    let temp_dir = TempDir::new().unwrap();
    let vendor = temp_dir.path().join("vendor");
    fs::create_dir_all(&vendor).unwrap();

    let config = Config {
        load_paths: vec![vendor],
        ..Default::default()
    };
    let mut resolver = AssetResolver::new(config);
    let requiring_dir = temp_dir.path().to_path_buf();

    assert!(resolver.resolve_asset("no-such-lib", &requiring_dir).is_none());
    assert!(resolver.resolve_asset("./no-such-file", &requiring_dir).is_none());
}

#[test]
fn test_directory_resolution_for_logical_and_relative_references() {
    let temp_dir = TempDir::new().unwrap();
    let vendor = temp_dir.path().join("vendor");
    let widgets = vendor.join("jquery-ui");
    write(&widgets.join("widget.js"), "// widget\n");

    let config = Config {
        load_paths: vec![vendor.clone()],
        ..Default::default()
    };
    let resolver = AssetResolver::new(config);

    assert_eq!(
        resolver.resolve_directory("jquery-ui", temp_dir.path()).unwrap(),
        widgets.canonicalize().unwrap()
    );
    assert_eq!(
        resolver.resolve_directory("./jquery-ui", &vendor).unwrap(),
        widgets.canonicalize().unwrap()
    );
    assert!(resolver.resolve_directory("no-such-dir", temp_dir.path()).is_none());
}

#[test]
fn test_custom_extensions_are_honored() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("src");
    write(&src.join("grid.coffee"), "# grid\n");

    let config = Config {
        load_paths: vec![src.clone()],
        extensions: vec!["js".into(), "coffee".into()],
        ..Default::default()
    };
    let mut resolver = AssetResolver::new(config);

    assert_eq!(
        resolver.resolve_asset("grid", temp_dir.path()).unwrap(),
        src.join("grid.coffee").canonicalize().unwrap()
    );
}
