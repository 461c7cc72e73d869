//! End-to-end collection builds through the public API.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use ts::provider::{ProviderError, StanzaProvider};
use walkdir::WalkDir;

fn write_stanza(base: &Path, name: &str, metadata: &str, script: &str) -> PathBuf {
    let dir = base.join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("metadata.json"), metadata).unwrap();
    fs::write(dir.join("index.js"), script).unwrap();
    dir
}

fn read_tree(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .map(Result::unwrap)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
            (rel, fs::read(e.path()).unwrap())
        })
        .collect()
}

/// Base directory with `widget-a` and a non-stanza directory next to it.
fn fixture() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let dir = write_stanza(
        tmp.path(),
        "widget-a",
        r#"{"@id":"a","stanza:label":"A","stanza:parameters":[{"stanza:key":"x"}]}"#,
        r#"console.log("a")"#,
    );
    fs::create_dir_all(dir.join("templates")).unwrap();
    fs::write(dir.join("templates/main.html"), "<p>{{x}}</p>").unwrap();
    fs::create_dir_all(dir.join("assets/img")).unwrap();
    fs::write(dir.join("assets/img/logo.svg"), "<svg/>").unwrap();

    fs::create_dir_all(tmp.path().join("notes")).unwrap();
    fs::write(tmp.path().join("notes/README.md"), "not a stanza").unwrap();
    tmp
}

#[test]
fn widget_a_end_to_end() {
    let tmp = fixture();
    let dist = tmp.path().join("dist/stanza");
    let mut provider = StanzaProvider::new(tmp.path());

    let report = provider.build(&dist, false).unwrap();

    assert_eq!(report.stanzas.len(), 1);
    assert_eq!(report.stanzas[0].element_name, "togostanza-widget-a");
    assert_eq!(report.stanzas[0].assets, 1);

    let page = fs::read_to_string(dist.join("widget-a/index.html")).unwrap();
    assert!(page.contains(r#"console.log("a")"#));
    assert!(page.contains(r#""parameters":["x"]"#));
    assert!(page.contains(r#""elementName":"togostanza-widget-a""#));
    assert!(page.contains(r#""development":false"#));

    assert_eq!(
        fs::read(dist.join("widget-a/metadata.json")).unwrap(),
        fs::read(tmp.path().join("widget-a/metadata.json")).unwrap()
    );
    assert_eq!(
        fs::read_to_string(dist.join("widget-a/assets/img/logo.svg")).unwrap(),
        "<svg/>"
    );
    assert!(dist.join("widget-a/help.html").is_file());
    assert!(!dist.join("notes").exists());

    let aggregated: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dist.join("metadata.json")).unwrap()).unwrap();
    let stanzas = aggregated["stanza:stanzas"].as_array().unwrap();
    assert_eq!(stanzas.len(), 1);
    assert_eq!(stanzas[0]["@id"], "a");

    let listing = fs::read_to_string(dist.join("index.html")).unwrap();
    assert!(listing.contains("widget-a/"));
    for asset in [
        "assets/css/ts.css",
        "assets/js/template.js",
        "assets/js/webcomponents-loader.js",
    ] {
        assert!(dist.join(asset).is_file(), "{asset}");
    }
}

#[test]
fn consecutive_builds_are_byte_identical() {
    let tmp = fixture();
    let dist = tmp.path().join("dist/stanza");

    StanzaProvider::new(tmp.path()).build(&dist, false).unwrap();
    let first = read_tree(&dist);
    StanzaProvider::new(tmp.path()).build(&dist, false).unwrap();

    assert_eq!(first, read_tree(&dist));
}

#[test]
fn rebuild_follows_source_changes() {
    let tmp = fixture();
    let dist = tmp.path().join("dist/stanza");
    let mut provider = StanzaProvider::new(tmp.path());
    provider.build(&dist, true).unwrap();

    assert!(provider.rebuild_if_required(&dist, true).unwrap().is_none());

    let script = tmp.path().join("widget-a/index.js");
    fs::write(&script, r#"console.log("b")"#).unwrap();
    fs::File::open(&script)
        .unwrap()
        .set_modified(provider.last_modified() + Duration::from_secs(5))
        .unwrap();

    assert!(provider.rebuild_if_required(&dist, true).unwrap().is_some());
    assert!(provider.rebuild_if_required(&dist, true).unwrap().is_none());

    let page = fs::read_to_string(dist.join("widget-a/index.html")).unwrap();
    assert!(page.contains(r#"console.log("b")"#));
}

#[test]
fn empty_collection_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("notes")).unwrap();
    let dist = tmp.path().join("dist/stanza");

    let err = StanzaProvider::new(tmp.path()).build(&dist, false).unwrap_err();

    assert!(matches!(err, ProviderError::EmptyCollection(_)));
    assert!(!dist.join("index.html").exists());
    assert!(!dist.join("metadata.json").exists());
}
