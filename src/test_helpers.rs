//! Shared test utilities for the ts test suite.
//!
//! Fixtures are written into a `TempDir` by the tests themselves, so each test
//! owns an isolated stanza tree it can mutate freely.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let dir = write_widget_a(tmp.path());
//! let stanza = Stanza::new(&dir, "widget-a").unwrap().unwrap();
//! stanza.build(&tmp.path().join("out"), false).unwrap();
//!
//! let before = read_tree(&tmp.path().join("out"));
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

// =========================================================================
// Fixture setup
// =========================================================================

/// Write a stanza directory with a descriptor and a script. Returns its path.
pub fn write_stanza(base: &Path, name: &str, metadata: &str, script: &str) -> PathBuf {
    let dir = base.join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("metadata.json"), metadata).unwrap();
    fs::write(dir.join("index.js"), script).unwrap();
    dir
}

/// The `widget-a` stanza: one parameter, one fragment template.
pub fn write_widget_a(base: &Path) -> PathBuf {
    let dir = write_stanza(
        base,
        "widget-a",
        r#"{"@id":"a","stanza:label":"A","stanza:parameters":[{"stanza:key":"x"}]}"#,
        r#"console.log("a")"#,
    );
    fs::create_dir_all(dir.join("templates")).unwrap();
    fs::write(dir.join("templates/main.html"), "<p>{{x}}</p>").unwrap();
    dir
}

// =========================================================================
// Filesystem inspection
// =========================================================================

/// Every file under `root`, keyed by relative path, with its bytes.
pub fn read_tree(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
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

/// Set a file or directory's modification time without touching its content.
pub fn set_mtime(path: &Path, time: SystemTime) {
    fs::File::open(path).unwrap().set_modified(time).unwrap();
}
