//! Compiled-in resources.
//!
//! Runtime script, stylesheets, shared runtime assets and blueprint files are
//! embedded into the binary and looked up by a stable logical path (the path
//! under `static/`). The set of required paths is checked once at startup by
//! [`verify`], so a missing entry stops the process before any build starts.

use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("embedded resource not found: {0}")]
    NotFound(String),
    #[error("cannot write resource {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// Version of the embedded bundle (the crate version).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const STANZA_RUNTIME: &str = "stanza/runtime.js";
pub const STANZA_STYLESHEET: &str = "stanza/stanza.css";
pub const HELP_STYLESHEET: &str = "stanza/help.css";

/// Shared runtime assets restored into every collection output. The logical
/// path doubles as the output path relative to the collection root.
pub const SHARED_ASSETS: &[&str] = &[
    "assets/css/ts.css",
    "assets/js/template.js",
    "assets/js/webcomponents-loader.js",
];

/// Blueprint files for `ts new`, keyed by logical path.
pub const BLUEPRINT: &[&str] = &[
    "blueprint/metadata.json",
    "blueprint/index.js",
    "blueprint/templates/stanza.html",
];

static RESOURCES: &[(&str, &str)] = &[
    (STANZA_RUNTIME, include_str!("../static/stanza/runtime.js")),
    (STANZA_STYLESHEET, include_str!("../static/stanza/stanza.css")),
    (HELP_STYLESHEET, include_str!("../static/stanza/help.css")),
    ("assets/css/ts.css", include_str!("../static/assets/css/ts.css")),
    ("assets/js/template.js", include_str!("../static/assets/js/template.js")),
    (
        "assets/js/webcomponents-loader.js",
        include_str!("../static/assets/js/webcomponents-loader.js"),
    ),
    ("blueprint/metadata.json", include_str!("../static/blueprint/metadata.json")),
    ("blueprint/index.js", include_str!("../static/blueprint/index.js")),
    (
        "blueprint/templates/stanza.html",
        include_str!("../static/blueprint/templates/stanza.html"),
    ),
];

/// Look up a resource by logical path.
pub fn get(path: &str) -> Result<&'static str, ResourceError> {
    RESOURCES
        .iter()
        .find(|(p, _)| *p == path)
        .map(|(_, contents)| *contents)
        .ok_or_else(|| ResourceError::NotFound(path.to_string()))
}

/// Check that every logical path the build and scaffold steps use resolves.
pub fn verify() -> Result<(), ResourceError> {
    [STANZA_RUNTIME, STANZA_STYLESHEET, HELP_STYLESHEET]
        .iter()
        .chain(SHARED_ASSETS)
        .chain(BLUEPRINT)
        .try_for_each(|path| get(path).map(|_| ()))
}

/// Write a resource to `dest_root/<path>`, creating parent directories.
pub fn restore(dest_root: &Path, path: &str) -> Result<(), ResourceError> {
    let contents = get(path)?;
    let target = dest_root.join(path);
    let write_err = |source| ResourceError::Write {
        path: target.display().to_string(),
        source,
    };
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(&target, contents).map_err(write_err)?;
    Ok(())
}
