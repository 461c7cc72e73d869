//! Stanza collection discovery, build and conditional rebuild.
//!
//! A [`StanzaProvider`] owns one base directory. Every immediate subdirectory
//! holding a `metadata.json` is a stanza; everything else is ignored.
//!
//! ## Collection output
//!
//! ```text
//! dist/stanza/
//! ├── index.html              # listing of every stanza
//! ├── metadata.json           # aggregated descriptors (JSON-LD)
//! ├── assets/                 # shared runtime assets
//! │   ├── css/ts.css
//! │   └── js/{template.js, webcomponents-loader.js}
//! ├── gene-attributes/        # one bundle per stanza
//! │   ├── index.html
//! │   ├── help.html
//! │   ├── metadata.json
//! │   └── assets/
//! └── ...
//! ```
//!
//! ## Build contract
//!
//! [`StanzaProvider::build`] rebuilds the whole collection from scratch. Every
//! stanza is read and rendered in memory first; only then are the contents of
//! the output directory wiped and rewritten. A stanza that fails to render
//! (missing script, malformed descriptor) aborts the build with the previous
//! output untouched. A failure while writing leaves an incomplete tree
//! behind; nothing is rolled back.
//!
//! [`StanzaProvider::rebuild_if_required`] is the dev server's entry point: it
//! recomputes the source watermark and runs a full build only when something
//! under the base directory changed since the last one.
//!
//! The provider is not internally synchronized. Callers sharing it across
//! threads must serialize `build`/`rebuild_if_required` (the dev server keeps
//! it behind a mutex).

use crate::resources::{self, ResourceError};
use crate::stanza::{BuiltStanza, Stanza, StanzaError};
use crate::watermark::{self, WatermarkError};
use maud::{DOCTYPE, Markup, html};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};
use thiserror::Error;

/// JSON-LD vocabulary of the aggregated metadata document.
pub const STANZA_VOCABULARY: &str = "http://togostanza.org/resource/stanza#";

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("stanza '{name}': {source}")]
    Stanza { name: String, source: StanzaError },
    #[error("no stanzas available under {0}")]
    EmptyCollection(PathBuf),
    #[error("output directory {0} would contain the stanza sources")]
    OutputContainsSources(PathBuf),
    #[error(transparent)]
    Watermark(#[from] WatermarkError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn io_at(path: &Path) -> impl FnOnce(std::io::Error) -> ProviderError {
    move |source| ProviderError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Outcome of a full collection build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub dist_dir: PathBuf,
    pub development: bool,
    pub stanzas: Vec<BuiltStanza>,
    pub shared_assets: usize,
    pub elapsed: Duration,
}

#[derive(Debug)]
pub struct StanzaProvider {
    base_dir: PathBuf,
    stanzas: BTreeMap<String, Stanza>,
    last_modified: SystemTime,
}

impl StanzaProvider {
    /// An empty provider; nothing is read until [`load`](Self::load) or
    /// [`build`](Self::build).
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            stanzas: BTreeMap::new(),
            last_modified: SystemTime::UNIX_EPOCH,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Watermark recorded by the last build.
    pub fn last_modified(&self) -> SystemTime {
        self.last_modified
    }

    /// Stanzas in name order.
    pub fn stanzas(&self) -> impl Iterator<Item = &Stanza> {
        self.stanzas.values()
    }

    pub fn stanza(&self, name: &str) -> Option<&Stanza> {
        self.stanzas.get(name)
    }

    pub fn len(&self) -> usize {
        self.stanzas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stanzas.is_empty()
    }

    /// Rescan the base directory.
    ///
    /// Stanzas are keyed by directory name. Names that are not valid UTF-8
    /// are skipped, so every key comes from exactly one directory.
    ///
    /// `exclude` names a top-level directory to skip (the output directory
    /// when it lives under the base directory). The stored collection is
    /// replaced only when the whole scan succeeds; on error it is left as it
    /// was. Returns the number of stanzas found.
    pub fn load(&mut self, exclude: Option<&OsString>) -> Result<usize, ProviderError> {
        let entries = fs::read_dir(&self.base_dir).map_err(io_at(&self.base_dir))?;

        let mut dirs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(io_at(&self.base_dir))?;
            let path = entry.path();
            if !path.is_dir() || exclude.is_some_and(|name| entry.file_name() == *name) {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                println!("Skipping {}: name is not valid UTF-8", path.display());
                continue;
            };
            dirs.push((path, name));
        }
        dirs.sort();

        let mut stanzas = BTreeMap::new();
        for (path, name) in dirs {
            let stanza = Stanza::new(&path, &name).map_err(|source| ProviderError::Stanza {
                name: name.clone(),
                source,
            })?;
            let Some(stanza) = stanza else {
                continue;
            };
            println!("Loading stanza {}", path.display());
            stanzas.insert(name, stanza);
        }

        self.stanzas = stanzas;
        Ok(self.stanzas.len())
    }

    /// Current watermark of the source tree, ignoring `dist_dir`.
    pub fn scan_watermark(&self, dist_dir: &Path) -> Result<SystemTime, ProviderError> {
        let exclude = watermark::excluded_dir(&self.base_dir, dist_dir);
        Ok(watermark::scan(&self.base_dir, exclude.as_ref())?)
    }

    /// Build the whole collection into `dist_dir`.
    pub fn build(&mut self, dist_dir: &Path, development: bool) -> Result<BuildReport, ProviderError> {
        let started = Instant::now();
        if contains_path(dist_dir, &self.base_dir) {
            return Err(ProviderError::OutputContainsSources(dist_dir.to_path_buf()));
        }

        // The output directory node itself is created up front and never
        // removed, so wiping it does not bump the base directory's mtime.
        fs::create_dir_all(dist_dir).map_err(io_at(dist_dir))?;

        // Recorded before building so that edits made while the build runs
        // are picked up by the next comparison.
        self.last_modified = self.scan_watermark(dist_dir)?;

        let exclude = watermark::excluded_dir(&self.base_dir, dist_dir);
        self.load(exclude.as_ref())?;
        if self.stanzas.is_empty() {
            return Err(ProviderError::EmptyCollection(self.base_dir.clone()));
        }

        // Everything read from the sources is rendered before the output is
        // touched, so an unreadable script or template keeps the previous tree.
        let mut rendered = Vec::with_capacity(self.stanzas.len());
        for (name, stanza) in &self.stanzas {
            let pages = stanza
                .render(development)
                .map_err(|source| ProviderError::Stanza {
                    name: name.clone(),
                    source,
                })?;
            rendered.push(pages);
        }
        let listing = render_listing(self).into_string();
        let mut document = serde_json::to_string(&self.aggregated_metadata())?;
        document.push('\n');

        clear_dir(dist_dir)?;

        let mut built = Vec::with_capacity(self.stanzas.len());
        for ((name, stanza), pages) in self.stanzas.iter().zip(&rendered) {
            let result = stanza
                .write(pages, &dist_dir.join(name))
                .map_err(|source| ProviderError::Stanza {
                    name: name.clone(),
                    source,
                })?;
            built.push(result);
        }

        for asset in resources::SHARED_ASSETS {
            resources::restore(dist_dir, asset)?;
        }

        let listing_path = dist_dir.join("index.html");
        fs::write(&listing_path, listing).map_err(io_at(&listing_path))?;

        let metadata_path = dist_dir.join("metadata.json");
        fs::write(&metadata_path, document).map_err(io_at(&metadata_path))?;

        Ok(BuildReport {
            dist_dir: dist_dir.to_path_buf(),
            development,
            stanzas: built,
            shared_assets: resources::SHARED_ASSETS.len(),
            elapsed: started.elapsed(),
        })
    }

    /// Rebuild when the source tree changed since the last build.
    ///
    /// Returns the build report when a rebuild ran, `None` when the output is
    /// current.
    pub fn rebuild_if_required(
        &mut self,
        dist_dir: &Path,
        development: bool,
    ) -> Result<Option<BuildReport>, ProviderError> {
        let current = self.scan_watermark(dist_dir)?;
        if !watermark::is_stale(self.last_modified, current) {
            return Ok(None);
        }
        println!("update detected; rebuilding ...");
        self.build(dist_dir, development).map(Some)
    }

    /// Every stanza's raw descriptor under the shared JSON-LD context.
    pub fn aggregated_metadata(&self) -> serde_json::Value {
        let stanzas: Vec<serde_json::Value> = self
            .stanzas
            .values()
            .map(|s| s.metadata_raw().clone())
            .collect();
        serde_json::json!({
            "@context": { "stanza": STANZA_VOCABULARY },
            "stanza:stanzas": stanzas,
        })
    }
}

/// True when `inner` is `outer` or lies below it.
fn contains_path(outer: &Path, inner: &Path) -> bool {
    match (std::path::absolute(outer), std::path::absolute(inner)) {
        (Ok(outer), Ok(inner)) => inner.starts_with(outer),
        _ => false,
    }
}

/// Remove everything inside `dir`, keeping `dir` itself.
fn clear_dir(dir: &Path) -> Result<(), ProviderError> {
    for entry in fs::read_dir(dir).map_err(io_at(dir))? {
        let path = entry.map_err(io_at(dir))?.path();
        let removed = if path.is_dir() && !path.is_symlink() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.map_err(io_at(&path))?;
    }
    Ok(())
}

/// The collection listing page.
fn render_listing(provider: &StanzaProvider) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "Stanzas" }
                link rel="stylesheet" href="assets/css/ts.css";
            }
            body {
                header {
                    h1 { "Stanzas" }
                    p { (provider.len()) " stanza(s) · " a href="metadata.json" { "metadata.json" } }
                }
                ul.stanza-list {
                    @for stanza in provider.stanzas() {
                        @let meta = stanza.metadata();
                        li.stanza-card id=(stanza.name()) {
                            h2 { a href={ (stanza.name()) "/" } { (stanza.label()) } }
                            p.element-name { "<" (stanza.element_name()) ">" }
                            @let tags = meta.tags();
                            @if !tags.is_empty() {
                                p.tags {
                                    @for tag in &tags {
                                        span { (tag) }
                                    }
                                }
                            }
                            @if !meta.definition.trim().is_empty() {
                                p.definition { (meta.definition) }
                            }
                            p.links {
                                a href={ (stanza.name()) "/" } { "Open" }
                                a href={ (stanza.name()) "/help.html" } { "Help" }
                                a href={ (stanza.name()) "/metadata.json" } { "Metadata" }
                            }
                        }
                    }
                }
                footer { "Built with ts " (resources::VERSION) }
            }
        }
    }
}
