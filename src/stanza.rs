//! A single stanza: one source directory, one output bundle.
//!
//! ## Source layout
//!
//! ```text
//! gene-attributes/
//! ├── metadata.json        # required; its presence makes the directory a stanza
//! ├── index.js             # required at build time; the stanza script
//! ├── _header.html         # optional; injected verbatim into the page head
//! ├── templates/           # optional fragment templates, keyed by file name
//! │   ├── stanza.html
//! │   └── stanza.rq
//! └── assets/              # optional static files, mirrored as-is
//!     └── logo.svg
//! ```
//!
//! ## Output bundle
//!
//! ```text
//! <dest>/
//! ├── index.html           # runtime + descriptor JSON + index.js + header
//! ├── help.html            # documentation page
//! ├── metadata.json        # byte-for-byte copy of the source descriptor
//! └── assets/              # mirrored asset tree
//! ```
//!
//! ## The descriptor
//!
//! The page defines a global `descriptor` object read by the runtime:
//!
//! ```json
//! {
//!   "templates": {"stanza.html": "<p>{{x}}</p>"},
//!   "parameters": ["x"],
//!   "elementName": "togostanza-widget-a",
//!   "stylesheet": "...",
//!   "development": false
//! }
//! ```
//!
//! Templates are collected into a sorted map and nothing time-dependent is
//! rendered, so building twice from the same sources yields identical bytes.

use crate::assets::{self, AssetError};
use crate::metadata::{self, Metadata, MetadataError};
use crate::naming;
use crate::resources::{self, ResourceError};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Parser, html as md_html};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const METADATA_FILE: &str = "metadata.json";
pub const SCRIPT_FILE: &str = "index.js";
pub const HEADER_FILE: &str = "_header.html";
pub const TEMPLATES_DIR: &str = "templates";
pub const ASSETS_DIR: &str = "assets";

#[derive(Error, Debug)]
pub enum StanzaError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error("cannot read stanza script {path}: {source}")]
    Script {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error(transparent)]
    Assets(#[from] AssetError),
}

/// Attach a path to an IO error.
fn io_at(path: &Path) -> impl FnOnce(std::io::Error) -> StanzaError {
    move |source| StanzaError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// A discovered stanza.
#[derive(Debug, Clone)]
pub struct Stanza {
    base_dir: PathBuf,
    name: String,
    metadata: Metadata,
    metadata_raw: serde_json::Value,
}

/// Result of building one stanza.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltStanza {
    pub name: String,
    pub element_name: String,
    pub templates: usize,
    pub assets: usize,
}

/// A stanza's pages, rendered in memory.
#[derive(Debug, Clone)]
pub struct RenderedStanza {
    index_html: String,
    help_html: String,
    templates: usize,
}

/// The object serialized into every stanza page.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Descriptor<'a> {
    templates: BTreeMap<String, String>,
    parameters: Vec<String>,
    element_name: String,
    stylesheet: &'a str,
    development: bool,
}

impl Stanza {
    /// Probe `base_dir` for a descriptor.
    ///
    /// Returns `Ok(None)` when there is no `metadata.json` (the directory is
    /// not a stanza), and an error when it exists but cannot be parsed.
    pub fn new(base_dir: &Path, name: &str) -> Result<Option<Self>, StanzaError> {
        let metadata_path = base_dir.join(METADATA_FILE);
        if !metadata_path.is_file() {
            return Ok(None);
        }
        let (metadata, metadata_raw) = metadata::load(&metadata_path)?;
        Ok(Some(Self {
            base_dir: base_dir.to_path_buf(),
            name: name.to_string(),
            metadata,
            metadata_raw,
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// The descriptor exactly as parsed, unknown fields included.
    pub fn metadata_raw(&self) -> &serde_json::Value {
        &self.metadata_raw
    }

    pub fn element_name(&self) -> String {
        naming::element_name(&self.name)
    }

    pub fn label(&self) -> &str {
        self.metadata.display_label(&self.name)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.base_dir.join(METADATA_FILE)
    }

    pub fn script_path(&self) -> PathBuf {
        self.base_dir.join(SCRIPT_FILE)
    }

    pub fn header_path(&self) -> PathBuf {
        self.base_dir.join(HEADER_FILE)
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.base_dir.join(TEMPLATES_DIR)
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.base_dir.join(ASSETS_DIR)
    }

    /// Write the output bundle into `dest`.
    ///
    /// Safe to call repeatedly: every file the stanza owns is rewritten, and
    /// nothing outside `dest` is touched.
    pub fn build(&self, dest: &Path, development: bool) -> Result<BuiltStanza, StanzaError> {
        let rendered = self.render(development)?;
        self.write(&rendered, dest)
    }

    /// Read the script, templates and header and render both pages, without
    /// writing anything.
    pub fn render(&self, development: bool) -> Result<RenderedStanza, StanzaError> {
        let templates = self.templates()?;
        let template_count = templates.len();
        Ok(RenderedStanza {
            index_html: self.render_index_html(templates, development)?,
            help_html: self.render_help_html()?,
            templates: template_count,
        })
    }

    /// Write rendered pages, the descriptor copy and the asset tree into `dest`.
    pub fn write(
        &self,
        rendered: &RenderedStanza,
        dest: &Path,
    ) -> Result<BuiltStanza, StanzaError> {
        fs::create_dir_all(dest).map_err(io_at(dest))?;

        let index_path = dest.join("index.html");
        fs::write(&index_path, &rendered.index_html).map_err(io_at(&index_path))?;

        let help_path = dest.join("help.html");
        fs::write(&help_path, &rendered.help_html).map_err(io_at(&help_path))?;

        let metadata_dest = dest.join(METADATA_FILE);
        fs::copy(self.metadata_path(), &metadata_dest).map_err(io_at(&metadata_dest))?;

        let copied = assets::copy_tree(&self.assets_dir(), &dest.join(ASSETS_DIR))?;

        Ok(BuiltStanza {
            name: self.name.clone(),
            element_name: self.element_name(),
            templates: rendered.templates,
            assets: copied.files,
        })
    }

    /// Fragment templates: every regular file directly under `templates/`,
    /// keyed by file name.
    pub fn templates(&self) -> Result<BTreeMap<String, String>, StanzaError> {
        let dir = self.templates_dir();
        let mut templates = BTreeMap::new();
        if !dir.is_dir() {
            return Ok(templates);
        }
        for entry in fs::read_dir(&dir).map_err(io_at(&dir))? {
            let path = entry.map_err(io_at(&dir))?.path();
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name() else {
                continue;
            };
            let content = read_text(&path).map_err(io_at(&path))?;
            templates.insert(file_name.to_string_lossy().into_owned(), content);
        }
        Ok(templates)
    }

    /// Contents of `_header.html`, or an empty string when absent.
    fn header_html(&self) -> Result<String, StanzaError> {
        let path = self.header_path();
        if !path.exists() {
            return Ok(String::new());
        }
        read_text(&path).map_err(io_at(&path))
    }

    /// Serialized descriptor, safe to inline into a `<script>` element.
    fn descriptor_json(
        &self,
        templates: BTreeMap<String, String>,
        development: bool,
    ) -> Result<String, StanzaError> {
        let descriptor = Descriptor {
            templates,
            parameters: self.metadata.parameter_keys(),
            element_name: self.element_name(),
            stylesheet: resources::get(resources::STANZA_STYLESHEET)?,
            development,
        };
        Ok(script_safe_json(&serde_json::to_string(&descriptor)?))
    }

    fn render_index_html(
        &self,
        templates: BTreeMap<String, String>,
        development: bool,
    ) -> Result<String, StanzaError> {
        let script_path = self.script_path();
        let script = read_text(&script_path).map_err(|source| StanzaError::Script {
            path: script_path.clone(),
            source,
        })?;
        let page = StanzaPage {
            title: self.label(),
            runtime: resources::get(resources::STANZA_RUNTIME)?,
            descriptor_json: &self.descriptor_json(templates, development)?,
            script: &script,
            header_html: &self.header_html()?,
        };
        Ok(render_stanza_page(&page).into_string())
    }

    fn render_help_html(&self) -> Result<String, StanzaError> {
        let stylesheet = resources::get(resources::HELP_STYLESHEET)?;
        Ok(render_help_page(self, stylesheet).into_string())
    }
}

/// Read a source file as text. Invalid UTF-8 sequences become U+FFFD.
fn read_text(path: &Path) -> std::io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Escape characters that could end a `<script>` element or break a
/// JavaScript string literal. The result is still valid JSON.
pub fn script_safe_json(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(c),
        }
    }
    out
}

// ============================================================================
// Page templates
// ============================================================================

struct StanzaPage<'a> {
    title: &'a str,
    runtime: &'a str,
    descriptor_json: &'a str,
    script: &'a str,
    header_html: &'a str,
}

/// The stanza page. Loads the shared runtime assets from the collection root,
/// one level up.
fn render_stanza_page(page: &StanzaPage) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                title { (page.title) }
                script src="../assets/js/webcomponents-loader.js" {}
                script src="../assets/js/template.js" {}
                script { "var descriptor = " (PreEscaped(page.descriptor_json)) ";" }
                script { (PreEscaped(page.runtime)) }
                script { (PreEscaped(page.script)) }
                (PreEscaped(page.header_html))
            }
            body {}
        }
    }
}

/// Embed snippet built from parameter examples, shown when a stanza has no
/// usage text of its own.
fn embed_snippet(stanza: &Stanza) -> String {
    let element = stanza.element_name();
    let attrs: String = stanza
        .metadata
        .parameters
        .iter()
        .filter(|p| !p.key.is_empty())
        .map(|p| format!(" {}=\"{}\"", p.key, p.example))
        .collect();
    format!("<{element}{attrs}></{element}>")
}

fn render_help_page(stanza: &Stanza, stylesheet: &str) -> Markup {
    let meta = stanza.metadata();
    let tags = meta.tags();

    let mut definition_html = String::new();
    md_html::push_html(&mut definition_html, Parser::new(&meta.definition));

    let usage = if meta.usage.trim().is_empty() {
        embed_snippet(stanza)
    } else {
        meta.usage.clone()
    };

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (stanza.label()) " – help" }
                style { (PreEscaped(stylesheet)) }
            }
            body {
                header.stanza-header {
                    h1 { (stanza.label()) }
                    p.element-name { "<" (stanza.element_name()) ">" }
                    @if !meta.id.is_empty() {
                        p.stanza-id { (meta.id) }
                    }
                    @if !tags.is_empty() {
                        ul.tags {
                            @for tag in &tags {
                                li { (tag) }
                            }
                        }
                    }
                }
                main {
                    @if !meta.definition.trim().is_empty() {
                        section.definition {
                            (PreEscaped(definition_html))
                        }
                    }
                    section {
                        h2 { "Parameters" }
                        @if meta.parameters.is_empty() {
                            p.none { "This stanza takes no parameters." }
                        } @else {
                            table.parameters {
                                thead {
                                    tr {
                                        th { "Key" }
                                        th { "Description" }
                                        th { "Example" }
                                        th { "Required" }
                                    }
                                }
                                tbody {
                                    @for param in &meta.parameters {
                                        tr {
                                            td { code { (param.key) } }
                                            td { (param.description) }
                                            td { (param.example) }
                                            td { @if param.required { "yes" } @else { "no" } }
                                        }
                                    }
                                }
                            }
                        }
                    }
                    section {
                        h2 { "Usage" }
                        pre.usage { code { (usage) } }
                    }
                    p.links {
                        a href="./" { "Open stanza" }
                        " · "
                        a href="metadata.json" { "metadata.json" }
                        " · "
                        a href="../" { "All stanzas" }
                    }
                }
            }
        }
    }
}
