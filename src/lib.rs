//! # ts
//!
//! Build tool for stanza collections. A stanza is a directory holding a
//! `metadata.json` descriptor, an `index.js` script and optional fragment
//! templates and assets; `ts` turns each one into a self-contained bundle that
//! registers a `togostanza-<name>` custom element, plus a listing page and an
//! aggregated metadata document for the whole collection.
//!
//! # Pipeline
//!
//! ```text
//! stanzas/                       dist/stanza/
//! ├── gene-attributes/   build   ├── index.html        (listing)
//! │   ├── metadata.json  ─────▶  ├── metadata.json     (aggregated)
//! │   ├── index.js               ├── assets/           (shared runtime)
//! │   └── templates/             └── gene-attributes/
//! └── widget-a/                      ├── index.html    (element bundle)
//!                                    ├── help.html
//!                                    ├── metadata.json (verbatim copy)
//!                                    └── assets/
//! ```
//!
//! Every build wipes and rewrites the output. The dev server avoids needless
//! work with a modification-time watermark: a request for a stanza page
//! rebuilds only when something under the base directory is newer than the
//! watermark recorded by the last build.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`provider`] | Discovers the collection, builds it, and decides when to rebuild |
//! | [`stanza`] | One stanza: descriptor, templates, page rendering, bundle output |
//! | [`metadata`] | `metadata.json` loading, raw and typed views |
//! | [`watermark`] | Newest-mtime scan of the source tree |
//! | [`assets`] | Recursive asset tree copy |
//! | [`resources`] | Compiled-in runtime script, stylesheets, shared assets, blueprint |
//! | [`naming`] | Stanza name rules and custom element naming |
//! | [`scaffold`] | `ts new`: a stanza directory from the blueprint |
//! | [`serve`] | Development HTTP server with rebuild-on-request |
//! | [`config`] | `ts.toml` loading and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Deterministic Output
//!
//! Stanzas are kept in a name-ordered map and templates are read into sorted
//! maps, so the listing, the aggregated document and every embedded
//! descriptor come out in the same order on every run. Two builds of an
//! unchanged tree are byte-identical.
//!
//! ## Self-Contained Binary
//!
//! The element runtime, stylesheets, shared assets and blueprint are compiled
//! in with `include_str!`. Nothing is read from the installation directory at
//! build time, and [`resources::verify`] checks the bundle once at startup.
//!
//! ## Maud For Pages
//!
//! Stanza pages, help pages and the listing are rendered with Maud. All
//! interpolation is escaped; the only raw insertions are the compiled-in
//! scripts, the author's `_header.html` and the descriptor JSON, which is
//! escaped for script context first.

pub mod assets;
pub mod config;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod provider;
pub mod resources;
pub mod scaffold;
pub mod serve;
pub mod stanza;
pub mod watermark;

#[cfg(test)]
pub(crate) mod test_helpers;
