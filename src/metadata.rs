//! Stanza descriptor loading.
//!
//! Every stanza directory carries a `metadata.json` describing the component
//! in a JSON-LD flavoured vocabulary:
//!
//! ```json
//! {
//!   "@id": "gene-attributes",
//!   "stanza:label": "Gene attributes",
//!   "stanza:definition": "Shows basic attributes of a gene.",
//!   "stanza:parameters": [
//!     { "stanza:key": "tax_id", "stanza:example": "9606", "stanza:required": true }
//!   ],
//!   "stanza:usage": "<togostanza-gene-attributes tax_id=\"9606\"></togostanza-gene-attributes>",
//!   "stanza:context": "Gene",
//!   "stanza:display": "Table",
//!   "stanza:license": "MIT"
//! }
//! ```
//!
//! The loader produces two views of the same file:
//!
//! - a typed [`Metadata`] record used to render pages and the descriptor, and
//! - the raw [`serde_json::Value`], kept verbatim for the aggregated collection
//!   document so that fields this crate does not know about survive.
//!
//! Nothing is validated beyond well-formedness: every field defaults when
//! absent or `null`, and unknown keys are ignored by the typed view.

use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed descriptor {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// One attribute exposed by the generated custom element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameter {
    #[serde(rename = "stanza:key", deserialize_with = "null_as_default")]
    pub key: String,
    #[serde(rename = "stanza:description", deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(rename = "stanza:example", deserialize_with = "null_as_default")]
    pub example: String,
    #[serde(rename = "stanza:required", deserialize_with = "null_as_default")]
    pub required: bool,
}

/// Typed view of a stanza's `metadata.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    #[serde(rename = "@id", deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(rename = "stanza:label", deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(rename = "stanza:parameters", deserialize_with = "null_items_as_default")]
    pub parameters: Vec<Parameter>,
    #[serde(rename = "stanza:definition", deserialize_with = "null_as_default")]
    pub definition: String,
    #[serde(rename = "stanza:usage", deserialize_with = "null_as_default")]
    pub usage: String,
    #[serde(rename = "stanza:context", deserialize_with = "null_as_default")]
    pub context: String,
    #[serde(rename = "stanza:display", deserialize_with = "null_as_default")]
    pub display: String,
    #[serde(rename = "stanza:license", deserialize_with = "null_as_default")]
    pub license: String,
}

impl Metadata {
    /// Parameter keys in declaration order. Duplicates are kept: the list is
    /// handed to the runtime as-is.
    pub fn parameter_keys(&self) -> Vec<String> {
        self.parameters.iter().map(|p| p.key.clone()).collect()
    }

    /// Classification tags for listing and help pages: the non-empty subset of
    /// context, display and license, in that order.
    pub fn tags(&self) -> Vec<&str> {
        [&self.context, &self.display, &self.license]
            .into_iter()
            .map(String::as_str)
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Label to show for this stanza, falling back to the directory name.
    pub fn display_label<'a>(&'a self, name: &'a str) -> &'a str {
        let label = self.label.trim();
        if label.is_empty() { name } else { label }
    }
}

/// Load a descriptor file.
///
/// The file is read once; the typed record is derived from the raw value so
/// both views always agree.
pub fn load(path: &Path) -> Result<(Metadata, serde_json::Value), MetadataError> {
    let content = fs::read_to_string(path).map_err(|source| MetadataError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&content).map_err(|source| MetadataError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// `null` reads as the field's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Like [`null_as_default`], applied to the list and to each of its items.
fn null_items_as_default<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    let items: Option<Vec<Option<T>>> = Option::deserialize(deserializer)?;
    Ok(items
        .unwrap_or_default()
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect())
}

fn parse(content: &str) -> Result<(Metadata, serde_json::Value), serde_json::Error> {
    let raw: serde_json::Value = serde_json::from_str(content)?;
    let metadata = Metadata::deserialize(&raw)?;
    Ok((metadata, raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FULL: &str = r#"{
        "@id": "gene-attributes",
        "stanza:label": "Gene attributes",
        "stanza:definition": "Shows **basic** attributes.",
        "stanza:parameters": [
            {"stanza:key": "tax_id", "stanza:description": "Taxonomy", "stanza:example": "9606", "stanza:required": true},
            {"stanza:key": "gene_id", "stanza:example": "1026"}
        ],
        "stanza:usage": "<togostanza-gene-attributes></togostanza-gene-attributes>",
        "stanza:context": "Gene",
        "stanza:display": "Table",
        "stanza:license": "MIT",
        "stanza:author": "DBCLS"
    }"#;

    #[test]
    fn parses_all_known_fields() {
        let (meta, _) = parse(FULL).unwrap();
        assert_eq!(meta.id, "gene-attributes");
        assert_eq!(meta.label, "Gene attributes");
        assert_eq!(meta.parameters.len(), 2);
        assert_eq!(meta.parameters[0].description, "Taxonomy");
        assert!(meta.parameters[0].required);
        assert!(!meta.parameters[1].required);
        assert_eq!(meta.context, "Gene");
        assert_eq!(meta.license, "MIT");
    }

    #[test]
    fn raw_value_keeps_unknown_fields() {
        let (_, raw) = parse(FULL).unwrap();
        assert_eq!(raw["stanza:author"], "DBCLS");
    }

    #[test]
    fn missing_fields_default() {
        let (meta, _) = parse(r#"{"@id": "a"}"#).unwrap();
        assert_eq!(meta.id, "a");
        assert!(meta.label.is_empty());
        assert!(meta.parameters.is_empty());
        assert!(meta.tags().is_empty());
    }

    #[test]
    fn parameter_keys_preserve_order_and_duplicates() {
        let (meta, _) = parse(
            r#"{"stanza:parameters": [
                {"stanza:key": "b"}, {"stanza:key": "a"}, {"stanza:key": "b"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(meta.parameter_keys(), vec!["b", "a", "b"]);
    }

    #[test]
    fn tags_skip_empty_and_keep_order() {
        let meta = Metadata {
            context: "Protein".into(),
            license: "CC-BY".into(),
            ..Default::default()
        };
        assert_eq!(meta.tags(), vec!["Protein", "CC-BY"]);
    }

    #[test]
    fn display_label_falls_back_to_name() {
        let mut meta = Metadata::default();
        assert_eq!(meta.display_label("widget"), "widget");
        meta.label = "Widget".into();
        assert_eq!(meta.display_label("widget"), "Widget");
    }

    #[test]
    fn null_fields_read_as_absent() {
        let (meta, raw) = parse(
            r#"{
                "@id": "w",
                "stanza:label": null,
                "stanza:definition": null,
                "stanza:license": null,
                "stanza:parameters": null
            }"#,
        )
        .unwrap();
        assert_eq!(meta.id, "w");
        assert!(meta.label.is_empty());
        assert!(meta.definition.is_empty());
        assert!(meta.parameters.is_empty());
        assert!(meta.tags().is_empty());
        assert!(raw["stanza:label"].is_null());
    }

    #[test]
    fn null_parameter_fields_read_as_absent() {
        let (meta, _) = parse(
            r#"{"stanza:parameters": [
                {"stanza:key": "x", "stanza:description": null, "stanza:example": null, "stanza:required": null},
                null
            ]}"#,
        )
        .unwrap();
        assert_eq!(meta.parameters.len(), 2);
        assert_eq!(meta.parameters[0].key, "x");
        assert!(meta.parameters[0].description.is_empty());
        assert!(!meta.parameters[0].required);
        assert_eq!(meta.parameters[1], Parameter::default());
        assert_eq!(meta.parameter_keys(), vec!["x", ""]);
    }

    #[test]
    fn load_reports_malformed_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("metadata.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, MetadataError::Parse { .. }));
        assert!(err.to_string().contains("metadata.json"));
    }

    #[test]
    fn load_reports_wrong_field_type() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("metadata.json");
        fs::write(&path, r#"{"stanza:parameters": "x"}"#).unwrap();

        assert!(matches!(load(&path), Err(MetadataError::Parse { .. })));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load(&dir.path().join("metadata.json")).unwrap_err();
        assert!(matches!(err, MetadataError::Read { .. }));
    }
}
