//! New stanza scaffolding.
//!
//! `ts new <name>` writes the embedded blueprint into `<base_dir>/<name>/`,
//! replacing every `{{name}}` placeholder with the stanza name. Other
//! mustache placeholders (`{{greeting}}` in the blueprint template) are left
//! for the runtime.

use crate::naming;
use crate::resources::{self, ResourceError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const BLUEPRINT_PREFIX: &str = "blueprint/";
const NAME_PLACEHOLDER: &str = "{{name}}";

#[derive(Error, Debug)]
pub enum ScaffoldError {
    #[error("invalid stanza name: {0}")]
    InvalidName(String),
    #[error("{0} already exists")]
    AlreadyExists(PathBuf),
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

/// Files written for a new stanza, relative to its directory.
pub fn files() -> Vec<&'static str> {
    resources::BLUEPRINT
        .iter()
        .map(|path| path.strip_prefix(BLUEPRINT_PREFIX).unwrap_or(path))
        .collect()
}

/// Create `<base_dir>/<name>` from the blueprint. Returns the new directory.
///
/// Fails without writing anything when the name is invalid or the directory
/// already exists.
pub fn create(base_dir: &Path, name: &str) -> Result<PathBuf, ScaffoldError> {
    naming::validate_stanza_name(name).map_err(ScaffoldError::InvalidName)?;

    let dir = base_dir.join(name);
    if dir.exists() {
        return Err(ScaffoldError::AlreadyExists(dir));
    }

    for logical in resources::BLUEPRINT {
        let contents = resources::get(logical)?.replace(NAME_PLACEHOLDER, name);
        let relative = logical.strip_prefix(BLUEPRINT_PREFIX).unwrap_or(logical);
        let target = dir.join(relative);
        let write_err = |source| ScaffoldError::Write {
            path: target.clone(),
            source,
        };
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(&target, contents).map_err(write_err)?;
    }

    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata;
    use crate::stanza::Stanza;
    use tempfile::TempDir;

    #[test]
    fn creates_blueprint_files() {
        let tmp = TempDir::new().unwrap();
        let dir = create(tmp.path(), "hello").unwrap();

        assert_eq!(dir, tmp.path().join("hello"));
        for file in files() {
            assert!(dir.join(file).is_file(), "{file}");
        }
    }

    #[test]
    fn substitutes_name() {
        let tmp = TempDir::new().unwrap();
        let dir = create(tmp.path(), "hello").unwrap();

        let (meta, _) = metadata::load(&dir.join("metadata.json")).unwrap();
        assert_eq!(meta.id, "hello");
        assert_eq!(meta.label, "hello");
        assert!(meta.usage.contains("<togostanza-hello"));

        let template = fs::read_to_string(dir.join("templates/stanza.html")).unwrap();
        assert!(template.contains("{{greeting}}"));
        assert!(!template.contains("{{name}}"));
    }

    #[test]
    fn scaffolded_stanza_builds() {
        let tmp = TempDir::new().unwrap();
        let dir = create(tmp.path(), "hello").unwrap();

        let stanza = Stanza::new(&dir, "hello").unwrap().unwrap();
        let built = stanza.build(&tmp.path().join("out"), false).unwrap();
        assert_eq!(built.element_name, "togostanza-hello");
        assert_eq!(built.templates, 1);
    }

    #[test]
    fn rejects_invalid_name() {
        let tmp = TempDir::new().unwrap();
        let err = create(tmp.path(), "Hello").unwrap_err();
        assert!(matches!(err, ScaffoldError::InvalidName(_)));
        assert!(!tmp.path().join("Hello").exists());
    }

    #[test]
    fn refuses_existing_directory() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("hello")).unwrap();
        fs::write(tmp.path().join("hello/keep.txt"), "mine").unwrap();

        let err = create(tmp.path(), "hello").unwrap_err();
        assert!(matches!(err, ScaffoldError::AlreadyExists(_)));
        assert!(!tmp.path().join("hello/metadata.json").exists());
    }

    #[test]
    fn file_list_is_relative() {
        assert_eq!(
            files(),
            vec!["metadata.json", "index.js", "templates/stanza.html"]
        );
    }
}
