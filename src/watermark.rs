//! Source-tree staleness tracking.
//!
//! The watermark is the newest modification time of anything under the stanza
//! base directory: files and directories alike, so additions and deletions
//! (which touch the parent directory) count too. The output directory is
//! pruned when it lives inside the base directory, otherwise every build
//! would advance the watermark it is compared against.
//!
//! This is a whole-tree check: touching any single file makes the next
//! comparison report the collection as stale, and the whole collection is
//! rebuilt.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum WatermarkError {
    #[error("cannot scan {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("cannot read modification time of {path}: {source}")]
    Mtime {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Newest modification time under `base_dir`, skipping the top-level entry
/// named `exclude`.
///
/// An empty tree reports the mtime of `base_dir` itself.
pub fn scan(base_dir: &Path, exclude: Option<&OsString>) -> Result<SystemTime, WatermarkError> {
    let walker = WalkDir::new(base_dir).into_iter().filter_entry(|entry| {
        !(entry.depth() == 1 && exclude.is_some_and(|name| entry.file_name() == name.as_os_str()))
    });

    let mut newest = SystemTime::UNIX_EPOCH;
    for entry in walker {
        let entry = entry.map_err(|source| WatermarkError::Walk {
            path: base_dir.to_path_buf(),
            source,
        })?;
        let modified = entry
            .metadata()
            .map_err(|source| WatermarkError::Walk {
                path: entry.path().to_path_buf(),
                source,
            })?
            .modified()
            .map_err(|source| WatermarkError::Mtime {
                path: entry.path().to_path_buf(),
                source,
            })?;
        if modified > newest {
            newest = modified;
        }
    }
    Ok(newest)
}

/// Top-level directory name to prune so that `dist_dir` is not scanned.
///
/// Both paths are made absolute (symlinks are not resolved). Returns `None`
/// when `dist_dir` is outside `base_dir` or is `base_dir` itself.
pub fn excluded_dir(base_dir: &Path, dist_dir: &Path) -> Option<OsString> {
    let base = std::path::absolute(base_dir).ok()?;
    let dist = std::path::absolute(dist_dir).ok()?;
    match dist.strip_prefix(&base).ok()?.components().next()? {
        Component::Normal(name) => Some(name.to_os_string()),
        _ => None,
    }
}

/// True when `current` is strictly newer than `previous`.
pub fn is_stale(previous: SystemTime, current: SystemTime) -> bool {
    current > previous
}
