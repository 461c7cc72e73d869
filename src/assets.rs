//! Static asset mirroring.
//!
//! A stanza's `assets/` subtree is copied into its output bundle with the same
//! relative structure. The walk is iterative (`walkdir`), so asset tree depth
//! never turns into call-stack depth.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("cannot walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("cannot copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

/// Counts of what a copy produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub files: usize,
    pub dirs: usize,
}

/// Mirror `src` into `dest`.
///
/// A missing `src` is not an error: nothing is copied. Existing files in
/// `dest` are overwritten; files in `dest` with no source counterpart are
/// left alone.
pub fn copy_tree(src: &Path, dest: &Path) -> Result<CopyStats, AssetError> {
    let mut stats = CopyStats::default();
    if !src.is_dir() {
        return Ok(stats);
    }

    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.map_err(|source| AssetError::Walk {
            path: src.to_path_buf(),
            source,
        })?;
        // Every walked path lives under `src`.
        let rel = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dest.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|source| AssetError::Copy {
                from: entry.path().to_path_buf(),
                to: target.clone(),
                source,
            })?;
            stats.dirs += 1;
        } else {
            fs::copy(entry.path(), &target).map_err(|source| AssetError::Copy {
                from: entry.path().to_path_buf(),
                to: target.clone(),
                source,
            })?;
            stats.files += 1;
        }
    }
    Ok(stats)
}
