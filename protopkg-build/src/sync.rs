//! Copying generated code without touching unchanged files.
//!
//! protoc rewrites every output on each run, which bumps modification times
//! and makes downstream builds redo work. Generating into a scratch directory
//! and syncing from there keeps untouched files untouched.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::Error;

/// Copy every file below `from` to the same relative location below `to`,
/// skipping files whose destination already has identical bytes.
///
/// Returns the destinations that were written, sorted. Files below `to`
/// without a counterpart in `from` are left alone.
pub fn sync_tree(from: &Path, to: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut written = Vec::new();

    for entry in WalkDir::new(from).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(from) else {
            continue;
        };
        let destination = to.join(relative);

        let contents = fs::read(entry.path())?;
        if fs::read(&destination).is_ok_and(|existing| existing == contents) {
            debug!(destination = %destination.display(), "unchanged");
            continue;
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&destination, contents)?;
        debug!(destination = %destination.display(), "updated");
        written.push(destination);
    }

    Ok(written)
}
