//! Discovery of `.proto` sources below search roots.

use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::Error;
use crate::syntax::PROTO_EXTENSION;

/// Recursively find `.proto` files below `root`, sorted by path.
///
/// A `root` that is not a directory yields no files.
pub fn find_proto_files(root: &Path) -> Result<Vec<PathBuf>, Error> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(root).to_path_buf();
            Error::io(path, io::Error::from(err))
        })?;
        let is_proto = entry
            .path()
            .extension()
            .is_some_and(|extension| extension == PROTO_EXTENSION);
        if entry.file_type().is_file() && is_proto {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// [`find_proto_files`] over several roots, without duplicates.
pub fn find_proto_files_in(roots: &[impl AsRef<Path>]) -> Result<Vec<PathBuf>, Error> {
    let mut files: Vec<PathBuf> = Vec::new();
    for root in roots {
        for file in find_proto_files(root.as_ref())? {
            if !files.contains(&file) {
                files.push(file);
            }
        }
    }
    Ok(files)
}
