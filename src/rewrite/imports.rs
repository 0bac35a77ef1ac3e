//! Resolution of import statements against the working set.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::package::PackageName;
use crate::rewrite::SourceFile;
use crate::syntax;

/// Import statements of one file that point outside the working set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedImport {
    pub file: PathBuf,
    pub statements: Vec<String>,
}

/// Every unresolved import of one `fix_imports` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnresolvedImports(Vec<UnresolvedImport>);

impl UnresolvedImports {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UnresolvedImport> {
        self.0.iter()
    }
}

impl fmt::Display for UnresolvedImports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for unresolved in &self.0 {
            writeln!(
                f,
                "Can't resolve imports [{}] from file {}",
                unresolved.statements.join(", "),
                unresolved.file.display()
            )?;
        }
        write!(
            f,
            "Make sure the respective files are also included for rewriting"
        )
    }
}

/// Location of a file below the output root, as an import path.
pub(crate) fn output_import_path(package: &PackageName, file_name: &str) -> String {
    syntax::join_import_path(
        package.components().iter().map(String::as_str),
        file_name,
    )
}

/// Output location of every file, as import paths.
pub(crate) fn output_locations(
    packages: &BTreeMap<PathBuf, PackageName>,
) -> HashSet<String> {
    packages
        .iter()
        .filter_map(|(path, package)| {
            let file_name = file_name(path)?;
            Some(output_import_path(package, file_name))
        })
        .collect()
}

/// Rewritten import paths of every file, or the imports that failed.
///
/// An import resolves if `<root>/<quoted path>` is in the working set, or if
/// the quoted path already is the output location of a working-set file.
pub(crate) fn resolve(
    sources: &BTreeMap<PathBuf, SourceFile>,
    packages: &BTreeMap<PathBuf, PackageName>,
) -> Result<BTreeMap<PathBuf, Vec<(Range<usize>, String)>>, UnresolvedImports> {
    let locations = output_locations(packages);

    let mut rewritten = BTreeMap::new();
    let mut unresolved = Vec::new();

    for (path, source) in sources {
        let mut edits = Vec::new();
        let mut failed = Vec::new();

        for import in syntax::find_imports(&source.text) {
            let target = source.root.join(import.relative_path());
            let resolved = match packages.get(&target) {
                Some(package) => Some(output_import_path(package, &import.file_name)),
                None => Some(import.path()).filter(|path| locations.contains(path)),
            };
            match resolved {
                Some(resolved) => edits.push((import.path_span, resolved)),
                None => failed.push(import.statement),
            }
        }

        if !failed.is_empty() {
            unresolved.push(UnresolvedImport {
                file: path.clone(),
                statements: failed,
            });
        }
        if !edits.is_empty() {
            rewritten.insert(path.clone(), edits);
        }
    }

    if unresolved.is_empty() {
        Ok(rewritten)
    } else {
        Err(UnresolvedImports(unresolved))
    }
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|name| name.to_str())
}
