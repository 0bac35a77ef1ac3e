//! The rewrite session.
//!
//! A [`Rewriter`] reads every `.proto` file below a set of roots into memory,
//! moves each file's package under the forced root package, fixes `import`
//! and `package` statements to match, and writes the result to
//! `<output root>/<package path>/<file name>`.

mod imports;
mod packages;

pub use imports::{UnresolvedImport, UnresolvedImports};

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};

use crate::Error;
use crate::discover;
use crate::package::{PackageName, RootPackage};
use crate::syntax;

use self::packages::PackageRemap;

/// Lifecycle of a [`Rewriter`].
///
/// Once sources are read the passes may run in any order, for example
/// [`Rewriter::fix_packages`] before [`Rewriter::fix_imports`]. The stage
/// records the furthest pass reached and a later, earlier-stage pass never
/// moves it back. A dry-run write leaves it unchanged. Only
/// [`Rewriter::read`] starts over at [`Stage::Read`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Stage {
    #[default]
    Uninitialized,
    Read,
    ImportsFixed,
    PackagesFixed,
    Written,
}

/// A source file of the working set.
#[derive(Debug, Clone)]
pub(crate) struct SourceFile {
    /// The search root the file was discovered under.
    root: PathBuf,
    /// Current, possibly rewritten, text.
    text: String,
}

/// Rewrites `.proto` sources so their packages form one namespace below a
/// root package.
///
/// ```no_run
/// use protopkg::{RootPackage, Rewriter};
///
/// # fn main() -> Result<(), protopkg::Error> {
/// Rewriter::new(RootPackage::new("my.proto")?)
///     .set_output_root("build/proto")
///     .read(&["proto/"])?
///     .fix_imports()?
///     .fix_packages()?
///     .write(false)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Rewriter {
    root_package: RootPackage,
    output_root: PathBuf,
    sources: BTreeMap<PathBuf, SourceFile>,
    stage: Stage,
    unresolved: UnresolvedImports,
}

impl Default for Rewriter {
    fn default() -> Self {
        Self::new(RootPackage::default())
    }
}

impl Rewriter {
    /// Create a session writing below the current directory.
    pub fn new(root_package: RootPackage) -> Self {
        Self {
            root_package,
            output_root: PathBuf::from("."),
            sources: BTreeMap::new(),
            stage: Stage::Uninitialized,
            unresolved: UnresolvedImports::default(),
        }
    }

    pub fn root_package(&self) -> &RootPackage {
        &self.root_package
    }

    /// Validate and set the root package, the empty string disables forcing.
    pub fn set_root_package(&mut self, name: &str) -> Result<&mut Self, Error> {
        self.root_package = RootPackage::new(name)?;
        Ok(self)
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn set_output_root(&mut self, output_root: impl Into<PathBuf>) -> &mut Self {
        self.output_root = output_root.into();
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Paths of the working set, sorted.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.sources.keys().map(PathBuf::as_path)
    }

    /// Current text of a working-set file.
    pub fn content(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.sources
            .get(path.as_ref())
            .map(|source| source.text.as_str())
    }

    /// The report of the last [`Rewriter::fix_imports`] call.
    pub fn unresolved_imports(&self) -> &UnresolvedImports {
        &self.unresolved
    }

    /// Read every `.proto` file below `roots`, replacing the working set.
    ///
    /// Fails without touching the current working set if any root is not a
    /// directory or contains no `.proto` file.
    pub fn read(&mut self, roots: &[impl AsRef<Path>]) -> Result<&mut Self, Error> {
        let mut found = Vec::new();
        let mut empty = Vec::new();
        for root in roots {
            let root = root.as_ref();
            let files = discover::find_proto_files(root)?;
            if files.is_empty() {
                empty.push(root.to_path_buf());
            } else {
                found.push((root, files));
            }
        }
        if !empty.is_empty() || found.is_empty() {
            return Err(Error::NoSourceFiles { roots: empty });
        }

        let mut sources = BTreeMap::new();
        for (root, files) in found {
            for path in files {
                // A file below two roots stays with the first one.
                if sources.contains_key(&path) {
                    continue;
                }
                let text = fs::read_to_string(&path).map_err(|err| Error::io(&path, err))?;
                debug!(path = %path.display(), root = %root.display(), "read source");
                sources.insert(
                    path,
                    SourceFile {
                        root: root.to_path_buf(),
                        text,
                    },
                );
            }
        }

        info!(files = sources.len(), roots = roots.len(), "read proto sources");
        self.sources = sources;
        self.unresolved = UnresolvedImports::default();
        self.stage = Stage::Read;
        Ok(self)
    }

    /// Effective package of a working-set file.
    pub fn effective_package(&self, path: impl AsRef<Path>) -> Option<PackageName> {
        let path = path.as_ref();
        self.sources
            .get(path)
            .map(|source| self.package_of(path, source))
    }

    /// Effective package of every working-set file.
    pub fn calculated_packages(&self) -> BTreeMap<PathBuf, PackageName> {
        self.sources
            .iter()
            .map(|(path, source)| (path.clone(), self.package_of(path, source)))
            .collect()
    }

    /// Destination of every working-set file, as `(source, destination)`.
    pub fn planned_outputs(&self) -> Vec<(PathBuf, PathBuf)> {
        self.calculated_packages()
            .into_iter()
            .filter_map(|(path, package)| {
                let file_name = path.file_name()?;
                let destination = self.output_root.join(package.to_path()).join(file_name);
                Some((path, destination))
            })
            .collect()
    }

    /// Point every import at the output location of the file it references.
    ///
    /// Imports are resolved against the importing file's search root. If any
    /// import cannot be resolved no file is changed at all; the failures are
    /// logged as one warning and kept in [`Rewriter::unresolved_imports`].
    pub fn fix_imports(&mut self) -> Result<&mut Self, Error> {
        self.ensure_read()?;
        if let Err(report) = self.resolve_imports() {
            warn!("{report}");
        }
        Ok(self)
    }

    /// Like [`Rewriter::fix_imports`], but unresolved imports are an error.
    pub fn try_fix_imports(&mut self) -> Result<&mut Self, Error> {
        self.ensure_read()?;
        self.resolve_imports().map_err(Error::UnresolvedImports)?;
        Ok(self)
    }

    /// Move `package` statements and qualified references of every declared
    /// package below the root package.
    ///
    /// An import directory is remapped too, but only when the remapped path
    /// is the output location of a working-set file. Imports the imports pass
    /// left alone are therefore never pointed at files that will not exist.
    pub fn fix_packages(&mut self) -> Result<&mut Self, Error> {
        self.ensure_read()?;

        let declared: BTreeSet<PackageName> = self
            .sources
            .values()
            .flat_map(|source| syntax::find_package_declarations(&source.text))
            .map(|declaration| declaration.package)
            .collect();
        let locations = imports::output_locations(&self.calculated_packages());
        let remap = PackageRemap::new(&self.root_package, declared, locations);

        let mut changed = 0;
        for (path, source) in self.sources.iter_mut() {
            if let Some(text) = remap.apply(&source.text) {
                debug!(path = %path.display(), "fixed packages");
                source.text = text;
                changed += 1;
            }
        }

        info!(changed, root_package = %self.root_package, "fixed package declarations");
        self.advance(Stage::PackagesFixed);
        Ok(self)
    }

    /// Write the working set below the output root.
    ///
    /// With `dry_run` nothing is touched on disk. A failure stops the pass,
    /// files written before it stay in place.
    pub fn write(&mut self, dry_run: bool) -> Result<&mut Self, Error> {
        self.ensure_read()?;

        let outputs = self.planned_outputs();
        let mut seen: HashMap<&Path, &Path> = HashMap::new();
        for (source, destination) in &outputs {
            if let Some(previous) = seen.insert(destination.as_path(), source.as_path()) {
                warn!(
                    destination = %destination.display(),
                    "{} and {} map to the same output, the latter wins",
                    previous.display(),
                    source.display()
                );
            }
        }

        for (source, destination) in &outputs {
            if dry_run {
                info!(
                    source = %source.display(),
                    "dry run, not writing {}",
                    destination.display()
                );
                continue;
            }

            if let Some(directory) = destination.parent() {
                fs::create_dir_all(directory).map_err(|err| Error::io(directory, err))?;
            }
            let text = self
                .content(source)
                .ok_or_else(|| Error::io(source, std::io::ErrorKind::NotFound.into()))?;
            fs::write(destination, text).map_err(|err| Error::io(destination, err))?;
            debug!(destination = %destination.display(), "wrote source");
        }

        if !dry_run {
            info!(files = outputs.len(), output_root = %self.output_root.display(), "wrote proto sources");
            self.advance(Stage::Written);
        }
        Ok(self)
    }

    fn resolve_imports(&mut self) -> Result<(), UnresolvedImports> {
        let packages = self.calculated_packages();
        match imports::resolve(&self.sources, &packages) {
            Ok(rewritten) => {
                let changed = rewritten.len();
                for (path, edits) in rewritten {
                    if let Some(source) = self.sources.get_mut(&path) {
                        source.text = syntax::splice(&source.text, edits);
                    }
                }
                info!(changed, "fixed imports");
                self.unresolved = UnresolvedImports::default();
                self.advance(Stage::ImportsFixed);
                Ok(())
            }
            Err(report) => {
                self.unresolved = report.clone();
                Err(report)
            }
        }
    }

    fn package_of(&self, path: &Path, source: &SourceFile) -> PackageName {
        if let Some(declaration) = syntax::find_package_declaration(&source.text) {
            return self.root_package.remap(&declaration.package);
        }

        let relative = path.strip_prefix(&source.root).unwrap_or(path);
        let directories = relative
            .parent()
            .into_iter()
            .flat_map(Path::components)
            .filter_map(|component| match component {
                Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
                _ => None,
            });
        self.root_package
            .remap(&PackageName::from_components(directories))
    }

    fn ensure_read(&self) -> Result<(), Error> {
        if self.stage == Stage::Uninitialized {
            return Err(Error::NotRead);
        }
        Ok(())
    }

    fn advance(&mut self, stage: Stage) {
        self.stage = self.stage.max(stage);
    }
}
