//! Dotted package names and the root-package remap.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::Error;
use crate::syntax;

/// A `.`-separated package name such as `a.b.c`.
///
/// Names parsed from text are validated, names derived from directory
/// layouts are taken as they are and may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageName {
    components: Vec<String>,
}

impl PackageName {
    /// Parse and validate a dotted name.
    pub fn parse(name: &str) -> Result<Self, Error> {
        if !syntax::is_package_name(name) {
            return Err(Error::InvalidPackageName(name.to_string()));
        }
        Ok(Self::from_components(name.split('.')))
    }

    pub fn from_components<I, S>(components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            components: components.into_iter().map(Into::into).collect(),
        }
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Returns `true` if `components` begins with this whole name.
    pub fn is_prefix_of<S: AsRef<str>>(&self, components: &[S]) -> bool {
        self.len() <= components.len()
            && self
                .components
                .iter()
                .zip(components)
                .all(|(ours, theirs)| ours == theirs.as_ref())
    }

    /// Join the components with `separator`.
    pub fn join(&self, separator: &str) -> String {
        self.components.join(separator)
    }

    /// Relative directory for this package, one segment per component.
    pub fn to_path(&self) -> PathBuf {
        self.components.iter().collect()
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join("."))
    }
}

impl FromStr for PackageName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// The package prefix a rewrite session forces onto every file.
///
/// An empty root package disables forcing: [`RootPackage::remap`] is then the
/// identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootPackage(PackageName);

impl RootPackage {
    /// Validate `name`, the empty string means "no root package".
    pub fn new(name: &str) -> Result<Self, Error> {
        if name.is_empty() {
            return Ok(Self::default());
        }
        PackageName::parse(name).map(Self)
    }

    pub fn package(&self) -> &PackageName {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if `components` already start with the whole root package.
    pub fn is_prefix_of<S: AsRef<str>>(&self, components: &[S]) -> bool {
        !self.is_empty() && self.0.is_prefix_of(components)
    }

    /// Move `package` under the root package.
    ///
    /// Leading components that appear anywhere in the root package are
    /// dropped before the root is prepended, so remapping is idempotent:
    /// `remap(remap(p)) == remap(p)`.
    pub fn remap(&self, package: &PackageName) -> PackageName {
        if self.is_empty() {
            return package.clone();
        }

        let root = self.0.components();
        let rest = package
            .components()
            .iter()
            .skip_while(|component| root.contains(*component));
        PackageName::from_components(root.iter().chain(rest).cloned())
    }
}

impl fmt::Display for RootPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for RootPackage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
