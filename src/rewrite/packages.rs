//! Remapping of package-shaped text.
//!
//! Once a file moves under the root package, every place that spells one of
//! the declared packages has to follow: the `package` statement itself,
//! qualified type references such as `a.Message`, and directory prefixes of
//! import paths. [`PackageRemap`] is the single substitution used for all of
//! them. File names such as `foo.proto` look like qualified names but are
//! never touched, and an import path is only remapped onto the output
//! location of a known file.

use std::collections::{BTreeSet, HashSet};

use crate::package::{PackageName, RootPackage};
use crate::syntax;

pub(crate) struct PackageRemap<'a> {
    root: &'a RootPackage,
    /// Distinct declared packages, longest first.
    declared: Vec<PackageName>,
    /// Output locations of the working set, as import paths.
    locations: HashSet<String>,
}

impl<'a> PackageRemap<'a> {
    pub(crate) fn new(
        root: &'a RootPackage,
        declared: BTreeSet<PackageName>,
        locations: HashSet<String>,
    ) -> Self {
        let mut declared: Vec<_> = declared.into_iter().collect();
        declared.sort_by(|a, b| b.len().cmp(&a.len()));
        Self {
            root,
            declared,
            locations,
        }
    }

    /// Remap a component sequence that starts with a declared package.
    ///
    /// Sequences already below the root package are left alone. With `strict`
    /// the declared package must be followed by at least one more component.
    fn remap_prefix(&self, components: &[&str], strict: bool) -> Option<Vec<String>> {
        if self.root.is_empty() || self.root.is_prefix_of(components) {
            return None;
        }

        let declared = self.declared.iter().find(|declared| {
            let room = if strict {
                declared.len() < components.len()
            } else {
                declared.len() <= components.len()
            };
            room && declared.is_prefix_of(components)
        })?;

        let mut remapped = self.root.remap(declared).components().to_vec();
        remapped.extend(components[declared.len()..].iter().map(|c| c.to_string()));
        Some(remapped)
    }

    /// Rewrite every package-shaped occurrence in `text`.
    ///
    /// Returns `None` if nothing changed.
    pub(crate) fn apply(&self, text: &str) -> Option<String> {
        if self.root.is_empty() {
            return None;
        }

        let imports = syntax::find_imports(text);
        let declarations: Vec<_> = syntax::find_package_declarations(text).collect();
        let mut edits = Vec::new();

        for import in &imports {
            let directory: Vec<&str> = import.directory.iter().map(String::as_str).collect();
            if let Some(remapped) = self.remap_prefix(&directory, false) {
                let path = syntax::join_import_path(
                    remapped.iter().map(String::as_str),
                    &import.file_name,
                );
                if self.locations.contains(&path) {
                    edits.push((import.path_span.clone(), path));
                }
            }
        }

        for (span, name) in syntax::find_qualified_names(text) {
            let inside_import = imports
                .iter()
                .any(|import| span.start < import.path_span.end && import.path_span.start < span.end);
            if inside_import {
                continue;
            }

            // Declarations always take the effective package, even when they
            // already start with the root.
            if let Some(declaration) = declarations.iter().find(|d| d.span == span) {
                let remapped = self.root.remap(&declaration.package).to_string();
                if remapped != name {
                    edits.push((span, remapped));
                }
                continue;
            }

            let components: Vec<&str> = name.split('.').collect();
            if components.last() == Some(&syntax::PROTO_EXTENSION) {
                continue;
            }
            if let Some(remapped) = self.remap_prefix(&components, true) {
                edits.push((span, remapped.join(".")));
            }
        }

        if edits.is_empty() {
            None
        } else {
            Some(syntax::splice(text, edits))
        }
    }
}
