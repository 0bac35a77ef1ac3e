//! Recognition of `package` and `import` statements in `.proto` sources.
//!
//! This is deliberately not a parser. Both statements are matched line by
//! line with regular expressions, everything else in a file is opaque text.

use std::ops::Range;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::package::PackageName;

/// Extension of protocol definition sources.
pub const PROTO_EXTENSION: &str = "proto";

static PACKAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^package (\w+(?:\.\w+)*);\r?$").expect("package pattern")
});
static IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^import "((?:\w+/)*)(\w+\.proto)";\r?$"#).expect("import pattern")
});
static QUALIFIED_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+(?:\.\w+)*").expect("qualified name pattern"));
static PACKAGE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+(?:\.\w+)*$").expect("package name pattern"));

/// A `package a.b.c;` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDeclaration {
    pub package: PackageName,
    /// Byte range of the dotted name inside the source text.
    pub span: Range<usize>,
}

/// An `import "dir/sub/file.proto";` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStatement {
    /// Directory segments in front of the file name, possibly none.
    pub directory: Vec<String>,
    pub file_name: String,
    /// Byte range of the quoted path inside the source text.
    pub path_span: Range<usize>,
    /// The statement as written, for diagnostics.
    pub statement: String,
}

impl ImportStatement {
    /// The quoted path, e.g. `a/b/x.proto`.
    pub fn path(&self) -> String {
        join_import_path(self.directory.iter().map(String::as_str), &self.file_name)
    }

    /// The quoted path as a relative filesystem path.
    pub fn relative_path(&self) -> PathBuf {
        self.directory
            .iter()
            .map(String::as_str)
            .chain([self.file_name.as_str()])
            .collect()
    }
}

/// First package declaration of `text`.
pub fn find_package_declaration(text: &str) -> Option<PackageDeclaration> {
    find_package_declarations(text).next()
}

/// Every package declaration of `text`, in order.
pub fn find_package_declarations(text: &str) -> impl Iterator<Item = PackageDeclaration> + '_ {
    PACKAGE.captures_iter(text).filter_map(|captures| {
        let name = captures.get(1)?;
        Some(PackageDeclaration {
            package: PackageName::from_components(name.as_str().split('.')),
            span: name.range(),
        })
    })
}

/// Every import statement of `text`, in order.
pub fn find_imports(text: &str) -> Vec<ImportStatement> {
    IMPORT
        .captures_iter(text)
        .filter_map(|captures| {
            let statement = captures.get(0)?;
            let directory = captures.get(1)?;
            let file_name = captures.get(2)?;
            Some(ImportStatement {
                directory: directory
                    .as_str()
                    .split('/')
                    .filter(|segment| !segment.is_empty())
                    .map(str::to_string)
                    .collect(),
                file_name: file_name.as_str().to_string(),
                path_span: directory.start()..file_name.end(),
                statement: statement.as_str().trim_end().to_string(),
            })
        })
        .collect()
}

/// Maximal runs of `.`-joined identifiers, such as `a.b.Message`.
pub(crate) fn find_qualified_names(text: &str) -> impl Iterator<Item = (Range<usize>, &str)> {
    QUALIFIED_NAME
        .find_iter(text)
        .map(|found| (found.range(), found.as_str()))
}

/// Returns `true` for a valid dotted package name.
pub fn is_package_name(name: &str) -> bool {
    PACKAGE_NAME.is_match(name)
}

/// Join directory segments and a file name into an import path.
pub fn join_import_path<'a>(
    directory: impl IntoIterator<Item = &'a str>,
    file_name: &'a str,
) -> String {
    directory
        .into_iter()
        .chain([file_name])
        .collect::<Vec<_>>()
        .join("/")
}

/// Replace byte ranges of `text`. Edits must not overlap.
pub(crate) fn splice(text: &str, mut edits: Vec<(Range<usize>, String)>) -> String {
    edits.sort_by_key(|(range, _)| range.start);

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (range, replacement) in edits {
        out.push_str(&text[cursor..range.start]);
        out.push_str(&replacement);
        cursor = range.end;
    }
    out.push_str(&text[cursor..]);
    out
}
