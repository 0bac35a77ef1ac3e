use std::io;
use std::path::PathBuf;

use crate::option::CompileOption;
use crate::rewrite::UnresolvedImports;

/// Errors produced by the option model and the rewrite engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A root package that is not a `.`-separated list of identifiers.
    #[error("'{0}' is not a valid package name, use only .-separated identifiers")]
    InvalidPackageName(String),
    /// Roots that are not directories or contain no `.proto` file.
    #[error("not a directory or does not contain a .proto file: {}", display_paths(.roots))]
    NoSourceFiles { roots: Vec<PathBuf> },
    /// A pass was requested before any sources were read.
    #[error("no sources have been read yet")]
    NotRead,
    /// Imports referencing files outside of the working set.
    #[error("{0}")]
    UnresolvedImports(UnresolvedImports),
    /// A token that does not name any compile option.
    #[error("'{0}' is not a valid compile option")]
    InvalidOption(String),
    /// A per-plugin operation requested for a union of options.
    #[error("plugin parameters only make sense for individual options, got {0}")]
    CompositeNotAllowed(CompileOption),
    /// An option without a protoc plugin.
    #[error("no protoc plugin for option {0}")]
    UnsupportedOption(CompileOption),
    /// Filesystem failure on `path`.
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
