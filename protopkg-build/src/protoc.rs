//! Protoc invocation utilities.

use crate::Error;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Find the protoc executable.
pub fn find_protoc() -> Result<PathBuf, Error> {
    // Check PROTOC environment variable first
    if let Some(path) = std::env::var_os("PROTOC") {
        let path = PathBuf::from(path);
        if path.is_file() {
            return Ok(path);
        }
        tracing::debug!(path = %path.display(), "ignoring PROTOC, not a file");
    }

    // Try to find protoc in PATH
    which::which("protoc").map_err(|_| Error::ProtocNotFound)
}

/// An explicitly configured protoc, or [`find_protoc`].
pub(crate) fn resolve_protoc(explicit: Option<&Path>) -> Result<PathBuf, Error> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => find_protoc(),
    }
}

/// Arguments of one protoc run.
///
/// Rendered in a fixed order: `-I<dir>` for every include, `--key=value` for
/// every flag, raw extra arguments, then the source files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    includes: Vec<PathBuf>,
    flags: Vec<(String, String)>,
    extra_args: Vec<String>,
    files: Vec<PathBuf>,
}

impl Invocation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(&mut self, dir: impl AsRef<Path>) -> &mut Self {
        self.includes.push(dir.as_ref().to_path_buf());
        self
    }

    /// Add `--key=value`. `key` is given without the leading dashes.
    pub fn flag(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.flags.push((key.into(), value.into()));
        self
    }

    /// Add an argument passed to protoc verbatim.
    pub fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.extra_args.push(arg.into());
        self
    }

    pub fn file(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.files.push(path.as_ref().to_path_buf());
        self
    }

    pub fn includes(&self) -> &[PathBuf] {
        &self.includes
    }

    pub fn flags(&self) -> &[(String, String)] {
        &self.flags
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// The argument list, without the executable.
    pub fn args(&self) -> Vec<OsString> {
        let mut args = Vec::new();
        for include in &self.includes {
            let mut arg = OsString::from("-I");
            arg.push(include);
            args.push(arg);
        }
        for (key, value) in &self.flags {
            args.push(format!("--{key}={value}").into());
        }
        args.extend(self.extra_args.iter().map(OsString::from));
        args.extend(self.files.iter().map(OsString::from));
        args
    }

    pub fn command(&self, protoc: &Path) -> Command {
        let mut cmd = Command::new(protoc);
        cmd.args(self.args());
        cmd
    }

    /// Space separated command line, for logs.
    pub fn command_line(&self, protoc: &Path) -> String {
        std::iter::once(protoc.as_os_str().to_os_string())
            .chain(self.args())
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
