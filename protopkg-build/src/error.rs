//! Error types for protopkg-build.

use std::io;
use std::path::PathBuf;

/// Errors that can occur while rewriting sources or running protoc.
#[derive(Debug)]
pub enum Error {
    /// IO error.
    Io(io::Error),
    /// protoc not found.
    ProtocNotFound,
    /// protoc exited unsuccessfully.
    ProtocFailed {
        /// Exit code, `None` if protoc was killed by a signal.
        code: Option<i32>,
        /// Combined stdout and stderr of the run.
        output: String,
    },
    /// Rewriting sources or building plugin parameters failed.
    Rewrite(protopkg::Error),
    /// Missing OUT_DIR environment variable.
    MissingOutDir,
    /// No `.proto` files to compile below the given roots.
    NoProtoFiles(Vec<PathBuf>),
}

impl Error {
    /// Exit code a command line tool should terminate with.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ProtocFailed {
                code: Some(code), ..
            } => *code,
            _ => 1,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::ProtocNotFound => {
                write!(f, "protoc not found. Set PROTOC env var or install protoc.")
            }
            Self::ProtocFailed { code, output } => {
                match code {
                    Some(code) => write!(f, "protoc failed with exit code {}", code)?,
                    None => write!(f, "protoc was terminated by a signal")?,
                }
                // Truncate very long error messages to keep output readable
                const MAX_LEN: usize = 1000;
                let output = output.trim_end();
                if output.is_empty() {
                    Ok(())
                } else if output.len() > MAX_LEN {
                    let mut end = MAX_LEN;
                    while !output.is_char_boundary(end) {
                        end -= 1;
                    }
                    write!(f, ": {}... (truncated)", &output[..end])
                } else {
                    write!(f, ": {}", output)
                }
            }
            Self::Rewrite(e) => write!(f, "{}", e),
            Self::MissingOutDir => {
                write!(f, "OUT_DIR not set. Run from build.rs or set out_dir().")
            }
            Self::NoProtoFiles(roots) => {
                let roots: Vec<_> = roots.iter().map(|root| root.display().to_string()).collect();
                write!(f, "No .proto files found below {}", roots.join(", "))
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Rewrite(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<protopkg::Error> for Error {
    fn from(e: protopkg::Error) -> Self {
        Self::Rewrite(e)
    }
}

impl From<walkdir::Error> for Error {
    fn from(e: walkdir::Error) -> Self {
        Self::Io(e.into())
    }
}
