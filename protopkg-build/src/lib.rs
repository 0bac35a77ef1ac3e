//! `protopkg-build` runs protoc plugins over `.proto` sources, optionally
//! rewriting them below a root package first.
//!
//! # Example
//!
//! ```rust,no_run
//! // In build.rs
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     protopkg_build::compile_protos(&["proto/"])?;
//!     Ok(())
//! }
//! ```
//!
//! # Forcing a root package
//!
//! Sources written as `package a;` in `proto/a/x.proto` generate code for a
//! top level `a` module. With a root package set, every source is rewritten
//! below it first (`package my.proto.a;`, imports fixed to match) and the
//! rewritten tree is compiled instead, so everything generated lands below
//! `my/proto/`.
//!
//! ```rust,no_run
//! use protopkg_build::{CompileOption, RootPackage};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     protopkg_build::Config::new()
//!         .out_dir("src/generated")
//!         .rewrite_dir("target/proto")
//!         .root_package(RootPackage::new("my.proto")?)
//!         .options(CompileOption::PYTHON_BASIC | CompileOption::PYTHON_MYPY)
//!         .quiet(true)
//!         .compile_protos(&["proto/"])?;
//!     Ok(())
//! }
//! ```
//!
//! # Output
//!
//! protoc runs once per plugin. Unless [`Config::force`] is set, every run
//! generates into a scratch directory and only files whose contents changed
//! are copied to the output directory, so unchanged files keep their
//! modification time.

mod compile;
mod config;
mod error;
mod protoc;
mod sync;

pub use compile::{CompileJob, Compiler, PluginParams};
pub use config::Config;
pub use error::Error;
pub use protoc::{find_protoc, Invocation};
pub use sync::sync_tree;

pub use protopkg::{CompileOption, RootPackage};

use std::path::Path;

/// Compile every `.proto` file below `includes` with default settings.
///
/// Generates basic python code into `OUT_DIR`.
///
/// # Arguments
/// * `includes` - Include paths, searched for `.proto` files
///
/// # Example
///
/// ```rust,no_run
/// fn main() -> Result<(), protopkg_build::Error> {
///     protopkg_build::compile_protos(&["proto/"])?;
///     Ok(())
/// }
/// ```
pub fn compile_protos(includes: &[impl AsRef<Path>]) -> Result<(), Error> {
    Config::new().compile_protos(includes)
}
