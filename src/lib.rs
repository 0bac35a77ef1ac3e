//! `protopkg` rewrites `.proto` sources so the code protoc generates from them
//! lives below one root package.
//!
//! protoc plugins derive the module layout of generated code from the
//! `package` declarations and import paths of the sources. Sources written for
//! one layout therefore can't be dropped into another namespace without
//! rewriting both. [`Rewriter`] does exactly that:
//!
//! 1. every file gets an *effective package*: its declared package, or the
//!    directory it lives in relative to its search root, moved below the
//!    [`RootPackage`],
//! 2. `import` statements are pointed at the new location of the file they
//!    reference,
//! 3. `package` statements and qualified references follow the new packages,
//! 4. files are written to `<output root>/<package path>/<file name>`.
//!
//! ```text
//! in/a/x.proto   (no package)          out/my/proto/a/x.proto
//! in/a/y.proto   package a;        =>  out/my/proto/a/y.proto  package my.proto.a;
//!                import "a/x.proto";                           import "my/proto/a/x.proto";
//! ```
//!
//! # Example
//!
//! ```no_run
//! use protopkg::{RootPackage, Rewriter};
//!
//! fn main() -> Result<(), protopkg::Error> {
//!     let mut rewriter = Rewriter::new(RootPackage::new("my.proto")?);
//!     rewriter
//!         .set_output_root("out")
//!         .read(&["in"])?
//!         .fix_imports()?
//!         .fix_packages()?
//!         .write(false)?;
//!     Ok(())
//! }
//! ```
//!
//! # Compile options
//!
//! [`CompileOption`] describes which protoc plugins to run. It is shared with
//! `protopkg-build`, which drives protoc itself.
//!
//! ```
//! use protopkg::CompileOption;
//!
//! let option = CompileOption::from_tokens(["py", "mypy"]).unwrap();
//! let plugins: Vec<_> = option
//!     .atomic_components()
//!     .into_iter()
//!     .map(|atomic| atomic.plugin_name().unwrap())
//!     .collect();
//! assert_eq!(plugins, ["mypy", "python"]);
//! ```

pub mod discover;
mod error;
pub mod option;
pub mod package;
pub mod rewrite;
pub mod syntax;

pub use discover::{find_proto_files, find_proto_files_in};
pub use error::Error;
pub use option::CompileOption;
pub use package::{PackageName, RootPackage};
pub use rewrite::{Rewriter, Stage, UnresolvedImport, UnresolvedImports};
