//! Configuration for the rewrite and compile pipeline.

use std::path::{Path, PathBuf};

use protopkg::{find_proto_files_in, CompileOption, RootPackage, Rewriter};
use tracing::{info, warn};

use crate::compile::{CompileJob, Compiler, PluginParams};
use crate::protoc::resolve_protoc;
use crate::Error;

/// Configuration for rewriting and compiling `.proto` files.
///
/// Without a root package, sources are compiled as they are. With one, every
/// include root is first rewritten below it and the rewritten tree is
/// compiled instead.
#[derive(Debug, Clone)]
pub struct Config {
    /// Output directory for generated files.
    pub(crate) out_dir: Option<PathBuf>,

    /// Path to the protoc executable.
    pub(crate) protoc_path: Option<PathBuf>,

    /// Additional arguments for protoc.
    pub(crate) protoc_args: Vec<String>,

    /// Plugins to run.
    pub(crate) options: CompileOption,

    /// Parameters for every plugin.
    pub(crate) plugin_params: PluginParams,

    pub(crate) quiet: bool,

    /// Let protoc write straight into the output directory.
    pub(crate) force: bool,

    /// Log instead of writing or running anything.
    pub(crate) dry_run: bool,

    /// Package every source is moved below before compiling.
    pub(crate) root_package: RootPackage,

    /// Where rewritten sources go, defaults to the output directory.
    pub(crate) rewrite_dir: Option<PathBuf>,

    /// Fail instead of warning about imports outside the rewritten sources.
    pub(crate) deny_unresolved_imports: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            out_dir: None,
            protoc_path: None,
            protoc_args: Vec::new(),
            options: CompileOption::PYTHON_BASIC,
            plugin_params: PluginParams::default(),
            quiet: false,
            force: false,
            dry_run: false,
            root_package: RootPackage::default(),
            rewrite_dir: None,
            deny_unresolved_imports: false,
        }
    }
}

impl Config {
    /// Create a new Config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output directory for generated files.
    pub fn out_dir(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.out_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set path to the protoc executable.
    pub fn protoc_path(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.protoc_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Add an argument to pass to protoc.
    pub fn protoc_arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.protoc_args.push(arg.into());
        self
    }

    /// Replace the set of plugins to run.
    pub fn options(&mut self, options: CompileOption) -> &mut Self {
        self.options = options;
        self
    }

    /// Add a bare plugin parameter, e.g. `binary`.
    pub fn plugin_flag(&mut self, flag: impl Into<String>) -> &mut Self {
        self.plugin_params.flag(flag);
        self
    }

    /// Add a `key=value` plugin parameter.
    pub fn plugin_param(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.plugin_params.set(key, value);
        self
    }

    /// Add every parameter of a comma separated parameter string.
    pub fn plugin_params(&mut self, params: &str) -> &mut Self {
        let parsed = PluginParams::parse(params);
        self.plugin_params.args.extend(parsed.args);
        self.plugin_params.kwargs.extend(parsed.kwargs);
        self
    }

    pub fn quiet(&mut self, quiet: bool) -> &mut Self {
        self.quiet = quiet;
        self
    }

    /// Skip the scratch directory and let protoc overwrite outputs.
    pub fn force(&mut self, force: bool) -> &mut Self {
        self.force = force;
        self
    }

    /// Only log what would be written and run.
    pub fn dry_run(&mut self, dry_run: bool) -> &mut Self {
        self.dry_run = dry_run;
        self
    }

    /// Move every source below `root_package` before compiling.
    pub fn root_package(&mut self, root_package: RootPackage) -> &mut Self {
        self.root_package = root_package;
        self
    }

    /// Directory for rewritten sources.
    pub fn rewrite_dir(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.rewrite_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Turn unresolved imports during the rewrite into an error.
    pub fn deny_unresolved_imports(&mut self, deny: bool) -> &mut Self {
        self.deny_unresolved_imports = deny;
        self
    }

    /// Rewrite (if a root package is set) and compile every `.proto` file
    /// below `includes`.
    pub fn compile_protos(&self, includes: &[impl AsRef<Path>]) -> Result<(), Error> {
        let out_dir = self.resolve_out_dir()?;

        if self.root_package.is_empty() {
            let files = find_proto_files_in(includes)?;
            let includes: Vec<PathBuf> = includes.iter().map(|i| i.as_ref().to_path_buf()).collect();
            if files.is_empty() {
                return Err(Error::NoProtoFiles(includes));
            }
            return self.compile(&files, &includes, &out_dir);
        }

        let rewrite_dir = self.rewrite_dir.clone().unwrap_or_else(|| out_dir.clone());
        let files = self.rewrite(includes, &rewrite_dir)?;
        if files.is_empty() {
            return Err(Error::NoProtoFiles(vec![rewrite_dir]));
        }
        self.compile(&files, &[rewrite_dir], &out_dir)
    }

    /// Compile exactly `files`, without rewriting.
    pub fn compile_files(
        &self,
        files: &[impl AsRef<Path>],
        includes: &[impl AsRef<Path>],
    ) -> Result<(), Error> {
        let out_dir = self.resolve_out_dir()?;
        if files.is_empty() {
            let includes = includes.iter().map(|i| i.as_ref().to_path_buf()).collect();
            return Err(Error::NoProtoFiles(includes));
        }
        self.compile(files, includes, &out_dir)
    }

    /// Rewrite every source below `includes` into `rewrite_dir`, returning
    /// the rewritten paths.
    pub fn rewrite(
        &self,
        includes: &[impl AsRef<Path>],
        rewrite_dir: &Path,
    ) -> Result<Vec<PathBuf>, Error> {
        let mut rewriter = Rewriter::new(self.root_package.clone());
        rewriter.set_output_root(rewrite_dir).read(includes)?;

        if self.deny_unresolved_imports {
            rewriter.try_fix_imports()?;
        } else {
            rewriter.fix_imports()?;
        }
        rewriter.fix_packages()?.write(self.dry_run)?;

        let files: Vec<PathBuf> = rewriter
            .planned_outputs()
            .into_iter()
            .map(|(_, destination)| destination)
            .collect();
        info!(
            files = files.len(),
            root_package = %self.root_package,
            rewrite_dir = %rewrite_dir.display(),
            "rewrote sources"
        );
        Ok(files)
    }

    fn job(&self, out_dir: &Path) -> CompileJob {
        CompileJob {
            options: self.options,
            output: out_dir.to_path_buf(),
            plugin_params: self.plugin_params.clone(),
            protoc_args: self.protoc_args.clone(),
            quiet: self.quiet,
            force: self.force,
            dry_run: self.dry_run,
        }
    }

    fn compile(
        &self,
        files: &[impl AsRef<Path>],
        includes: &[impl AsRef<Path>],
        out_dir: &Path,
    ) -> Result<(), Error> {
        self.compiler()?
            .compile(files, includes, &self.job(out_dir))
    }

    fn compiler(&self) -> Result<Compiler, Error> {
        match resolve_protoc(self.protoc_path.as_deref()) {
            Ok(protoc) => Ok(Compiler::new(protoc)),
            // A dry run only prints command lines.
            Err(Error::ProtocNotFound) if self.dry_run => {
                warn!("protoc not found, dry run continues with `protoc`");
                Ok(Compiler::new("protoc"))
            }
            Err(e) => Err(e),
        }
    }

    fn resolve_out_dir(&self) -> Result<PathBuf, Error> {
        self.out_dir
            .clone()
            .or_else(|| std::env::var_os("OUT_DIR").map(PathBuf::from))
            .ok_or(Error::MissingOutDir)
    }
}
