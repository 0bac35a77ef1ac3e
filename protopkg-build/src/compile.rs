//! Running protoc plugins for a set of compile options.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use protopkg::CompileOption;
use tracing::{debug, info, warn};

use crate::protoc::{find_protoc, Invocation};
use crate::sync::sync_tree;
use crate::Error;

/// Parameters handed to every protoc plugin of a job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginParams {
    /// Bare flags such as `binary`.
    pub args: BTreeSet<String>,
    /// `key=value` pairs.
    pub kwargs: BTreeMap<String, String>,
}

impl PluginParams {
    /// Parse a comma separated parameter string, e.g. `"binary,import_style=closure"`.
    pub fn parse(params: &str) -> Self {
        let mut parsed = Self::default();
        for param in params.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match param.split_once('=') {
                Some((key, value)) => {
                    parsed.set(key.trim(), value.trim());
                }
                None => {
                    parsed.flag(param);
                }
            }
        }
        parsed
    }

    pub fn flag(&mut self, flag: impl Into<String>) -> &mut Self {
        self.args.insert(flag.into());
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.kwargs.is_empty()
    }
}

/// What to generate and where.
#[derive(Debug, Clone)]
pub struct CompileJob {
    /// Plugins to run, one protoc call per atomic option.
    pub options: CompileOption,
    /// Directory the generated code ends up in.
    pub output: PathBuf,
    pub plugin_params: PluginParams,
    /// Extra arguments for every protoc call.
    pub protoc_args: Vec<String>,
    /// Ask plugins to be quiet.
    pub quiet: bool,
    /// Let protoc write into `output` directly instead of syncing from a
    /// scratch directory.
    pub force: bool,
    /// Log the protoc command lines without running them.
    pub dry_run: bool,
}

impl CompileJob {
    pub fn new(options: CompileOption, output: impl Into<PathBuf>) -> Self {
        Self {
            options,
            output: output.into(),
            plugin_params: PluginParams::default(),
            protoc_args: Vec::new(),
            quiet: false,
            force: false,
            dry_run: false,
        }
    }
}

/// A protoc executable.
#[derive(Debug, Clone)]
pub struct Compiler {
    protoc: PathBuf,
}

impl Compiler {
    pub fn new(protoc: impl Into<PathBuf>) -> Self {
        Self {
            protoc: protoc.into(),
        }
    }

    /// Use the protoc found through `PROTOC` or `PATH`.
    pub fn locate() -> Result<Self, Error> {
        find_protoc().map(Self::new)
    }

    pub fn protoc(&self) -> &Path {
        &self.protoc
    }

    /// Run protoc once.
    ///
    /// A non-zero exit is reported as [`Error::ProtocFailed`] carrying
    /// everything protoc printed.
    pub fn call(&self, invocation: &Invocation, dry_run: bool) -> Result<(), Error> {
        let command_line = invocation.command_line(&self.protoc);
        if dry_run {
            info!("dry run: {}", command_line);
            return Ok(());
        }
        info!("running: {}", command_line);

        let output = invocation.command(&self.protoc).output()?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            // Combine stdout and stderr for full error context
            let combined = if stdout.is_empty() {
                stderr.into_owned()
            } else if stderr.is_empty() {
                stdout.into_owned()
            } else {
                format!("{}\n{}", stdout, stderr)
            };
            return Err(Error::ProtocFailed {
                code: output.status.code(),
                output: combined,
            });
        }

        if !stderr.trim().is_empty() {
            warn!("protoc: {}", stderr.trim_end());
        }
        if !stdout.trim().is_empty() {
            debug!("protoc: {}", stdout.trim_end());
        }
        Ok(())
    }

    /// One invocation per atomic option of `job`, generating into `output`.
    pub fn invocations(
        &self,
        files: &[impl AsRef<Path>],
        includes: &[impl AsRef<Path>],
        job: &CompileJob,
        output: &Path,
    ) -> Result<Vec<Invocation>, Error> {
        let mut params = job.plugin_params.clone();
        if job.quiet {
            params.flag("quiet");
        }

        job.options
            .atomic_components()
            .into_iter()
            .map(|option| -> Result<Invocation, Error> {
                let mut invocation = Invocation::new();
                for include in includes {
                    invocation.include(include);
                }
                invocation.flag(
                    format!("{}_out", option.plugin_name()?),
                    option.format_out(output, &params.args, &params.kwargs)?,
                );
                for arg in &job.protoc_args {
                    invocation.arg(arg.as_str());
                }
                for file in files {
                    invocation.file(file);
                }
                Ok(invocation)
            })
            .collect()
    }

    /// Generate code for `files` with every plugin `job` asks for.
    ///
    /// Unless the job is forced, protoc writes into a scratch directory and
    /// only files that differ from what is already in the output directory
    /// get copied over.
    pub fn compile(
        &self,
        files: &[impl AsRef<Path>],
        includes: &[impl AsRef<Path>],
        job: &CompileJob,
    ) -> Result<(), Error> {
        if job.options.is_empty() {
            warn!("no compile options given, nothing will be compiled");
            return Ok(());
        }

        if job.dry_run || job.force {
            if !job.dry_run {
                fs::create_dir_all(&job.output)?;
            }
            for invocation in self.invocations(files, includes, job, &job.output)? {
                self.call(&invocation, job.dry_run)?;
            }
            return Ok(());
        }

        let scratch = tempfile::tempdir()?;
        for invocation in self.invocations(files, includes, job, scratch.path())? {
            self.call(&invocation, false)?;
        }

        fs::create_dir_all(&job.output)?;
        let written = sync_tree(scratch.path(), &job.output)?;
        info!(
            updated = written.len(),
            output = %job.output.display(),
            "compiled {} with {}",
            files.len(),
            job.options
        );
        Ok(())
    }
}
