//! Command line front end for protopkg.

use std::io;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use protopkg::{CompileOption, RootPackage, Rewriter};
use protopkg_build::{find_protoc, Config, Error};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "protopkg",
    about = "Rewrite protobuf sources below a root package and run protoc plugins",
    version
)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
    /// More output, repeat for more (`RUST_LOG` takes precedence)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the compile options
    Options,
    /// Print the protoc executable that would be used
    Protoc {
        #[arg(long)]
        protoc: Option<PathBuf>,
    },
    /// Run protoc plugins on the given files
    Compile {
        /// .proto files to compile
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Include directories
        #[arg(short = 'I', long = "include")]
        includes: Vec<PathBuf>,
        #[command(flatten)]
        compile: CompileArgs,
    },
    /// Rewrite sources below a root package
    Rewrite {
        /// Directories searched for .proto files
        #[arg(required = true)]
        roots: Vec<PathBuf>,
        #[arg(long)]
        root_package: RootPackage,
        /// Output root for the rewritten files
        #[arg(long, default_value = ".")]
        out: PathBuf,
        #[arg(long)]
        dry_run: bool,
        /// Fail on imports of files outside the roots
        #[arg(long)]
        deny_unresolved_imports: bool,
        /// Print one rewritten file instead of writing anything
        #[arg(long, value_name = "FILE")]
        show: Option<PathBuf>,
    },
    /// Rewrite (with --root-package) and compile everything below the includes
    Build {
        /// Directories searched for .proto files
        #[arg(required = true)]
        includes: Vec<PathBuf>,
        #[arg(long)]
        root_package: Option<RootPackage>,
        /// Where rewritten sources go (default: --out)
        #[arg(long)]
        rewrite_dir: Option<PathBuf>,
        /// Fail on imports of files outside the includes
        #[arg(long)]
        deny_unresolved_imports: bool,
        #[command(flatten)]
        compile: CompileArgs,
    },
}

#[derive(Args, Debug)]
struct CompileArgs {
    /// Compile option, repeatable (see `protopkg options`, default: py)
    #[arg(short = 'o', long = "option", value_parser = CompileOption::from_token)]
    options: Vec<CompileOption>,
    /// Output directory
    #[arg(long, default_value = ".")]
    out: PathBuf,
    /// Parameters for the protoc plugins, e.g. `binary,import_style=closure`
    #[arg(long, default_value = "")]
    plugin_params: String,
    /// Ask plugins not to print anything
    #[arg(long)]
    quiet: bool,
    /// Let protoc overwrite files in --out directly
    #[arg(long)]
    force: bool,
    /// Only print the protoc invocations
    #[arg(long)]
    dry_run: bool,
    /// protoc executable (default: $PROTOC, then PATH)
    #[arg(long)]
    protoc: Option<PathBuf>,
}

impl CompileArgs {
    fn config(&self) -> Config {
        let mut config = Config::new();
        config
            .out_dir(&self.out)
            .plugin_params(&self.plugin_params)
            .quiet(self.quiet)
            .force(self.force)
            .dry_run(self.dry_run);
        if !self.options.is_empty() {
            let options = self
                .options
                .iter()
                .fold(CompileOption::NONE, |acc, option| acc | *option);
            config.options(options);
        }
        if let Some(protoc) = &self.protoc {
            config.protoc_path(protoc);
        }
        config
    }
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .init();

    if let Err(e) = run(cli.cmd) {
        eprintln!("error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn run(cmd: Commands) -> Result<(), Error> {
    match cmd {
        Commands::Options => {
            for description in CompileOption::catalog() {
                println!("{}", description);
            }
        }
        Commands::Protoc { protoc } => {
            let protoc = match protoc {
                Some(protoc) => protoc,
                None => find_protoc()?,
            };
            println!("{}", protoc.display());
        }
        Commands::Compile {
            files,
            includes,
            compile,
        } => {
            compile.config().compile_files(&files, &includes)?;
        }
        Commands::Rewrite {
            roots,
            root_package,
            out,
            dry_run,
            deny_unresolved_imports,
            show,
        } => {
            let mut rewriter = Rewriter::new(root_package);
            rewriter.set_output_root(out).read(&roots)?;
            if deny_unresolved_imports {
                rewriter.try_fix_imports()?;
            } else {
                rewriter.fix_imports()?;
            }
            rewriter.fix_packages()?;

            match show {
                Some(file) => print!("{}", shown_content(&rewriter, &file)?),
                None => {
                    rewriter.write(dry_run)?;
                }
            }
        }
        Commands::Build {
            includes,
            root_package,
            rewrite_dir,
            deny_unresolved_imports,
            compile,
        } => {
            let mut config = compile.config();
            config.deny_unresolved_imports(deny_unresolved_imports);
            if let Some(root_package) = root_package {
                config.root_package(root_package);
            }
            if let Some(rewrite_dir) = rewrite_dir {
                config.rewrite_dir(rewrite_dir);
            }
            config.compile_protos(&includes)?;
        }
    }
    Ok(())
}

/// Rewritten text of `file`, which may be given relative to its root.
fn shown_content<'a>(rewriter: &'a Rewriter, file: &Path) -> Result<&'a str, Error> {
    rewriter
        .files()
        .find(|path| *path == file || path.ends_with(file))
        .and_then(|path| rewriter.content(path))
        .ok_or_else(|| {
            Error::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not one of the rewritten sources", file.display()),
            ))
        })
}
