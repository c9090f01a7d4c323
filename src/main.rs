//! # cmpail CLI Entry Point
//!
//! Parses CLI arguments using clap, turns them into a `BuildRequest`, and
//! renders the resulting build in the terminal.
//!
//! ## Commands
//!
//! - `build`, `run` - build (and execute) the program
//! - `plan` - show what a build would do
//! - `clean` - remove objects and build history
//! - `watch` - rebuild on change
//! - `completions` - shell completion scripts

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use std::path::PathBuf;
use std::process::Command;

use cmpail::build::{self, BuildOptions, BuildRequest, Orchestrator};
use cmpail::manifest::ManifestStore;
use cmpail::ui;

#[derive(Parser)]
#[command(name = "cmpail")]
#[command(about = "Incremental C/C++ build orchestrator", version = env!("CARGO_PKG_VERSION"))]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile changed sources and relink if needed
    Build {
        #[command(flatten)]
        args: BuildArgs,
        /// Show build commands and decisions
        #[arg(short, long)]
        verbose: bool,
    },
    /// Build, then execute the output binary
    Run {
        #[command(flatten)]
        args: BuildArgs,
        #[arg(short, long)]
        verbose: bool,
        /// Arguments passed to the program (after `--`)
        #[arg(last = true)]
        run_args: Vec<String>,
    },
    /// Show which sources would be recompiled, without running the compiler
    Plan {
        #[command(flatten)]
        args: BuildArgs,
    },
    /// Remove object files and the build manifest
    Clean {
        /// Output directory [default: from cmpail.toml, or build]
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Remove the whole output directory, executable included
        #[arg(long)]
        all: bool,
        /// Config file [default: cmpail.toml if present]
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Rebuild whenever a source file changes
    Watch {
        #[command(flatten)]
        args: BuildArgs,
        #[arg(short, long)]
        verbose: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Clone)]
struct BuildArgs {
    /// Source files [default: from cmpail.toml, or every C/C++ file under src/]
    sources: Vec<PathBuf>,
    /// Directory scanned for sources when none are listed
    #[arg(long)]
    src_dir: Option<PathBuf>,
    /// Compiler driver (gcc, g++, clang, clang++)
    #[arg(long)]
    compiler: Option<String>,
    /// Flags for every compile and link, split on whitespace
    #[arg(long, allow_hyphen_values = true)]
    flags: Option<String>,
    /// Libraries appended to the link, e.g. "-lm -lpthread"
    #[arg(long, allow_hyphen_values = true)]
    packages: Option<String>,
    /// Output directory; objects go to <out-dir>/obj
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// Executable name (.exe is added on Windows)
    #[arg(long)]
    exe_name: Option<String>,
    /// Recompile every source regardless of the manifest
    #[arg(long)]
    no_incremental: bool,
    /// Delete objects and build history first
    #[arg(long)]
    clean: bool,
    /// Config file [default: cmpail.toml if present]
    #[arg(long)]
    config: Option<PathBuf>,
}

impl BuildArgs {
    fn into_request(self) -> Result<BuildRequest> {
        let config = build::load_config(self.config.as_deref())?;
        let options = BuildOptions {
            sources: self.sources,
            source_dir: self.src_dir,
            compiler: self.compiler,
            flags: self.flags,
            packages: self.packages,
            output_dir: self.out_dir,
            exe_name: self.exe_name,
            no_incremental: self.no_incremental,
            clean: self.clean,
        };
        let request = options.into_request(&config);
        request.validate()?;
        Ok(request)
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "x".red(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { args, verbose } => {
            let outcome = build_once(args.into_request()?, verbose)?;
            if !outcome.is_success() {
                std::process::exit(1);
            }
        }
        Commands::Run {
            args,
            verbose,
            run_args,
        } => {
            let outcome = build_once(args.into_request()?, verbose)?;
            let Some(summary) = outcome.summary() else {
                std::process::exit(1);
            };
            println!("{} Running...\n", "▶".green());
            let status = Command::new(&summary.exe_path)
                .args(&run_args)
                .status()
                .with_context(|| format!("Failed to run {}", summary.exe_path.display()))?;
            std::process::exit(status.code().unwrap_or(1));
        }
        Commands::Plan { args } => {
            let request = args.into_request()?;
            let manifest = if request.clean {
                Default::default()
            } else {
                ManifestStore::new(request.manifest_path()).load()
            };
            ui::print_plan(&build::plan(&request, &manifest));
        }
        Commands::Clean {
            out_dir,
            all,
            config,
        } => {
            let config = build::load_config(config.as_deref())?;
            let output_dir = out_dir
                .or_else(|| config.build.output_dir.clone())
                .unwrap_or_else(|| PathBuf::from("build"));
            let manifest = config
                .build
                .manifest
                .clone()
                .unwrap_or_else(|| output_dir.join(cmpail::manifest::MANIFEST_FILE));
            build::clean(&output_dir, &ManifestStore::new(manifest), all)?;
        }
        Commands::Watch { args, verbose } => {
            build::watch(args.into_request()?, verbose)?;
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "cmpail", &mut std::io::stdout());
        }
    }
    Ok(())
}

fn build_once(request: BuildRequest, verbose: bool) -> Result<cmpail::BuildOutcome> {
    println!(
        "{} Building {} from {} source(s)",
        "🚀".blue(),
        request.exe_path().display().to_string().bold(),
        request.sources.len()
    );
    let handle = Orchestrator::new().spawn(request)?;
    ui::report(handle, verbose)
}
