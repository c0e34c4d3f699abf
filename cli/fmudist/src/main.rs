//! fmudist: build, merge and release multi-platform FMU packages.

mod commands;
mod manifest;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use fmudist_pipeline::PipelineConfig;
use fmudist_toolchain::SystemRunner;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use manifest::FmudistManifest;

#[derive(Parser)]
#[command(name = "fmudist", version, about = "Build, merge and release multi-platform FMUs")]
struct Cli {
    /// Log debug details (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default fmudist.toml into the current directory
    Init {
        /// Project name (default: directory name)
        #[arg(long)]
        name: Option<String>,
    },
    /// List the declared platforms and the variants each builds
    Platforms,
    /// Build and stage packages for one platform
    Build {
        /// Platform identifier (e.g., x86_64-linux)
        #[arg(long)]
        platform: String,
        /// FMI variant (1.0/me, 1.0/cs, 2.0, 3.0); all configured if omitted
        #[arg(long = "variant")]
        variants: Vec<String>,
    },
    /// Merge platform packages, regenerate references, document and stamp
    Release {
        /// FMI variant to release; all configured if omitted
        #[arg(long = "variant")]
        variants: Vec<String>,
        /// Merge even if some platform has no build record
        #[arg(long)]
        skip_barrier: bool,
        /// Keep the first platform's copy of diverging shared files
        #[arg(long)]
        allow_divergent_shared: bool,
    },
    /// Regenerate one unit's stored reference from its released package
    Regenerate {
        /// Unit name (e.g., BouncingBall)
        unit: String,
        /// FMI variant
        #[arg(long)]
        variant: String,
    },
    /// Compare released packages' results with stored references
    Validate {
        /// FMI variant to check; all configured if omitted
        #[arg(long = "variant")]
        variants: Vec<String>,
        /// Maximum normalized deviation
        #[arg(long, default_value_t = fmudist_reference::DEFAULT_TOLERANCE)]
        tolerance: f64,
    },
    /// Stamp provenance into one modelDescription.xml
    Stamp {
        /// Metadata file
        file: PathBuf,
    },
    /// Check tools and project status
    Doctor,
    /// Remove release output
    Clean {
        /// Also remove build directories and staged platform packages
        #[arg(long)]
        builds: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(0) => {}
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "fmudist=debug" } else { "fmudist=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Run a command; `Ok` carries the process exit code.
fn run(cli: Cli) -> anyhow::Result<i32> {
    let cwd = std::env::current_dir()?;
    let runner = SystemRunner;

    match cli.command {
        Commands::Init { name } => {
            commands::init::run(&cwd, name.as_deref())?;
            Ok(0)
        }

        Commands::Platforms => {
            let config = load_config_optional(&cwd)?;
            commands::platforms::run(&config);
            Ok(0)
        }

        Commands::Build { platform, variants } => {
            let config = load_config_required(&cwd)?;
            commands::build::run(&config, &runner, &platform, &variants)
        }

        Commands::Release {
            variants,
            skip_barrier,
            allow_divergent_shared,
        } => {
            let mut config = load_config_required(&cwd)?;
            commands::select_variants(&mut config, &variants)?;
            if skip_barrier {
                config.require_build_ledger = false;
            }
            if allow_divergent_shared {
                config.merge.allow_divergent_shared = true;
            }
            commands::release::run(&config, &runner)
        }

        Commands::Regenerate { unit, variant } => {
            let config = load_config_required(&cwd)?;
            commands::regenerate::run(&config, &runner, &unit, &variant)?;
            Ok(0)
        }

        Commands::Validate {
            variants,
            tolerance,
        } => {
            let mut config = load_config_required(&cwd)?;
            commands::select_variants(&mut config, &variants)?;
            commands::validate::run(&config, &runner, tolerance)
        }

        Commands::Stamp { file } => {
            let config = load_config_optional(&cwd)?;
            commands::stamp::run(&config, &runner, &cwd.join(file))?;
            Ok(0)
        }

        Commands::Doctor => {
            commands::doctor::run(&cwd, &runner);
            Ok(0)
        }

        Commands::Clean { builds } => {
            let config = load_config_required(&cwd)?;
            commands::clean::run(&config, builds)?;
            Ok(0)
        }
    }
}

/// Load the manifest, returning an error if not found.
fn load_config_required(cwd: &Path) -> anyhow::Result<PipelineConfig> {
    match FmudistManifest::find_and_load(cwd)? {
        Some((manifest, dir)) => manifest.to_pipeline_config(&dir),
        None => anyhow::bail!("no fmudist.toml found (run `fmudist init` first)"),
    }
}

/// Load the manifest if there is one; the default layout rooted at `cwd` otherwise.
fn load_config_optional(cwd: &Path) -> anyhow::Result<PipelineConfig> {
    match FmudistManifest::find_and_load(cwd)? {
        Some((manifest, dir)) => manifest.to_pipeline_config(&dir),
        None => Ok(PipelineConfig::new(cwd)),
    }
}
