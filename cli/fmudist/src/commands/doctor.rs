//! `fmudist doctor`: tool and project diagnostics.

use std::path::Path;

use fmudist_pipeline::{BuildLedger, PipelineConfig};
use fmudist_platform::FmiVariant;
use fmudist_toolchain::{ProcessRunner, ToolCommand};

use crate::manifest::FmudistManifest;

/// Print tool versions, manifest status and per-platform build records.
pub fn run(project_dir: &Path, runner: &dyn ProcessRunner) {
    println!("=== fmudist Doctor ===");
    println!();
    println!("fmudist version: {}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("--- Project Status ---");
    let config = match FmudistManifest::find_and_load(project_dir) {
        Ok(Some((manifest, dir))) => {
            println!("  fmudist.toml: found at {}", dir.display());
            println!("  Project:      {}", manifest.project.name);
            match manifest.to_pipeline_config(&dir) {
                Ok(config) => Some(config),
                Err(e) => {
                    println!("  Configuration: error, {e:#}");
                    None
                }
            }
        }
        Ok(None) => {
            println!("  fmudist.toml: not found");
            None
        }
        Err(e) => {
            println!("  fmudist.toml: error, {e:#}");
            None
        }
    };
    println!();

    println!("--- System Tools ---");
    let cmake = config
        .as_ref()
        .map(|c| c.build.cmake.as_path())
        .unwrap_or(Path::new("cmake"));
    print_tool_status(runner, "cmake", cmake);
    print_tool_status(runner, "git", Path::new("git"));
    if let Some(ref config) = config {
        let simulator = &config.simulator.executable;
        let status = if simulator.is_file() { "found" } else { "not found" };
        println!("  fmusim: {status} at {}", simulator.display());
    }

    if let Some(ref config) = config {
        println!();
        print_ledger_status(config);
    }
}

fn print_tool_status(runner: &dyn ProcessRunner, name: &str, program: &Path) {
    match runner.run(&ToolCommand::new(program).arg("--version")) {
        Ok(output) if output.is_success() => {
            let first_line = output.stdout.lines().next().unwrap_or("(unknown version)");
            println!("  {name}: {first_line}");
        }
        Ok(_) | Err(_) => println!("  {name}: not found"),
    }
}

fn print_ledger_status(config: &PipelineConfig) {
    println!("--- Build Records ---");
    for &platform in config.platforms.as_slice() {
        match BuildLedger::load(&config.dist_root, platform) {
            Ok(ledger) => {
                let recorded: Vec<String> = FmiVariant::ALL
                    .iter()
                    .filter(|v| ledger.has_variant(**v))
                    .map(|v| v.to_string())
                    .collect();
                if recorded.is_empty() {
                    println!("  {platform}: none");
                } else {
                    println!("  {platform}: {}", recorded.join(", "));
                }
            }
            Err(e) => println!("  {platform}: error, {e}"),
        }
    }
}
