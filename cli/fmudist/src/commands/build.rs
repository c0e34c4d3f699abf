//! `fmudist build`: build and stage one platform.

use anyhow::{bail, Context, Result};
use fmudist_pipeline::{build_platform, PipelineConfig, PlatformBuildReport};
use fmudist_platform::Platform;
use fmudist_toolchain::ProcessRunner;

use super::parse_variants;

/// Build the selected variants for `platform`; returns the exit code.
pub fn run(
    config: &PipelineConfig,
    runner: &dyn ProcessRunner,
    platform: &str,
    variants: &[String],
) -> Result<i32> {
    let platform: Platform = platform
        .parse()
        .with_context(|| format!("parsing --platform {platform}"))?;
    if !config.platforms.contains(&platform) {
        bail!("platform '{platform}' is not in the declared platform order");
    }
    let variants = parse_variants(variants, &config.variants)?;

    let report = build_platform(config, runner, platform, &variants)?;
    print_summary(&report);
    Ok(report.exit_code())
}

fn print_summary(report: &PlatformBuildReport) {
    println!("=== Build: {} ===", report.platform);
    for attempt in &report.attempts {
        match &attempt.outcome {
            Ok(count) => println!(
                "  {} ({}): staged {count} package(s)",
                attempt.request.variant, attempt.request.unit
            ),
            Err(e) => println!(
                "  {} ({}): FAILED: {e}",
                attempt.request.variant, attempt.request.unit
            ),
        }
    }
    for variant in &report.unsupported {
        println!("  {variant}: not built on this platform");
    }
    println!();
    println!(
        "{} built, {} failed",
        report.attempts.len() - report.failures(),
        report.failures()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use fmudist_pipeline::{BuildLedger, BuildStatus};
    use fmudist_platform::FmiVariant;
    use fmudist_toolchain::{RecordingRunner, ToolOutput};

    #[test]
    fn failed_build_sets_exit_code_and_records() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::new(dir.path());
        let runner = RecordingRunner::new(|_| Ok(ToolOutput::failure(1, "CMake Error")));

        let code = run(&config, &runner, "x86_64-linux", &["3.0".to_string()]).unwrap();
        assert_eq!(code, 1);

        let ledger = BuildLedger::load(&config.dist_root, Platform::X86_64_LINUX).unwrap();
        assert_eq!(
            ledger.get("fmi3", FmiVariant::Fmi3).unwrap().status,
            BuildStatus::Failed
        );
    }

    #[test]
    fn undeclared_platform_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PipelineConfig::new(dir.path());
        config.platforms = fmudist_platform::parse_platform_list(&["x86_64-linux"]).unwrap();
        let runner = RecordingRunner::succeeding();

        let err = run(&config, &runner, "x86_64-darwin", &[]).unwrap_err();
        assert!(err.to_string().contains("not in the declared platform order"));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn malformed_platform_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::new(dir.path());
        let runner = RecordingRunner::succeeding();
        assert!(run(&config, &runner, "linux", &[]).is_err());
    }
}
