//! Building every configured variant for one platform.

use fmudist_platform::{FmiVariant, Platform};
use fmudist_toolchain::build::{stage, unstage};
use fmudist_toolchain::{BuildDriver, BuildRequest, ProcessRunner, ToolchainError};
use tracing::{error, info};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::ledger::{BuildLedger, BuildRecord, BuildStatus};

/// One attempted build.
#[derive(Debug)]
pub struct BuildAttempt {
    pub request: BuildRequest,
    /// Staged package count, or the failure.
    pub outcome: std::result::Result<usize, ToolchainError>,
}

/// Builds run for one platform.
#[derive(Debug)]
pub struct PlatformBuildReport {
    pub platform: Platform,
    pub attempts: Vec<BuildAttempt>,
    /// Variants the platform does not build.
    pub unsupported: Vec<FmiVariant>,
}

impl PlatformBuildReport {
    /// Number of failed builds.
    pub fn failures(&self) -> usize {
        self.attempts.iter().filter(|a| a.outcome.is_err()).count()
    }

    /// 0 if every attempted build succeeded, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.failures() == 0 {
            0
        } else {
            1
        }
    }
}

/// Build and stage each of `variants` for `platform`, recording every
/// finished build in the platform's ledger.
///
/// A failed build is logged and recorded, and the variant's previously
/// staged packages are removed; the remaining variants still run.
pub fn build_platform(
    config: &PipelineConfig,
    runner: &dyn ProcessRunner,
    platform: Platform,
    variants: &[FmiVariant],
) -> Result<PlatformBuildReport> {
    let driver = BuildDriver::new(config.build.clone(), runner);
    let mut ledger = BuildLedger::load(&config.dist_root, platform)?;
    let mut report = PlatformBuildReport {
        platform,
        attempts: Vec::new(),
        unsupported: Vec::new(),
    };

    for &variant in variants {
        if !platform.supports(variant) {
            info!(
                target: "fmudist::pipeline",
                platform = %platform,
                variant = %variant,
                "platform does not build variant, skipping"
            );
            report.unsupported.push(variant);
            continue;
        }
        let request = BuildRequest::new(platform, variant);
        let outcome = driver
            .build(&request)
            .and_then(|tree| stage(&tree, &request, &config.dist_root))
            .map(|staged| staged.packages.len());

        let record = match &outcome {
            Ok(packages) => {
                info!(
                    target: "fmudist::pipeline",
                    platform = %platform,
                    variant = %variant,
                    packages,
                    "build staged"
                );
                let mut record = BuildRecord::now(&request.unit, variant, BuildStatus::Succeeded);
                record.packages = *packages;
                record
            }
            Err(e) => {
                error!(
                    target: "fmudist::pipeline",
                    platform = %platform,
                    variant = %variant,
                    error = %e,
                    "build failed"
                );
                unstage(&request, &config.dist_root)?;
                let mut record = BuildRecord::now(&request.unit, variant, BuildStatus::Failed);
                record.detail = Some(e.to_string());
                record
            }
        };
        ledger.record(record);
        ledger.save(&config.dist_root, platform)?;
        report.attempts.push(BuildAttempt { request, outcome });
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    use fmudist_toolchain::{RecordingRunner, ToolOutput};

    /// Installs one package per configure+build, failing FMI 2.0 configure.
    fn runner() -> RecordingRunner {
        RecordingRunner::new(|cmd| {
            let args = cmd.args_lossy();
            if args.iter().any(|a| a == "FMI_VERSION=2") {
                return Ok(ToolOutput::failure(1, "CMake Error: no compiler"));
            }
            if let Some(prefix) = args
                .iter()
                .find_map(|a| a.strip_prefix("CMAKE_INSTALL_PREFIX="))
            {
                let dir = PathBuf::from(prefix);
                fs::create_dir_all(&dir)?;
                fs::write(dir.join("Stair.fmu"), b"fmu")?;
            }
            Ok(ToolOutput::success(""))
        })
    }

    #[test]
    fn records_success_and_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::new(dir.path());
        let runner = runner();

        let report = build_platform(
            &config,
            &runner,
            Platform::AARCH64_LINUX,
            &[FmiVariant::Fmi2, FmiVariant::Fmi3],
        )
        .unwrap();
        // aarch64-linux only builds FMI 3.0.
        assert_eq!(report.unsupported, [FmiVariant::Fmi2]);
        assert_eq!(report.attempts.len(), 1);
        assert_eq!(report.exit_code(), 0);

        let ledger = BuildLedger::load(&config.dist_root, Platform::AARCH64_LINUX).unwrap();
        let record = ledger.get("fmi3", FmiVariant::Fmi3).unwrap();
        assert_eq!(record.status, BuildStatus::Succeeded);
        assert_eq!(record.packages, 1);
        assert!(config
            .dist_root
            .join("dist-aarch64-linux/3.0/Stair.fmu")
            .is_file());
    }

    #[test]
    fn failure_is_recorded_and_siblings_continue() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::new(dir.path());
        let runner = runner();

        let report = build_platform(
            &config,
            &runner,
            Platform::X86_64_LINUX,
            &[FmiVariant::Fmi2, FmiVariant::Fmi3],
        )
        .unwrap();
        assert_eq!(report.attempts.len(), 2);
        assert_eq!(report.failures(), 1);
        assert_eq!(report.exit_code(), 1);

        let ledger = BuildLedger::load(&config.dist_root, Platform::X86_64_LINUX).unwrap();
        let failed = ledger.get("fmi2", FmiVariant::Fmi2).unwrap();
        assert_eq!(failed.status, BuildStatus::Failed);
        assert!(failed.detail.as_deref().unwrap().contains("configure"));
        assert_eq!(
            ledger.get("fmi3", FmiVariant::Fmi3).unwrap().status,
            BuildStatus::Succeeded
        );
    }

    #[test]
    fn failed_rebuild_removes_stale_packages() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::new(dir.path());
        let stale = config.dist_root.join("dist-x86_64-linux/2.0/Stair.fmu");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, b"previous run").unwrap();

        let report =
            build_platform(&config, &runner(), Platform::X86_64_LINUX, &[FmiVariant::Fmi2]).unwrap();
        assert_eq!(report.failures(), 1);
        assert!(!stale.exists());
        assert!(!config.dist_root.join("dist-x86_64-linux/2.0").exists());
    }
}
