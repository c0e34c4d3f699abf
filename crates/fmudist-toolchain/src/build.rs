//! Platform build driver.
//!
//! Each (unit, platform, variant) triple is built in its own directory
//! under the build root:
//!
//! ```text
//! <build-root>/<unit>-<platform>[-me|-cs]/
//!   install/        CMAKE_INSTALL_PREFIX: packages and simulator
//!   temp/           example executables
//! ```
//!
//! Builds share no state; a failure for one triple leaves every other
//! build directory untouched.

use std::fs;
use std::path::{Path, PathBuf};

use fmudist_platform::{FmiVariant, Platform};
use tracing::{debug, info};

use crate::cmake::{self, BuildConfig};
use crate::command::{tail, ProcessRunner, ToolCommand};
use crate::error::{Result, ToolchainError};

/// Prefix of the simulator executables produced by a build.
pub const SIMULATOR_PREFIX: &str = "fmusim";

/// One build to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Build unit name (defaults to `fmi<version>`).
    pub unit: String,
    pub platform: Platform,
    pub variant: FmiVariant,
}

impl BuildRequest {
    /// Request the default unit for `variant` on `platform`.
    pub fn new(platform: Platform, variant: FmiVariant) -> Self {
        Self {
            unit: variant.build_unit(),
            platform,
            variant,
        }
    }

    /// `<unit>-<platform>` with a `-me`/`-cs` suffix for interface-specific variants.
    pub fn build_dir_name(&self) -> String {
        match self.variant.build_interface() {
            Some(interface) => format!("{}-{}-{}", self.unit, self.platform, interface),
            None => format!("{}-{}", self.unit, self.platform),
        }
    }
}

/// Files a finished build installed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallTree {
    /// `<build-dir>/install`.
    pub root: PathBuf,
    /// The build directory itself.
    pub build_dir: PathBuf,
    /// Package files (`*.fmu`), sorted.
    pub packages: Vec<PathBuf>,
    /// Simulator executables (`fmusim*`), sorted.
    pub executables: Vec<PathBuf>,
    /// Example executables under `<build-dir>/temp`, sorted.
    pub examples: Vec<PathBuf>,
}

impl InstallTree {
    /// Scan a build directory for installed artifacts.
    pub fn scan(build_dir: &Path) -> Result<Self> {
        let root = build_dir.join("install");
        let mut tree = InstallTree {
            root: root.clone(),
            build_dir: build_dir.to_path_buf(),
            ..Default::default()
        };

        let mut files = Vec::new();
        if root.is_dir() {
            walk_files(&root, &mut files)?;
        }
        for file in files {
            let Some(name) = file.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.ends_with(".fmu") {
                tree.packages.push(file);
            } else if name.starts_with(SIMULATOR_PREFIX) {
                tree.executables.push(file);
            }
        }

        let temp = build_dir.join("temp");
        if temp.is_dir() {
            for entry in fs::read_dir(&temp)? {
                let path = entry?.path();
                if path.is_file() && is_executable(&path) {
                    tree.examples.push(path);
                }
            }
        }

        tree.packages.sort();
        tree.executables.sort();
        tree.examples.sort();
        Ok(tree)
    }
}

/// Where a build's artifacts were staged for merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedBuild {
    /// `<dist-root>/dist-<platform>/<variant-dir>`.
    pub packages_dir: PathBuf,
    /// `<dist-root>/dist-<platform>/fmusim-<platform>`.
    pub tools_dir: PathBuf,
    /// Staged package files.
    pub packages: Vec<PathBuf>,
}

/// Runs the native build toolchain for one (unit, platform) pair at a time.
pub struct BuildDriver<'a> {
    config: BuildConfig,
    runner: &'a dyn ProcessRunner,
}

impl<'a> BuildDriver<'a> {
    pub fn new(config: BuildConfig, runner: &'a dyn ProcessRunner) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Configure, build and install one request.
    ///
    /// The build directory is recreated from scratch. A platform that does
    /// not build the variant is rejected before any process runs.
    pub fn build(&self, request: &BuildRequest) -> Result<InstallTree> {
        if !request.platform.supports(request.variant) {
            return Err(ToolchainError::UnsupportedVariant {
                platform: request.platform,
                variant: request.variant,
            });
        }

        let build_dir = self.config.build_root.join(request.build_dir_name());
        if build_dir.exists() {
            fs::remove_dir_all(&build_dir)?;
        }
        fs::create_dir_all(&build_dir)?;
        let install_dir = build_dir.join("install");

        info!(
            target: "fmudist::build",
            unit = %request.unit,
            platform = %request.platform,
            variant = %request.variant,
            "building"
        );

        let configure = cmake::configure_command(&self.config, request, &build_dir, &install_dir);
        self.run_stage(request, "configure", &configure)?;
        let build = cmake::build_command(&self.config, &build_dir);
        self.run_stage(request, "build", &build)?;

        let tree = InstallTree::scan(&build_dir)?;
        info!(
            target: "fmudist::build",
            unit = %request.unit,
            platform = %request.platform,
            packages = tree.packages.len(),
            "build finished"
        );
        Ok(tree)
    }

    fn run_stage(&self, request: &BuildRequest, stage: &'static str, cmd: &ToolCommand) -> Result<()> {
        debug!(target: "fmudist::build", stage, command = %cmd.display());
        let output = self.runner.run(cmd)?;
        if output.is_success() {
            return Ok(());
        }
        Err(ToolchainError::BuildFailed {
            unit: request.unit.clone(),
            platform: request.platform,
            stage,
            code: output.code,
            stderr: tail(&output.stderr, 20),
        })
    }
}

/// Copy a build's packages and executables into the distribution root.
///
/// The variant's package directory is recreated so stale packages from an
/// earlier build never reach the merge. Executables go into the platform's
/// tools directory, which is created if missing.
pub fn stage(
    tree: &InstallTree,
    request: &BuildRequest,
    dist_root: &Path,
) -> Result<StagedBuild> {
    let platform_dir = dist_root.join(request.platform.dist_dir_name());
    let packages_dir = platform_dir.join(request.variant.dist_subdir());
    let tools_dir = platform_dir.join(request.platform.tools_dir_name());

    if packages_dir.exists() {
        fs::remove_dir_all(&packages_dir)?;
    }
    fs::create_dir_all(&packages_dir)?;

    let mut packages = Vec::with_capacity(tree.packages.len());
    for package in &tree.packages {
        if let Some(name) = package.file_name() {
            let target = packages_dir.join(name);
            fs::copy(package, &target)?;
            packages.push(target);
        }
    }

    if !tree.executables.is_empty() {
        fs::create_dir_all(&tools_dir)?;
        for exe in &tree.executables {
            if let Some(name) = exe.file_name() {
                fs::copy(exe, tools_dir.join(name))?;
            }
        }
    }

    debug!(
        target: "fmudist::build",
        platform = %request.platform,
        variant = %request.variant,
        dir = %packages_dir.display(),
        staged = packages.len(),
        "staged packages"
    );
    Ok(StagedBuild {
        packages_dir,
        tools_dir,
        packages,
    })
}

/// Remove the staged packages of `request`'s platform and variant.
///
/// Called after a failed build so packages from an earlier run cannot be
/// merged in its place. Returns whether anything was removed.
pub fn unstage(request: &BuildRequest, dist_root: &Path) -> Result<bool> {
    let packages_dir = dist_root
        .join(request.platform.dist_dir_name())
        .join(request.variant.dist_subdir());
    if !packages_dir.exists() {
        return Ok(false);
    }
    fs::remove_dir_all(&packages_dir)?;
    info!(
        target: "fmudist::build",
        platform = %request.platform,
        variant = %request.variant,
        dir = %packages_dir.display(),
        "removed stale staged packages"
    );
    Ok(true)
}

fn walk_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            walk_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("exe")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{RecordingRunner, ToolOutput};

    /// A runner that behaves like a successful CMake install.
    fn installing_runner() -> RecordingRunner {
        RecordingRunner::new(|cmd| {
            if let Some(prefix) = cmd
                .args_lossy()
                .iter()
                .find_map(|a| a.strip_prefix("CMAKE_INSTALL_PREFIX=").map(PathBuf::from))
            {
                fs::create_dir_all(&prefix)?;
                fs::write(prefix.join("BouncingBall.fmu"), b"pk")?;
                fs::write(prefix.join("Dahlquist.fmu"), b"pk")?;
                fs::write(prefix.join("fmusim"), b"exe")?;
                fs::write(prefix.join("README.txt"), b"ignored")?;
            }
            Ok(ToolOutput::success(""))
        })
    }

    #[test]
    fn build_dir_names() {
        let req = BuildRequest::new(Platform::X86_64_LINUX, FmiVariant::Fmi1Me);
        assert_eq!(req.build_dir_name(), "fmi1-x86_64-linux-me");
        let req = BuildRequest::new(Platform::AARCH64_DARWIN, FmiVariant::Fmi3);
        assert_eq!(req.build_dir_name(), "fmi3-aarch64-darwin");
    }

    #[test]
    fn build_runs_configure_then_install() {
        let dir = tempfile::tempdir().unwrap();
        let runner = installing_runner();
        let config = BuildConfig::new(Path::new("/src"), dir.path());
        let driver = BuildDriver::new(config, &runner);

        let req = BuildRequest::new(Platform::X86_64_LINUX, FmiVariant::Fmi3);
        let tree = driver.build(&req).unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].args_lossy()[0], "--build");
        assert_eq!(tree.root, dir.path().join("fmi3-x86_64-linux/install"));
        assert_eq!(tree.packages.len(), 2);
        assert!(tree.packages[0].ends_with("BouncingBall.fmu"));
        assert_eq!(tree.executables.len(), 1);
    }

    #[test]
    fn stale_build_dir_is_recreated() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("fmi3-x86_64-linux/install");
        fs::create_dir_all(&stale).unwrap();
        fs::write(stale.join("Old.fmu"), b"old").unwrap();

        let runner = installing_runner();
        let driver = BuildDriver::new(BuildConfig::new(Path::new("/src"), dir.path()), &runner);
        let tree = driver
            .build(&BuildRequest::new(Platform::X86_64_LINUX, FmiVariant::Fmi3))
            .unwrap();
        assert!(!tree.packages.iter().any(|p| p.ends_with("Old.fmu")));
    }

    #[test]
    fn nonzero_exit_is_build_failure() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::new(|_| Ok(ToolOutput::failure(1, "CMake Error: no compiler")));
        let driver = BuildDriver::new(BuildConfig::new(Path::new("/src"), dir.path()), &runner);

        let err = driver
            .build(&BuildRequest::new(Platform::X86_64_WINDOWS, FmiVariant::Fmi2))
            .unwrap_err();
        match err {
            ToolchainError::BuildFailed { stage, code, ref stderr, .. } => {
                assert_eq!(stage, "configure");
                assert_eq!(code, Some(1));
                assert!(stderr.contains("no compiler"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn unsupported_variant_runs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::succeeding();
        let driver = BuildDriver::new(BuildConfig::new(Path::new("/src"), dir.path()), &runner);
        let err = driver
            .build(&BuildRequest::new(Platform::AARCH64_LINUX, FmiVariant::Fmi2))
            .unwrap_err();
        assert!(matches!(err, ToolchainError::UnsupportedVariant { .. }));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn stage_copies_into_dist_layout() {
        let dir = tempfile::tempdir().unwrap();
        let runner = installing_runner();
        let driver = BuildDriver::new(
            BuildConfig::new(Path::new("/src"), &dir.path().join("build")),
            &runner,
        );
        let req = BuildRequest::new(Platform::X86_64_LINUX, FmiVariant::Fmi1Cs);
        let tree = driver.build(&req).unwrap();

        let dist = dir.path().join("fmus");
        let staged = stage(&tree, &req, &dist).unwrap();
        assert_eq!(staged.packages_dir, dist.join("dist-x86_64-linux/1.0/cs"));
        assert!(staged.packages_dir.join("Dahlquist.fmu").is_file());
        assert!(dist.join("dist-x86_64-linux/fmusim-x86_64-linux/fmusim").is_file());
        assert_eq!(staged.packages.len(), 2);
    }

    #[test]
    fn unstage_removes_only_that_variant() {
        let dir = tempfile::tempdir().unwrap();
        let dist = dir.path().join("fmus");
        let cs = dist.join("dist-x86_64-linux/1.0/cs");
        let fmi3 = dist.join("dist-x86_64-linux/3.0");
        fs::create_dir_all(&cs).unwrap();
        fs::create_dir_all(&fmi3).unwrap();
        fs::write(cs.join("Dahlquist.fmu"), b"old").unwrap();

        let req = BuildRequest::new(Platform::X86_64_LINUX, FmiVariant::Fmi1Cs);
        assert!(unstage(&req, &dist).unwrap());
        assert!(!cs.exists());
        assert!(fmi3.is_dir());
        assert!(!unstage(&req, &dist).unwrap());
    }
}
