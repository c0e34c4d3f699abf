//! CMake invocation builders for the platform build.

use std::path::{Path, PathBuf};

use fmudist_platform::{Architecture, InterfaceType, OperatingSystem, Platform};

use crate::build::BuildRequest;
use crate::command::ToolCommand;

/// Generator used for Windows builds unless configured otherwise.
pub const DEFAULT_WINDOWS_GENERATOR: &str = "Visual Studio 17 2022";

/// Toolchain file used to cross-compile for `aarch64-linux`.
pub const AARCH64_LINUX_TOOLCHAIN_FILE: &str = "aarch64-linux-toolchain.cmake";

/// Explicit configuration for the build toolchain.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// CMake executable.
    pub cmake: PathBuf,
    /// Top-level source directory passed to CMake.
    pub source_dir: PathBuf,
    /// Root under which per-(unit, platform) build directories are created.
    pub build_root: PathBuf,
    /// Directory holding cross-compilation toolchain files.
    pub toolchain_dir: PathBuf,
    /// CMake generator; Windows builds default to Visual Studio.
    pub generator: Option<String>,
    /// Whether to build the simulator alongside the packages.
    pub with_simulator: bool,
}

impl BuildConfig {
    /// Configuration with defaults for everything but the two roots.
    pub fn new(source_dir: &Path, build_root: &Path) -> Self {
        Self {
            cmake: PathBuf::from("cmake"),
            source_dir: source_dir.to_path_buf(),
            build_root: build_root.to_path_buf(),
            toolchain_dir: build_root.to_path_buf(),
            generator: None,
            with_simulator: true,
        }
    }
}

/// The configure step: `cmake [platform flags] -D ... -B <build> <source>`.
pub fn configure_command(
    config: &BuildConfig,
    request: &BuildRequest,
    build_dir: &Path,
    install_dir: &Path,
) -> ToolCommand {
    let platform = request.platform;
    let mut cmd = ToolCommand::new(&config.cmake);

    if platform.os == OperatingSystem::Windows {
        let generator = config
            .generator
            .as_deref()
            .unwrap_or(DEFAULT_WINDOWS_GENERATOR);
        let arch = match platform.arch {
            Architecture::X86 => "Win32",
            _ => "x64",
        };
        cmd = cmd.arg("-G").arg(generator).arg("-A").arg(arch);
    } else {
        if let Some(ref generator) = config.generator {
            cmd = cmd.arg("-G").arg(generator);
        }
        match platform {
            Platform::AARCH64_LINUX => {
                cmd = cmd.define(
                    "CMAKE_TOOLCHAIN_FILE",
                    config.toolchain_dir.join(AARCH64_LINUX_TOOLCHAIN_FILE),
                );
            }
            Platform::X86_64_DARWIN => {
                cmd = cmd.define("CMAKE_OSX_ARCHITECTURES", "x86_64");
            }
            Platform::AARCH64_DARWIN => {
                cmd = cmd.define("CMAKE_OSX_ARCHITECTURES", "arm64");
            }
            _ => {}
        }
    }

    if let Some(interface) = request.variant.build_interface() {
        let fmi_type = match interface {
            InterfaceType::ModelExchange => "ME",
            InterfaceType::CoSimulation => "CS",
        };
        cmd = cmd.define("FMI_TYPE", fmi_type);
    }

    cmd.define("CMAKE_INSTALL_PREFIX", install_dir)
        .define("FMI_VERSION", request.variant.major_version().to_string())
        .define("FMI_ARCHITECTURE", platform.arch.as_str())
        .define("WITH_FMUSIM", if config.with_simulator { "ON" } else { "OFF" })
        .arg("-B")
        .arg(build_dir)
        .arg(&config.source_dir)
}

/// The build step: `cmake --build <build> --target install --config Release`.
pub fn build_command(config: &BuildConfig, build_dir: &Path) -> ToolCommand {
    ToolCommand::new(&config.cmake)
        .arg("--build")
        .arg(build_dir)
        .args(["--target", "install", "--config", "Release"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use fmudist_platform::FmiVariant;

    fn config() -> BuildConfig {
        BuildConfig::new(Path::new("/src"), Path::new("/build"))
    }

    fn configure_args(platform: Platform, variant: FmiVariant) -> Vec<String> {
        let request = BuildRequest::new(platform, variant);
        configure_command(
            &config(),
            &request,
            Path::new("/build/b"),
            Path::new("/build/b/install"),
        )
        .args_lossy()
    }

    #[test]
    fn linux_fmi3_configure() {
        let args = configure_args(Platform::X86_64_LINUX, FmiVariant::Fmi3);
        assert_eq!(
            args,
            [
                "-D",
                "CMAKE_INSTALL_PREFIX=/build/b/install",
                "-D",
                "FMI_VERSION=3",
                "-D",
                "FMI_ARCHITECTURE=x86_64",
                "-D",
                "WITH_FMUSIM=ON",
                "-B",
                "/build/b",
                "/src",
            ]
        );
    }

    #[test]
    fn windows_x86_uses_win32_and_default_generator() {
        let args = configure_args(Platform::X86_WINDOWS, FmiVariant::Fmi1Cs);
        assert_eq!(&args[..4], ["-G", DEFAULT_WINDOWS_GENERATOR, "-A", "Win32"]);
        assert!(args.contains(&"FMI_TYPE=CS".to_string()));
        assert!(args.contains(&"FMI_ARCHITECTURE=x86".to_string()));
    }

    #[test]
    fn aarch64_linux_uses_toolchain_file() {
        let args = configure_args(Platform::AARCH64_LINUX, FmiVariant::Fmi3);
        assert_eq!(args[0], "-D");
        assert_eq!(
            args[1],
            "CMAKE_TOOLCHAIN_FILE=/build/aarch64-linux-toolchain.cmake"
        );
    }

    #[test]
    fn darwin_sets_osx_architectures() {
        let args = configure_args(Platform::AARCH64_DARWIN, FmiVariant::Fmi3);
        assert!(args.contains(&"CMAKE_OSX_ARCHITECTURES=arm64".to_string()));
    }

    #[test]
    fn build_step() {
        let cmd = build_command(&config(), Path::new("/build/b"));
        assert_eq!(
            cmd.display(),
            "cmake --build /build/b --target install --config Release"
        );
    }
}
