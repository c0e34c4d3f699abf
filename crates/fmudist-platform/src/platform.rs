//! Target platform model.
//!
//! A platform is identified as `<arch>-<os>` (e.g. `x86_64-linux`). The
//! identifier is used for build directory names, distribution directory
//! names, and (for FMI 3.0) the binary partition inside a package.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PlatformError, Result};
use crate::variant::FmiVariant;

/// CPU architecture of a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Architecture {
    /// 32-bit x86.
    X86,
    /// 64-bit x86.
    X86_64,
    /// 64-bit ARM.
    Aarch64,
}

impl Architecture {
    /// The identifier component used in platform tuples.
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::X86 => "x86",
            Architecture::X86_64 => "x86_64",
            Architecture::Aarch64 => "aarch64",
        }
    }
}

impl FromStr for Architecture {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "x86" => Ok(Architecture::X86),
            "x86_64" => Ok(Architecture::X86_64),
            "aarch64" => Ok(Architecture::Aarch64),
            other => Err(PlatformError::UnknownArchitecture {
                name: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operating system of a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperatingSystem {
    Windows,
    Linux,
    Darwin,
}

impl OperatingSystem {
    /// The identifier component used in platform tuples.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperatingSystem::Windows => "windows",
            OperatingSystem::Linux => "linux",
            OperatingSystem::Darwin => "darwin",
        }
    }
}

impl FromStr for OperatingSystem {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "windows" => Ok(OperatingSystem::Windows),
            "linux" => Ok(OperatingSystem::Linux),
            "darwin" => Ok(OperatingSystem::Darwin),
            other => Err(PlatformError::UnknownOperatingSystem {
                name: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A build target: architecture plus operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Platform {
    /// CPU architecture.
    pub arch: Architecture,
    /// Operating system.
    pub os: OperatingSystem,
}

impl Platform {
    pub const X86_WINDOWS: Platform = Platform::new(Architecture::X86, OperatingSystem::Windows);
    pub const X86_64_WINDOWS: Platform =
        Platform::new(Architecture::X86_64, OperatingSystem::Windows);
    pub const X86_64_LINUX: Platform = Platform::new(Architecture::X86_64, OperatingSystem::Linux);
    pub const AARCH64_LINUX: Platform =
        Platform::new(Architecture::Aarch64, OperatingSystem::Linux);
    pub const X86_64_DARWIN: Platform =
        Platform::new(Architecture::X86_64, OperatingSystem::Darwin);
    pub const AARCH64_DARWIN: Platform =
        Platform::new(Architecture::Aarch64, OperatingSystem::Darwin);

    /// Construct a platform from its two components.
    ///
    /// No validation; use [`Platform::from_str`] for untrusted input.
    pub const fn new(arch: Architecture, os: OperatingSystem) -> Self {
        Self { arch, os }
    }

    /// The platforms the distribution ships, in the declared merge order.
    ///
    /// The first platform in this order supplies the shared metadata and
    /// resources of every merged package.
    pub fn builtin_order() -> Vec<Platform> {
        vec![
            Platform::X86_WINDOWS,
            Platform::X86_64_WINDOWS,
            Platform::X86_64_LINUX,
            Platform::AARCH64_LINUX,
            Platform::X86_64_DARWIN,
            Platform::AARCH64_DARWIN,
        ]
    }

    /// The platform this process is running on, if it is a shipped target.
    pub fn host() -> Option<Platform> {
        let arch = match std::env::consts::ARCH {
            "x86" => Architecture::X86,
            "x86_64" => Architecture::X86_64,
            "aarch64" => Architecture::Aarch64,
            _ => return None,
        };
        let os = match std::env::consts::OS {
            "windows" => OperatingSystem::Windows,
            "linux" => OperatingSystem::Linux,
            "macos" => OperatingSystem::Darwin,
            _ => return None,
        };
        let platform = Platform::new(arch, os);
        platform.is_shipped().then_some(platform)
    }

    /// Whether this combination is one the distribution builds at all.
    pub fn is_shipped(&self) -> bool {
        !matches!(
            (self.arch, self.os),
            (Architecture::X86, OperatingSystem::Linux) | (Architecture::X86, OperatingSystem::Darwin)
        )
    }

    /// Whether units are built for this platform under the given variant.
    pub fn supports(&self, variant: FmiVariant) -> bool {
        match variant {
            FmiVariant::Fmi3 => self.is_shipped(),
            FmiVariant::Fmi1Me | FmiVariant::Fmi1Cs | FmiVariant::Fmi2 => matches!(
                *self,
                Platform::X86_WINDOWS
                    | Platform::X86_64_WINDOWS
                    | Platform::X86_64_LINUX
                    | Platform::X86_64_DARWIN
            ),
        }
    }

    /// Name of this platform's partition under `binaries/` for the given variant.
    ///
    /// Returns `None` when the platform does not support the variant.
    pub fn binary_partition(&self, variant: FmiVariant) -> Option<String> {
        if !self.supports(variant) {
            return None;
        }
        match variant {
            FmiVariant::Fmi3 => Some(self.to_string()),
            FmiVariant::Fmi1Me | FmiVariant::Fmi1Cs | FmiVariant::Fmi2 => {
                let name = match *self {
                    Platform::X86_WINDOWS => "win32",
                    Platform::X86_64_WINDOWS => "win64",
                    Platform::X86_64_LINUX => "linux64",
                    Platform::X86_64_DARWIN => "darwin64",
                    _ => return None,
                };
                Some(name.to_string())
            }
        }
    }

    /// Directory holding this platform's staged packages (`dist-<id>`).
    pub fn dist_dir_name(&self) -> String {
        format!("dist-{self}")
    }

    /// Directory holding this platform's auxiliary executables (`fmusim-<id>`).
    pub fn tools_dir_name(&self) -> String {
        format!("fmusim-{self}")
    }

    /// File name suffix for executables on this platform.
    pub fn executable_suffix(&self) -> &'static str {
        match self.os {
            OperatingSystem::Windows => ".exe",
            OperatingSystem::Linux | OperatingSystem::Darwin => "",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.arch, self.os)
    }
}

impl FromStr for Platform {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self> {
        // The architecture may itself contain an underscore but never a dash.
        let (arch, os) = s
            .split_once('-')
            .ok_or_else(|| PlatformError::InvalidIdentifier {
                identifier: s.to_string(),
            })?;
        let platform = Platform::new(arch.parse()?, os.parse()?);
        if !platform.is_shipped() {
            return Err(PlatformError::UnsupportedCombination {
                identifier: s.to_string(),
            });
        }
        Ok(platform)
    }
}

impl TryFrom<String> for Platform {
    type Error = PlatformError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Platform> for String {
    fn from(platform: Platform) -> Self {
        platform.to_string()
    }
}
