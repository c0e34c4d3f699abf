//! FMI variants and interface types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PlatformError, Result};

/// Interface mode a package is simulated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterfaceType {
    /// Model exchange (the importer integrates the model).
    #[serde(rename = "me")]
    ModelExchange,
    /// Co-simulation (the model carries its own solver).
    #[serde(rename = "cs")]
    CoSimulation,
}

impl InterfaceType {
    /// Short flag value (`me`/`cs`).
    pub fn as_str(&self) -> &'static str {
        match self {
            InterfaceType::ModelExchange => "me",
            InterfaceType::CoSimulation => "cs",
        }
    }
}

impl fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterfaceType {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "me" => Ok(InterfaceType::ModelExchange),
            "cs" => Ok(InterfaceType::CoSimulation),
            other => Err(PlatformError::UnknownInterfaceType {
                name: other.to_string(),
            }),
        }
    }
}

/// A flavour of the distribution, built and merged independently.
///
/// FMI 1.0 ships separate model-exchange and co-simulation packages; later
/// versions carry both interfaces in one package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FmiVariant {
    Fmi1Me,
    Fmi1Cs,
    Fmi2,
    Fmi3,
}

impl FmiVariant {
    /// All variants in release order.
    pub const ALL: [FmiVariant; 4] = [
        FmiVariant::Fmi1Me,
        FmiVariant::Fmi1Cs,
        FmiVariant::Fmi2,
        FmiVariant::Fmi3,
    ];

    /// Distribution subdirectory (`1.0/me`, `1.0/cs`, `2.0`, `3.0`).
    pub fn dist_subdir(&self) -> &'static str {
        match self {
            FmiVariant::Fmi1Me => "1.0/me",
            FmiVariant::Fmi1Cs => "1.0/cs",
            FmiVariant::Fmi2 => "2.0",
            FmiVariant::Fmi3 => "3.0",
        }
    }

    /// Major FMI version passed to the build toolchain.
    pub fn major_version(&self) -> u8 {
        match self {
            FmiVariant::Fmi1Me | FmiVariant::Fmi1Cs => 1,
            FmiVariant::Fmi2 => 2,
            FmiVariant::Fmi3 => 3,
        }
    }

    /// Interface type the build is restricted to, if any.
    pub fn build_interface(&self) -> Option<InterfaceType> {
        match self {
            FmiVariant::Fmi1Me => Some(InterfaceType::ModelExchange),
            FmiVariant::Fmi1Cs => Some(InterfaceType::CoSimulation),
            FmiVariant::Fmi2 | FmiVariant::Fmi3 => None,
        }
    }

    /// Default build unit name (`fmi1`, `fmi2`, `fmi3`).
    pub fn build_unit(&self) -> String {
        format!("fmi{}", self.major_version())
    }

    /// Whether packages of this variant can be simulated with `interface`.
    pub fn supports_interface(&self, interface: InterfaceType) -> bool {
        match self.build_interface() {
            Some(only) => only == interface,
            None => true,
        }
    }

    /// Interface type used for reference regeneration unless a unit overrides it.
    pub fn default_interface(&self) -> InterfaceType {
        match self {
            FmiVariant::Fmi1Cs => InterfaceType::CoSimulation,
            FmiVariant::Fmi1Me | FmiVariant::Fmi2 | FmiVariant::Fmi3 => {
                InterfaceType::ModelExchange
            }
        }
    }
}

impl fmt::Display for FmiVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dist_subdir())
    }
}

impl FromStr for FmiVariant {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "1.0/me" => Ok(FmiVariant::Fmi1Me),
            "1.0/cs" => Ok(FmiVariant::Fmi1Cs),
            "2.0" => Ok(FmiVariant::Fmi2),
            "3.0" => Ok(FmiVariant::Fmi3),
            other => Err(PlatformError::UnknownVariant {
                name: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for FmiVariant {
    type Error = PlatformError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<FmiVariant> for String {
    fn from(variant: FmiVariant) -> Self {
        variant.to_string()
    }
}
