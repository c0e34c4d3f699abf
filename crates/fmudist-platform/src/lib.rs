//! Platform and FMI variant model for the fmudist release pipeline.
//!
//! A platform is an (architecture, operating system) pair. Every unit is
//! built once per platform and per FMI variant; the variant decides which
//! platforms take part and how their binary partitions are named inside a
//! package.

pub mod error;
pub mod parse;
pub mod platform;
pub mod variant;

pub use error::{PlatformError, Result};
pub use parse::{
    parse_platform_list, validate_platform_set, PlatformSet,
    ValidationIssue,
};
pub use platform::{Architecture, OperatingSystem, Platform};
pub use variant::{FmiVariant, InterfaceType};
