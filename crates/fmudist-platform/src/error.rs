//! Error types for platform and variant parsing.

/// Errors that can occur while parsing platform identifiers or variants.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The identifier is not of the form `<arch>-<os>`.
    #[error("invalid platform identifier '{identifier}': expected <arch>-<os>")]
    InvalidIdentifier { identifier: String },

    /// Unknown architecture component.
    #[error("unknown architecture '{name}' (expected x86, x86_64 or aarch64)")]
    UnknownArchitecture { name: String },

    /// Unknown operating system component.
    #[error("unknown operating system '{name}' (expected windows, linux or darwin)")]
    UnknownOperatingSystem { name: String },

    /// The architecture/OS pair is not a target the distribution ships.
    #[error("unsupported platform combination '{identifier}'")]
    UnsupportedCombination { identifier: String },

    /// Unknown FMI variant.
    #[error("unknown FMI variant '{name}' (expected 1.0/me, 1.0/cs, 2.0 or 3.0)")]
    UnknownVariant { name: String },

    /// Unknown interface type.
    #[error("unknown interface type '{name}' (expected me or cs)")]
    UnknownInterfaceType { name: String },

    /// A platform list failed validation.
    #[error("invalid platform list: {detail}")]
    InvalidList { detail: String },
}

/// Result type for platform operations.
pub type Result<T> = std::result::Result<T, PlatformError>;
