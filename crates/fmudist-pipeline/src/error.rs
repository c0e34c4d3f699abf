//! Pipeline error types.

use std::path::PathBuf;

use fmudist_docs::DocsError;
use fmudist_merge::MergeError;
use fmudist_package::PackageError;
use fmudist_platform::{FmiVariant, Platform, PlatformError};
use fmudist_reference::ReferenceError;
use fmudist_toolchain::ToolchainError;
use thiserror::Error;

/// Errors that can occur while orchestrating a release.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A merge was attempted before every required build was recorded.
    #[error("build barrier not satisfied for FMI {variant}: no build record from {}", platform_list(.missing))]
    BarrierNotSatisfied {
        variant: FmiVariant,
        missing: Vec<Platform>,
    },

    #[error("invalid configuration: {detail}")]
    InvalidConfig { detail: String },

    #[error("unit {unit} has no run parameters")]
    NoRunParameters { unit: String },

    #[error("merged package not found: {}", path.display())]
    MissingPackage { path: PathBuf },

    #[error("build ledger {} is unreadable: {source}", path.display())]
    Ledger {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("toolchain error: {0}")]
    Toolchain(#[from] ToolchainError),

    #[error("package error: {0}")]
    Package(#[from] PackageError),

    #[error("merge error: {0}")]
    Merge(#[from] MergeError),

    #[error("reference error: {0}")]
    Reference(#[from] ReferenceError),

    #[error("documentation error: {0}")]
    Docs(#[from] DocsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn platform_list(platforms: &[Platform]) -> String {
    platforms
        .iter()
        .map(Platform::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
