//! Merge error types.

use std::path::PathBuf;

use fmudist_package::PackageError;
use fmudist_platform::Platform;

/// Errors that abort the merge of one package name.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// Shared content differs between two platform builds.
    #[error(
        "shared file '{entry}' of {package} differs between {first} and {other} \
         ({first_digest} vs {other_digest})"
    )]
    SharedContentConflict {
        package: String,
        entry: String,
        first: Platform,
        other: Platform,
        first_digest: String,
        other_digest: String,
    },

    /// Shared file present in one platform build but not in another.
    #[error("shared file '{entry}' of {package} is present for {present} but missing for {absent}")]
    SharedContentMissing {
        package: String,
        entry: String,
        present: Platform,
        absent: Platform,
    },

    /// The platform builds no partition for this variant.
    #[error("platform {platform} has no binary partition for this variant")]
    NoPartition { platform: Platform },

    /// Reading or writing a package failed.
    #[error("{0}")]
    Package(#[from] PackageError),

    /// Scratch workspace could not be created.
    #[error("scratch workspace error in {}: {source}", path.display())]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for merge operations.
pub type Result<T> = std::result::Result<T, MergeError>;
