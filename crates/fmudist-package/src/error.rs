//! Package error types.

use std::path::PathBuf;

/// Errors that can occur while reading or writing packages.
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    /// The archive could not be opened or one of its entries is unreadable.
    #[error("corrupt package {}: {reason}", path.display())]
    CorruptPackage { path: PathBuf, reason: String },

    /// A required layout element is missing.
    #[error("invalid package layout in {}: missing {missing}", path.display())]
    InvalidLayout { path: PathBuf, missing: String },

    /// A requested entry does not exist in the archive.
    #[error("entry '{name}' not found in {}", path.display())]
    EntryNotFound { path: PathBuf, name: String },

    /// A file name in a directory tree is not valid UTF-8.
    #[error("non UTF-8 path in package tree: {}", path.display())]
    NonUtf8Path { path: PathBuf },

    /// The metadata file is not a readable model description.
    #[error("invalid model description: {detail}")]
    InvalidMetadata { detail: String },

    /// XML parse error in the metadata file.
    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Zip writer error.
    #[error("archive write error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for package operations.
pub type Result<T> = std::result::Result<T, PackageError>;
