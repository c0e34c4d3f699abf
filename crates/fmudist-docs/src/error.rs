//! Documentation error types.

use std::path::PathBuf;

/// Errors that can occur while rendering documentation or stamping metadata.
#[derive(Debug, thiserror::Error)]
pub enum DocsError {
    /// A template references a placeholder that has no value.
    #[error("unknown template placeholder '{{{{{name}}}}}' on line {line}")]
    UnknownPlaceholder { name: String, line: usize },

    /// A `{{` without a matching `}}`.
    #[error("unclosed template placeholder on line {line}")]
    UnclosedPlaceholder { line: usize },

    /// A template file could not be read.
    #[error("failed to read template {}: {source}", path.display())]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Version-control query failed.
    #[error("{0}")]
    Toolchain(#[from] fmudist_toolchain::ToolchainError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for documentation operations.
pub type Result<T> = std::result::Result<T, DocsError>;
