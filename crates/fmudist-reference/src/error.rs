//! Reference regeneration error types.

use std::path::PathBuf;

use fmudist_toolchain::ToolchainError;

/// Errors that abort regeneration or validation for one unit.
#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    /// The simulator ran and exited unsuccessfully.
    #[error("simulation of {unit} failed ({}): {stderr}", exit_label(.code))]
    SimulatorFailed {
        unit: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The simulator executable does not exist.
    #[error("simulator not found at {}", path.display())]
    SimulatorNotFound { path: PathBuf },

    /// Run parameters are inconsistent with the variant.
    #[error("invalid run parameters for {unit}: {detail}")]
    InvalidParameters { unit: String, detail: String },

    /// A result table could not be parsed.
    #[error("invalid result table {}: {detail}", path.display())]
    InvalidResult { path: PathBuf, detail: String },

    /// Launching the simulator failed.
    #[error("{0}")]
    Toolchain(#[from] ToolchainError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// Result type alias for reference operations.
pub type Result<T> = std::result::Result<T, ReferenceError>;
