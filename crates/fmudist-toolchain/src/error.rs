//! Toolchain error types.

use std::path::PathBuf;

use fmudist_platform::{FmiVariant, Platform};

/// Errors that can occur while invoking external tools.
#[derive(Debug, thiserror::Error)]
pub enum ToolchainError {
    /// The program could not be started at all.
    #[error("failed to start {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A tool ran but exited unsuccessfully.
    #[error("{tool} exited with {}: {stderr}", exit_code_label(.code))]
    ToolFailed {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The build toolchain failed for one (unit, platform) pair.
    #[error("build of {unit} for {platform} failed during {stage} ({}): {stderr}", exit_code_label(.code))]
    BuildFailed {
        unit: String,
        platform: Platform,
        stage: &'static str,
        code: Option<i32>,
        stderr: String,
    },

    /// The platform does not build the requested variant.
    #[error("platform {platform} does not build FMI variant {variant}")]
    UnsupportedVariant {
        platform: Platform,
        variant: FmiVariant,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Result type alias for toolchain operations.
pub type Result<T> = std::result::Result<T, ToolchainError>;
