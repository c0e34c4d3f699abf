//! Process invocation seam.
//!
//! A [`ToolCommand`] is a fully-resolved description of one external
//! process call. [`ProcessRunner`] executes it; [`SystemRunner`] is the
//! real implementation, tests substitute a recording runner.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::{Result, ToolchainError};

/// One external process call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    /// Program to execute.
    pub program: PathBuf,
    /// Arguments, in order.
    pub args: Vec<OsString>,
    /// Working directory, if different from the caller's.
    pub cwd: Option<PathBuf>,
}

impl ToolCommand {
    /// Start a command for `program` with no arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Append a `-D NAME=value` CMake definition.
    pub fn define(self, name: &str, value: impl AsRef<OsStr>) -> Self {
        let mut def = OsString::from(format!("{name}="));
        def.push(value.as_ref());
        self.arg("-D").arg(def)
    }

    /// Set the working directory.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Arguments as lossy UTF-8 strings.
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// Value following the first occurrence of `flag`, if any.
    pub fn flag_value(&self, flag: &str) -> Option<&OsStr> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(OsString::as_os_str)
    }

    /// Human-readable command line for logs.
    pub fn display(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code; `None` if the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// A successful output with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed output with the given exit code and stderr.
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the process exited with code 0.
    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    /// Convert a non-zero exit into [`ToolchainError::ToolFailed`].
    pub fn require_success(self, tool: &str) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ToolchainError::ToolFailed {
                tool: tool.to_string(),
                code: self.code,
                stderr: tail(&self.stderr, 20),
            })
        }
    }
}

/// Last `lines` lines of `text`, for error messages.
pub(crate) fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}

/// Executes tool commands.
///
/// A runner returns `Ok` for any process that ran to completion, whatever
/// its exit code; callers decide what a non-zero exit means.
pub trait ProcessRunner {
    /// Run the command to completion and capture its output.
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput>;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput> {
        debug!(target: "fmudist::toolchain", command = %command.display(), "running");
        let mut process = Command::new(&command.program);
        process.args(&command.args);
        if let Some(ref cwd) = command.cwd {
            process.current_dir(cwd);
        }
        let output = process.output().map_err(|source| ToolchainError::Spawn {
            program: command.program.clone(),
            source,
        })?;
        Ok(ToolOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(any(test, feature = "test-support"))]
mod recording {
    use std::cell::RefCell;

    use super::{ProcessRunner, ToolCommand, ToolOutput};
    use crate::error::Result;

    type Handler = Box<dyn Fn(&ToolCommand) -> Result<ToolOutput>>;

    /// A runner that records every command and answers with a scripted handler.
    pub struct RecordingRunner {
        handler: Handler,
        calls: RefCell<Vec<ToolCommand>>,
    }

    impl RecordingRunner {
        /// Answer every command with `handler`.
        pub fn new(handler: impl Fn(&ToolCommand) -> Result<ToolOutput> + 'static) -> Self {
            Self {
                handler: Box::new(handler),
                calls: RefCell::new(Vec::new()),
            }
        }

        /// Answer every command with a successful, empty output.
        pub fn succeeding() -> Self {
            Self::new(|_| Ok(ToolOutput::success("")))
        }

        /// Commands run so far, in order.
        pub fn calls(&self) -> Vec<ToolCommand> {
            self.calls.borrow().clone()
        }
    }

    impl ProcessRunner for RecordingRunner {
        fn run(&self, command: &ToolCommand) -> Result<ToolOutput> {
            self.calls.borrow_mut().push(command.clone());
            (self.handler)(command)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use recording::RecordingRunner;
