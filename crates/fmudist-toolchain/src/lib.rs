//! Typed invocations of the external tools the release pipeline drives.
//!
//! Every external process (CMake, the simulator, git) is described by a
//! builder that produces a [`ToolCommand`], and executed through the
//! [`ProcessRunner`] seam. Nothing in this crate reads the environment or
//! the current directory; all paths come from explicit configuration.

pub mod build;
pub mod cmake;
pub mod command;
pub mod error;
pub mod simulator;
pub mod vcs;

pub use build::{BuildDriver, BuildRequest, InstallTree, StagedBuild};
pub use cmake::BuildConfig;
pub use command::{ProcessRunner, SystemRunner, ToolCommand, ToolOutput};
#[cfg(any(test, feature = "test-support"))]
pub use command::RecordingRunner;
pub use error::{Result, ToolchainError};
pub use simulator::{SimulatorInvocation, Solver};
pub use vcs::{Git, VcsState};
