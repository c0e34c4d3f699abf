//! Version-control queries used for provenance stamping.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::command::{ProcessRunner, ToolCommand};
use crate::error::Result;

/// What the release pipeline needs to know about the working tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcsState {
    /// Whether tracked files have uncommitted changes.
    pub has_local_changes: bool,
    /// Tag containing HEAD, or the short revision. `None` when the tree is
    /// dirty or neither could be resolved.
    pub release_id: Option<String>,
}

impl VcsState {
    /// Whether the tree is clean.
    pub fn is_clean(&self) -> bool {
        !self.has_local_changes
    }
}

/// Git queries against one repository.
#[derive(Debug, Clone)]
pub struct Git {
    executable: PathBuf,
    repo_dir: PathBuf,
}

impl Git {
    /// Query the repository at `repo_dir` with the `git` on `PATH`.
    pub fn new(repo_dir: &Path) -> Self {
        Self::with_executable(Path::new("git"), repo_dir)
    }

    /// Query the repository at `repo_dir` with a specific git executable.
    pub fn with_executable(executable: &Path, repo_dir: &Path) -> Self {
        Self {
            executable: executable.to_path_buf(),
            repo_dir: repo_dir.to_path_buf(),
        }
    }

    /// `git status --porcelain --untracked=no`
    pub fn status_command(&self) -> ToolCommand {
        self.command(&["status", "--porcelain", "--untracked=no"])
    }

    /// `git tag --contains`
    pub fn tag_command(&self) -> ToolCommand {
        self.command(&["tag", "--contains"])
    }

    /// `git rev-parse --short HEAD`
    pub fn short_revision_command(&self) -> ToolCommand {
        self.command(&["rev-parse", "--short", "HEAD"])
    }

    fn command(&self, args: &[&str]) -> ToolCommand {
        ToolCommand::new(&self.executable)
            .args(args)
            .current_dir(&self.repo_dir)
    }

    /// Whether tracked files have uncommitted changes.
    pub fn has_local_changes(&self, runner: &dyn ProcessRunner) -> Result<bool> {
        let output = runner.run(&self.status_command())?.require_success("git status")?;
        Ok(!output.stdout.trim().is_empty())
    }

    /// Tag containing HEAD, falling back to the short revision.
    pub fn release_id(&self, runner: &dyn ProcessRunner) -> Result<Option<String>> {
        let tags = runner.run(&self.tag_command())?.require_success("git tag")?;
        if let Some(tag) = first_line(&tags.stdout) {
            return Ok(Some(tag));
        }
        let rev = runner
            .run(&self.short_revision_command())?
            .require_success("git rev-parse")?;
        Ok(first_line(&rev.stdout))
    }

    /// Run both queries. The release id is not looked up for a dirty tree.
    pub fn query(&self, runner: &dyn ProcessRunner) -> Result<VcsState> {
        let has_local_changes = self.has_local_changes(runner)?;
        let release_id = if has_local_changes {
            None
        } else {
            self.release_id(runner)?
        };
        debug!(
            target: "fmudist::vcs",
            dirty = has_local_changes,
            release = release_id.as_deref().unwrap_or("-"),
            "queried working tree"
        );
        Ok(VcsState {
            has_local_changes,
            release_id,
        })
    }
}

fn first_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}
