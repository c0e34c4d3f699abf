//! Scoped scratch workspaces.

use std::path::{Path, PathBuf};

use fmudist_package::{serialize, Package};
use tempfile::TempDir;

use crate::error::{MergeError, Result};

/// A temporary directory a merged package is assembled in.
///
/// Removed when dropped, on every exit path.
#[derive(Debug)]
pub struct ScratchWorkspace {
    dir: TempDir,
}

impl ScratchWorkspace {
    /// Create a workspace under `root`, or under the system temp directory.
    pub fn new(root: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("fmudist-merge-");
        let dir = match root {
            Some(root) => {
                std::fs::create_dir_all(root).map_err(|source| MergeError::Workspace {
                    path: root.to_path_buf(),
                    source,
                })?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
        .map_err(|source| MergeError::Workspace {
            path: root.map(Path::to_path_buf).unwrap_or_else(std::env::temp_dir),
            source,
        })?;
        Ok(Self { dir })
    }

    /// Root of the workspace tree.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of an entry inside the workspace.
    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Serialize the workspace tree into a package at `out`.
    pub fn serialize(&self, out: &Path) -> Result<Package> {
        Ok(serialize(self.dir.path(), out)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let path = {
            let ws = ScratchWorkspace::new(Some(root.path())).unwrap();
            std::fs::write(ws.join("modelDescription.xml"), b"<x/>").unwrap();
            ws.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn serialize_writes_package() {
        let root = tempfile::tempdir().unwrap();
        let ws = ScratchWorkspace::new(None).unwrap();
        std::fs::write(ws.join("modelDescription.xml"), b"<x/>").unwrap();
        let pkg = ws.serialize(&root.path().join("out/A.fmu")).unwrap();
        assert!(pkg.contains("modelDescription.xml"));
    }
}
