//! `fmudist init`: write a project manifest.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::manifest::{FmudistManifest, MANIFEST_FILE};

/// Write a default `fmudist.toml` into `project_dir`.
///
/// The project name defaults to the directory name.
pub fn run(project_dir: &Path, name: Option<&str>) -> Result<()> {
    let name = match name {
        Some(name) => name.to_string(),
        None => project_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "fmus".to_string()),
    };
    create_manifest(project_dir, &name)
}

pub(crate) fn create_manifest(project_dir: &Path, name: &str) -> Result<()> {
    let path = project_dir.join(MANIFEST_FILE);
    if path.exists() {
        bail!("{} already exists", path.display());
    }

    fs::write(&path, FmudistManifest::template(name))
        .with_context(|| format!("writing {}", path.display()))?;

    let gitignore = project_dir.join(".gitignore");
    if !gitignore.exists() {
        fs::write(&gitignore, "build/\ndist-merged/\n").context("writing .gitignore")?;
    }

    println!("Created manifest for '{name}'");
    println!("  {}", path.display());
    Ok(())
}
