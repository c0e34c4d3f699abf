//! `fmudist clean`: remove release output.

use std::fs;
use std::path::Path;

use anyhow::Result;
use fmudist_pipeline::PipelineConfig;

/// Remove the merged output; with `builds`, also the build root and staged packages.
pub fn run(config: &PipelineConfig, builds: bool) -> Result<()> {
    remove(&config.output_dir)?;
    if builds {
        remove(&config.build.build_root)?;
        if !config.dist_root.starts_with(&config.build.build_root) {
            remove(&config.dist_root)?;
        }
    }
    Ok(())
}

fn remove(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
        println!("Removed {}", dir.display());
    } else {
        println!("Already clean: {} does not exist", dir.display());
    }
    Ok(())
}
