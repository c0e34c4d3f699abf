//! `fmudist stamp`: stamp provenance into a single metadata file.

use std::path::Path;

use anyhow::{bail, Result};
use fmudist_docs::{stamp_provenance, ProvenanceStamp, StampOutcome};
use fmudist_pipeline::PipelineConfig;
use fmudist_toolchain::ProcessRunner;
use tracing::warn;

/// Stamp `file` from the working tree state of the project sources.
pub fn run(config: &PipelineConfig, runner: &dyn ProcessRunner, file: &Path) -> Result<StampOutcome> {
    if !file.is_file() {
        bail!("{} not found", file.display());
    }
    let (clean, stamp) = match ProvenanceStamp::resolve(&config.git, runner) {
        Ok((state, stamp)) => (state.is_clean(), stamp),
        Err(e) => {
            warn!(target: "fmudist::provenance", error = %e, "cannot query working tree");
            (false, None)
        }
    };

    let outcome = stamp_provenance(file, clean, stamp.as_ref(), &config.tool_name)?;
    match (&outcome, &stamp) {
        (StampOutcome::Stamped, Some(stamp)) => {
            println!("{}: {} at {}", file.display(), stamp.version, stamp.timestamp)
        }
        _ => println!("{}: {}", file.display(), outcome.as_str()),
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use fmudist_toolchain::{RecordingRunner, ToolOutput, ToolchainError};

    const METADATA: &str =
        r#"<fmiModelDescription generationTool="Reference FMUs (development build)"/>"#;

    fn git(status: &'static str) -> RecordingRunner {
        RecordingRunner::new(move |cmd| {
            let out = match cmd.args_lossy().first().map(String::as_str) {
                Some("status") => status,
                Some("tag") => "v0.0.31\n",
                _ => "",
            };
            Ok(ToolOutput::success(out))
        })
    }

    #[test]
    fn clean_tree_stamps_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::new(dir.path());
        let file = dir.path().join("modelDescription.xml");
        fs::write(&file, METADATA).unwrap();

        let outcome = run(&config, &git(""), &file).unwrap();
        assert_eq!(outcome, StampOutcome::Stamped);
        assert!(fs::read_to_string(&file)
            .unwrap()
            .contains("\"Reference FMUs (v0.0.31)\""));
    }

    #[test]
    fn dirty_tree_leaves_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::new(dir.path());
        let file = dir.path().join("modelDescription.xml");
        fs::write(&file, METADATA).unwrap();

        let outcome = run(&config, &git("?? notes.txt\n"), &file).unwrap();
        assert_eq!(outcome, StampOutcome::SkippedDirtyTree);
        assert_eq!(fs::read_to_string(&file).unwrap(), METADATA);
    }

    #[test]
    fn unavailable_git_leaves_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::new(dir.path());
        let file = dir.path().join("modelDescription.xml");
        fs::write(&file, METADATA).unwrap();

        let runner = RecordingRunner::new(|cmd| {
            Err(ToolchainError::Spawn {
                program: cmd.program.clone(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
        });
        assert_eq!(
            run(&config, &runner, &file).unwrap(),
            StampOutcome::SkippedDirtyTree
        );
    }
}
