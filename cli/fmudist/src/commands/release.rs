//! `fmudist release`: merge, regenerate, document, stamp and emit.

use anyhow::Result;
use fmudist_pipeline::{release, PipelineConfig};
use fmudist_toolchain::ProcessRunner;

/// Run the release and print its report; returns the exit code.
pub fn run(config: &PipelineConfig, runner: &dyn ProcessRunner) -> Result<i32> {
    let report = release(config, runner)?;
    print!("{report}");
    if report.is_success() {
        println!();
        println!("Release written to {}", config.output_dir.display());
    }
    Ok(report.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fmudist_platform::FmiVariant;
    use fmudist_toolchain::RecordingRunner;

    #[test]
    fn unbuilt_variant_fails_release() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PipelineConfig::new(dir.path());
        config.variants = vec![FmiVariant::Fmi3];
        let runner = RecordingRunner::succeeding();

        assert_eq!(run(&config, &runner).unwrap(), 1);
        assert!(!config.output_package(FmiVariant::Fmi3, "Stair.fmu").exists());
    }

    #[test]
    fn invalid_configuration_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PipelineConfig::new(dir.path());
        config.variants.clear();
        let runner = RecordingRunner::succeeding();

        assert!(run(&config, &runner).is_err());
        assert!(runner.calls().is_empty());
    }
}
