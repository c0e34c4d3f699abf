//! `fmudist regenerate`: refresh one stored reference.

use anyhow::{Context, Result};
use fmudist_pipeline::{regenerate_unit, PipelineConfig};
use fmudist_platform::FmiVariant;
use fmudist_toolchain::ProcessRunner;

/// Simulate the released package of `unit` and replace its stored reference.
pub fn run(
    config: &PipelineConfig,
    runner: &dyn ProcessRunner,
    unit: &str,
    variant: &str,
) -> Result<()> {
    let variant: FmiVariant = variant
        .parse()
        .with_context(|| format!("parsing --variant {variant}"))?;
    let regenerated = regenerate_unit(config, runner, unit, variant)
        .with_context(|| format!("regenerating {variant}/{unit}"))?;

    println!(
        "Regenerated {variant}/{unit}: {} samples",
        regenerated.result.len()
    );
    println!("  {}", regenerated.reference_path.display());
    println!("  fmusim {}", regenerated.simulator_args.join(" "));
    Ok(())
}
