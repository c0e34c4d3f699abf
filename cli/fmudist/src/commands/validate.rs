//! `fmudist validate`: compare fresh results with stored references.

use anyhow::Result;
use fmudist_pipeline::{validate_references, CheckOutcome, PipelineConfig, UnitCheck};
use fmudist_toolchain::ProcessRunner;

/// Check every unit with run parameters; returns the exit code.
///
/// Units without a released package for a variant are skipped. A missing
/// reference, a failed run or a deviation beyond `tolerance` fails.
pub fn run(config: &PipelineConfig, runner: &dyn ProcessRunner, tolerance: f64) -> Result<i32> {
    let checks = validate_references(config, runner, &config.variants, tolerance)?;

    println!("=== Validation (tolerance {tolerance}) ===");
    let mut failed = 0;
    for check in &checks {
        println!("  {}", describe(check));
        if fails(check) {
            failed += 1;
        }
    }
    println!();
    println!("{} checked, {failed} failed", checks.len());
    Ok(if failed == 0 { 0 } else { 1 })
}

fn fails(check: &UnitCheck) -> bool {
    !matches!(check.outcome, CheckOutcome::MissingPackage) && !check.passed()
}

fn describe(check: &UnitCheck) -> String {
    let name = format!("{}/{}", check.variant, check.unit);
    match &check.outcome {
        CheckOutcome::Compared(report) if report.passed() => format!("{name}: ok"),
        CheckOutcome::Compared(report) => {
            let signals: Vec<String> = report
                .failures()
                .map(|s| match s.max_deviation {
                    Some(d) => format!("{} ({d:.3})", s.name),
                    None => format!("{} (missing)", s.name),
                })
                .collect();
            format!("{name}: FAILED {}", signals.join(", "))
        }
        CheckOutcome::MissingPackage => format!("{name}: skipped, no released package"),
        CheckOutcome::MissingReference => format!("{name}: FAILED, no stored reference"),
        CheckOutcome::Failed(e) => format!("{name}: FAILED, {e}"),
    }
}
