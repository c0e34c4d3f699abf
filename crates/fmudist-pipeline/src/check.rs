//! Single-unit regeneration and tolerance checks against stored references.

use fmudist_platform::FmiVariant;
use fmudist_reference::{
    regenerate, simulate, validate, RegenerateRequest, Regenerated, ResultTable, ValidationReport,
};
use fmudist_toolchain::ProcessRunner;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};

/// Regenerate the stored reference of `unit` from its released package.
pub fn regenerate_unit(
    config: &PipelineConfig,
    runner: &dyn ProcessRunner,
    unit: &str,
    variant: FmiVariant,
) -> Result<Regenerated> {
    let parameters = config
        .units
        .get(unit)
        .ok_or_else(|| PipelineError::NoRunParameters {
            unit: unit.to_string(),
        })?;
    let package = config.output_package(variant, &format!("{unit}.fmu"));
    if !package.is_file() {
        return Err(PipelineError::MissingPackage { path: package });
    }
    let reference_path = config.reference_path(variant, unit);
    let request = RegenerateRequest {
        unit,
        variant,
        package: &package,
        parameters,
        reference_path: &reference_path,
    };
    Ok(regenerate(runner, &config.simulator, &request)?)
}

/// How checking one unit ended.
#[derive(Debug)]
pub enum CheckOutcome {
    /// Simulated and compared.
    Compared(ValidationReport),
    /// No released package to simulate.
    MissingPackage,
    /// No stored reference to compare with.
    MissingReference,
    /// The simulation failed.
    Failed(String),
}

/// Check result for one unit.
#[derive(Debug)]
pub struct UnitCheck {
    pub variant: FmiVariant,
    pub unit: String,
    pub outcome: CheckOutcome,
}

impl UnitCheck {
    /// Only a completed comparison within tolerance passes.
    pub fn passed(&self) -> bool {
        matches!(&self.outcome, CheckOutcome::Compared(report) if report.passed())
    }
}

/// Simulate every unit with run parameters and compare with its stored
/// reference. Stored references are never written.
pub fn validate_references(
    config: &PipelineConfig,
    runner: &dyn ProcessRunner,
    variants: &[FmiVariant],
    tolerance: f64,
) -> Result<Vec<UnitCheck>> {
    let scratch = tempfile::Builder::new()
        .prefix("fmudist-validate-")
        .tempdir()?;
    let mut checks = Vec::new();

    for &variant in variants {
        for (unit, parameters) in &config.units {
            let package = config.output_package(variant, &format!("{unit}.fmu"));
            let reference_path = config.reference_path(variant, unit);
            let outcome = if !package.is_file() {
                CheckOutcome::MissingPackage
            } else if !reference_path.is_file() {
                CheckOutcome::MissingReference
            } else {
                let request = RegenerateRequest {
                    unit,
                    variant,
                    package: &package,
                    parameters,
                    reference_path: &reference_path,
                };
                match simulate(runner, &config.simulator, &request, scratch.path())
                    .and_then(|(_temp, result, _)| {
                        ResultTable::read(&reference_path).map(|reference| (result, reference))
                    }) {
                    Ok((result, reference)) => {
                        CheckOutcome::Compared(validate(&result, &reference, tolerance))
                    }
                    Err(e) => {
                        warn!(
                            target: "fmudist::pipeline",
                            unit = %unit,
                            variant = %variant,
                            error = %e,
                            "validation run failed"
                        );
                        CheckOutcome::Failed(e.to_string())
                    }
                }
            };
            if let CheckOutcome::Compared(report) = &outcome {
                info!(
                    target: "fmudist::pipeline",
                    unit = %unit,
                    variant = %variant,
                    passed = report.passed(),
                    "validated"
                );
            }
            checks.push(UnitCheck {
                variant,
                unit: unit.clone(),
                outcome,
            });
        }
    }
    Ok(checks)
}
