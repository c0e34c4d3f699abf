//! Declared simulation controls of a unit.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use fmudist_platform::{FmiVariant, InterfaceType};
use fmudist_toolchain::{SimulatorInvocation, Solver};
use serde::{Deserialize, Serialize};

use crate::error::{ReferenceError, Result};

/// Named simulation controls used to regenerate a unit's reference result.
///
/// Read from a `[units.<Name>]` manifest table:
///
/// ```toml
/// [units.BouncingBall]
/// output-interval = 0.05
/// stop-time = 3
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RunParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_interval: Option<f64>,
    /// Overrides the variant's default interface mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface_type: Option<InterfaceType>,
    /// Overrides the configured solver (model exchange only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solver: Option<Solver>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub start_values: BTreeMap<String, String>,
}

impl RunParameters {
    /// Interface mode to simulate `variant` packages in.
    pub fn interface_for(&self, unit: &str, variant: FmiVariant) -> Result<InterfaceType> {
        let interface = self
            .interface_type
            .unwrap_or_else(|| variant.default_interface());
        if !variant.supports_interface(interface) {
            return Err(ReferenceError::InvalidParameters {
                unit: unit.to_string(),
                detail: format!("FMI {variant} packages cannot be simulated as '{interface}'"),
            });
        }
        Ok(interface)
    }

    /// Check the numeric controls for consistency.
    pub fn check(&self, unit: &str) -> Result<()> {
        let invalid = |detail: String| ReferenceError::InvalidParameters {
            unit: unit.to_string(),
            detail,
        };
        if let Some(dt) = self.output_interval {
            if dt <= 0.0 || dt.is_nan() {
                return Err(invalid(format!("output-interval must be positive, got {dt}")));
            }
        }
        if let (Some(start), Some(stop)) = (self.start_time, self.stop_time) {
            if stop < start {
                return Err(invalid(format!(
                    "stop-time {stop} is before start-time {start}"
                )));
            }
        }
        Ok(())
    }

    /// The simulator run for `package`, writing its table to `output_file`.
    pub fn invocation(
        &self,
        unit: &str,
        variant: FmiVariant,
        simulator: &SimulatorConfig,
        package: &Path,
        output_file: &Path,
    ) -> Result<SimulatorInvocation> {
        self.check(unit)?;
        let mut inv = SimulatorInvocation::new(&simulator.executable, package, output_file);
        inv.interface = self.interface_for(unit, variant)?;
        if inv.interface == InterfaceType::ModelExchange {
            inv.solver = Some(self.solver.unwrap_or(simulator.solver));
        }
        inv.start_time = self.start_time;
        inv.stop_time = self.stop_time;
        inv.output_interval = self.output_interval;
        inv.start_values = self
            .start_values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(inv)
    }
}

/// Where the simulator lives and how it integrates model-exchange runs.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    pub executable: PathBuf,
    pub solver: Solver,
}

impl SimulatorConfig {
    pub fn new(executable: &Path) -> Self {
        Self {
            executable: executable.to_path_buf(),
            solver: Solver::Cvode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simulator() -> SimulatorConfig {
        SimulatorConfig::new(Path::new("fmusim"))
    }

    #[test]
    fn parse_manifest_table() {
        let params: RunParameters = toml::from_str(
            r#"
            output-interval = 0.05
            stop-time = 3
            start-values = { h = "2" }
            "#,
        )
        .unwrap();
        assert_eq!(params.output_interval, Some(0.05));
        assert_eq!(params.stop_time, Some(3.0));
        assert_eq!(params.start_values["h"], "2");
    }

    #[test]
    fn unknown_key_rejected() {
        assert!(toml::from_str::<RunParameters>("intervall = 1").is_err());
    }

    #[test]
    fn model_exchange_gets_configured_solver() {
        let params = RunParameters {
            output_interval: Some(0.2),
            ..Default::default()
        };
        let inv = params
            .invocation("VanDerPol", FmiVariant::Fmi3, &simulator(), Path::new("V.fmu"), Path::new("o.csv"))
            .unwrap();
        assert_eq!(
            inv.parameter_args(),
            ["--interface-type", "me", "--solver", "cvode", "--output-interval", "0.2"]
        );
    }

    #[test]
    fn fmi1_cs_defaults_to_co_simulation() {
        let inv = RunParameters::default()
            .invocation("Stair", FmiVariant::Fmi1Cs, &simulator(), Path::new("S.fmu"), Path::new("o.csv"))
            .unwrap();
        assert_eq!(inv.interface, InterfaceType::CoSimulation);
        assert_eq!(inv.solver, None);
    }

    #[test]
    fn interface_override_must_match_variant() {
        let params = RunParameters {
            interface_type: Some(InterfaceType::CoSimulation),
            ..Default::default()
        };
        assert!(params.interface_for("A", FmiVariant::Fmi3).is_ok());
        assert!(matches!(
            params.interface_for("A", FmiVariant::Fmi1Me),
            Err(ReferenceError::InvalidParameters { .. })
        ));
    }

    #[test]
    fn non_positive_interval_rejected() {
        let params = RunParameters {
            output_interval: Some(0.0),
            ..Default::default()
        };
        assert!(params.check("A").is_err());
    }
}
