//! Simulator (`fmusim`) invocation builder.
//!
//! ```text
//! fmusim --interface-type <me|cs> [--solver <euler|cvode>]
//!        [--start-time t] [--stop-time t] [--output-interval dt]
//!        [--start-value name value]... --output-file <csv> <package>
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use fmudist_platform::InterfaceType;
use serde::{Deserialize, Serialize};

use crate::command::ToolCommand;

/// Integration method for model-exchange simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Solver {
    Euler,
    Cvode,
}

impl fmt::Display for Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Solver::Euler => "euler",
            Solver::Cvode => "cvode",
        })
    }
}

impl FromStr for Solver {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "euler" => Ok(Solver::Euler),
            "cvode" => Ok(Solver::Cvode),
            other => Err(format!("unknown solver '{other}' (expected euler or cvode)")),
        }
    }
}

/// One simulator run against a package.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorInvocation {
    /// Path to the simulator executable.
    pub executable: PathBuf,
    /// Interface mode to simulate in.
    pub interface: InterfaceType,
    /// Solver; only passed for model exchange.
    pub solver: Option<Solver>,
    pub start_time: Option<f64>,
    pub stop_time: Option<f64>,
    pub output_interval: Option<f64>,
    /// Start values as (variable, value) pairs, in order.
    pub start_values: Vec<(String, String)>,
    /// Where the simulator writes its result table.
    pub output_file: PathBuf,
    /// Package to simulate.
    pub package: PathBuf,
}

impl SimulatorInvocation {
    /// A model-exchange run with no optional parameters.
    pub fn new(executable: &Path, package: &Path, output_file: &Path) -> Self {
        Self {
            executable: executable.to_path_buf(),
            interface: InterfaceType::ModelExchange,
            solver: None,
            start_time: None,
            stop_time: None,
            output_interval: None,
            start_values: Vec::new(),
            output_file: output_file.to_path_buf(),
            package: package.to_path_buf(),
        }
    }

    /// The simulation-control arguments, without output file and package.
    ///
    /// This is the part of the command line recorded in generated
    /// documentation.
    pub fn parameter_args(&self) -> Vec<String> {
        let mut args = vec!["--interface-type".to_string(), self.interface.to_string()];
        if self.interface == InterfaceType::ModelExchange {
            if let Some(solver) = self.solver {
                args.push("--solver".into());
                args.push(solver.to_string());
            }
        }
        if let Some(t) = self.start_time {
            args.push("--start-time".into());
            args.push(t.to_string());
        }
        if let Some(t) = self.stop_time {
            args.push("--stop-time".into());
            args.push(t.to_string());
        }
        if let Some(dt) = self.output_interval {
            args.push("--output-interval".into());
            args.push(dt.to_string());
        }
        for (name, value) in &self.start_values {
            args.push("--start-value".into());
            args.push(name.clone());
            args.push(value.clone());
        }
        args
    }

    /// Build the full command.
    pub fn to_command(&self) -> ToolCommand {
        ToolCommand::new(&self.executable)
            .args(self.parameter_args())
            .arg("--output-file")
            .arg(&self.output_file)
            .arg(&self.package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_exchange_command() {
        let mut inv = SimulatorInvocation::new(
            Path::new("fmusim"),
            Path::new("BouncingBall.fmu"),
            Path::new("out.csv"),
        );
        inv.solver = Some(Solver::Cvode);
        inv.output_interval = Some(0.05);
        inv.stop_time = Some(3.0);
        assert_eq!(
            inv.to_command().args_lossy(),
            [
                "--interface-type",
                "me",
                "--solver",
                "cvode",
                "--stop-time",
                "3",
                "--output-interval",
                "0.05",
                "--output-file",
                "out.csv",
                "BouncingBall.fmu",
            ]
        );
    }

    #[test]
    fn co_simulation_omits_solver() {
        let mut inv = SimulatorInvocation::new(
            Path::new("fmusim"),
            Path::new("Stair.fmu"),
            Path::new("out.csv"),
        );
        inv.interface = InterfaceType::CoSimulation;
        inv.solver = Some(Solver::Cvode);
        inv.start_values = vec![("Float64_fixed_parameter".into(), "1".into())];
        assert_eq!(
            inv.parameter_args(),
            [
                "--interface-type",
                "cs",
                "--start-value",
                "Float64_fixed_parameter",
                "1"
            ]
        );
    }

    #[test]
    fn solver_parse() {
        assert_eq!("cvode".parse::<Solver>().unwrap(), Solver::Cvode);
        assert!("rk4".parse::<Solver>().is_err());
    }
}
