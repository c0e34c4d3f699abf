//! Regeneration of stored reference results.

use std::fs;
use std::path::{Path, PathBuf};

use fmudist_platform::FmiVariant;
use fmudist_toolchain::ProcessRunner;
use tracing::{info, warn};

use crate::error::{ReferenceError, Result};
use crate::plot::render_svg;
use crate::result::ResultTable;
use crate::run_parameters::{RunParameters, SimulatorConfig};

/// File name of the result table inside a package's documentation.
pub const DOC_RESULT_FILE: &str = "result.csv";
/// File name of the plot inside a package's documentation.
pub const DOC_PLOT_FILE: &str = "result.svg";

/// What to regenerate.
#[derive(Debug, Clone, Copy)]
pub struct RegenerateRequest<'a> {
    pub unit: &'a str,
    pub variant: FmiVariant,
    /// The merged package to simulate.
    pub package: &'a Path,
    pub parameters: &'a RunParameters,
    /// The unit's canonical reference location.
    pub reference_path: &'a Path,
}

/// A freshly regenerated reference.
#[derive(Debug, Clone)]
pub struct Regenerated {
    pub result: ResultTable,
    /// Where the reference was persisted.
    pub reference_path: PathBuf,
    /// Rendered plot.
    pub plot_svg: String,
    /// Simulation-control arguments the simulator was run with.
    pub simulator_args: Vec<String>,
}

impl Regenerated {
    /// Copy the result and plot into a package documentation directory.
    pub fn write_documentation(&self, docs_dir: &Path) -> Result<()> {
        fs::create_dir_all(docs_dir)?;
        fs::copy(&self.reference_path, docs_dir.join(DOC_RESULT_FILE))?;
        fs::write(docs_dir.join(DOC_PLOT_FILE), &self.plot_svg)?;
        Ok(())
    }
}

/// Run the simulator once and capture its table into a temporary file in
/// `scratch_dir`.
///
/// The returned path is deleted when dropped unless persisted.
pub fn simulate(
    runner: &dyn ProcessRunner,
    simulator: &SimulatorConfig,
    request: &RegenerateRequest<'_>,
    scratch_dir: &Path,
) -> Result<(tempfile::TempPath, ResultTable, Vec<String>)> {
    if !simulator.executable.is_file() {
        return Err(ReferenceError::SimulatorNotFound {
            path: simulator.executable.clone(),
        });
    }
    fs::create_dir_all(scratch_dir)?;
    let temp = tempfile::Builder::new()
        .prefix(&format!(".{}-", request.unit))
        .suffix(".csv")
        .tempfile_in(scratch_dir)?
        .into_temp_path();

    let invocation = request.parameters.invocation(
        request.unit,
        request.variant,
        simulator,
        request.package,
        &temp,
    )?;
    let output = runner.run(&invocation.to_command())?;
    if !output.is_success() {
        return Err(ReferenceError::SimulatorFailed {
            unit: request.unit.to_string(),
            code: output.code,
            stderr: output.stderr.trim().to_string(),
        });
    }

    let table = ResultTable::read(&temp)?;
    Ok((temp, table, invocation.parameter_args()))
}

/// Simulate the merged package and replace the stored reference.
///
/// The result is captured next to the reference and moved over it only
/// after the simulator exited 0 and its table parsed. On any failure the
/// previous reference is untouched.
pub fn regenerate(
    runner: &dyn ProcessRunner,
    simulator: &SimulatorConfig,
    request: &RegenerateRequest<'_>,
) -> Result<Regenerated> {
    let reference_dir = request
        .reference_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let (temp, result, simulator_args) = match simulate(runner, simulator, request, reference_dir) {
        Ok(captured) => captured,
        Err(e) => {
            warn!(
                target: "fmudist::reference",
                unit = request.unit,
                variant = %request.variant,
                error = %e,
                "regeneration failed, keeping stored reference"
            );
            return Err(e);
        }
    };

    temp.persist(request.reference_path)
        .map_err(|e| ReferenceError::Io(e.error))?;

    info!(
        target: "fmudist::reference",
        unit = request.unit,
        variant = %request.variant,
        samples = result.len(),
        path = %request.reference_path.display(),
        "reference regenerated"
    );

    let plot_svg = render_svg(&result, request.unit);
    Ok(Regenerated {
        result,
        reference_path: request.reference_path.to_path_buf(),
        plot_svg,
        simulator_args,
    })
}
