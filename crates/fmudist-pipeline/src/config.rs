//! Explicit configuration for a pipeline run.
//!
//! Every path, the platform order, the unit registry and the tool settings
//! live here. The CLI builds one of these from `fmudist.toml`; nothing in
//! the pipeline looks anything up on its own.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use fmudist_docs::Template;
use fmudist_merge::MergeOptions;
use fmudist_platform::{validate_platform_set, FmiVariant, Platform, PlatformSet};
use fmudist_reference::{RunParameters, SimulatorConfig};
use fmudist_toolchain::{BuildConfig, Git};

use crate::error::{PipelineError, Result};

/// Default `generationTool` prefix carrying the development placeholder.
pub const DEFAULT_TOOL_NAME: &str = "Reference FMUs";

/// Everything a build or release run needs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory holding `<Unit>/readme.md` and the extra release files.
    pub source_dir: PathBuf,
    /// `<dist-root>/dist-<platform>/<variant-dir>/<Unit>.fmu`
    pub dist_root: PathBuf,
    /// Merged packages go to `<output-dir>/<variant-dir>/<Unit>.fmu`.
    pub output_dir: PathBuf,
    /// Stored references at `<reference-dir>/<variant-dir>/<Unit>_ref.csv`.
    pub reference_dir: PathBuf,
    /// Declared platform order.
    pub platforms: PlatformSet,
    /// Variants to build and release, in order.
    pub variants: Vec<FmiVariant>,
    pub build: BuildConfig,
    pub simulator: SimulatorConfig,
    pub merge: MergeOptions,
    /// Reject a variant's merge unless every platform recorded its build.
    pub require_build_ledger: bool,
    /// Units with a reference scenario.
    pub units: BTreeMap<String, RunParameters>,
    /// Prefix of the `generationTool` placeholder.
    pub tool_name: String,
    /// Files copied from `source_dir` into the output directory.
    pub extra_files: Vec<PathBuf>,
    pub template: Template,
    /// Repository queried for provenance.
    pub git: Git,
}

impl PipelineConfig {
    /// Configuration rooted at `project_dir` with the default layout.
    pub fn new(project_dir: &Path) -> Self {
        let build_root = project_dir.join("build");
        let dist_root = build_root.join("fmus");
        Self {
            source_dir: project_dir.to_path_buf(),
            build: BuildConfig::new(project_dir, &build_root),
            simulator: SimulatorConfig::new(&default_simulator(&dist_root)),
            dist_root,
            output_dir: project_dir.join("dist-merged"),
            reference_dir: project_dir.join("references"),
            platforms: PlatformSet::builtin(),
            variants: FmiVariant::ALL.to_vec(),
            merge: MergeOptions::default(),
            require_build_ledger: true,
            units: BTreeMap::new(),
            tool_name: DEFAULT_TOOL_NAME.to_string(),
            extra_files: vec![PathBuf::from("LICENSE.txt"), PathBuf::from("README.md")],
            template: Template::builtin(),
            git: Git::new(project_dir),
        }
    }

    /// Where the merged package `name` of `variant` is emitted.
    pub fn output_package(&self, variant: FmiVariant, name: &str) -> PathBuf {
        self.output_dir.join(variant.dist_subdir()).join(name)
    }

    /// Stored reference of `unit` for `variant`.
    pub fn reference_path(&self, variant: FmiVariant, unit: &str) -> PathBuf {
        self.reference_dir
            .join(variant.dist_subdir())
            .join(format!("{unit}_ref.csv"))
    }

    /// Authored documentation directory of `unit`.
    pub fn unit_source_dir(&self, unit: &str) -> PathBuf {
        self.source_dir.join(unit)
    }

    /// Reject configurations no run could succeed with.
    ///
    /// Platform-list warnings are not errors.
    pub fn check(&self) -> Result<()> {
        if let Err(issues) = validate_platform_set(&self.platforms) {
            let errors: Vec<String> = issues
                .into_iter()
                .filter(|i| i.severity == "error")
                .map(|i| i.message)
                .collect();
            if !errors.is_empty() {
                return Err(PipelineError::InvalidConfig {
                    detail: errors.join("; "),
                });
            }
        }
        if self.variants.is_empty() {
            return Err(PipelineError::InvalidConfig {
                detail: "no FMI variants configured".into(),
            });
        }
        if self.tool_name.trim().is_empty() {
            return Err(PipelineError::InvalidConfig {
                detail: "provenance tool-name is empty".into(),
            });
        }
        for (unit, params) in &self.units {
            params.check(unit)?;
        }
        Ok(())
    }
}

/// The simulator built for the host platform, as staged by the build driver.
///
/// Falls back to the `x86_64-linux` location on hosts no build targets.
pub fn default_simulator(dist_root: &Path) -> PathBuf {
    let host = Platform::host().unwrap_or(Platform::X86_64_LINUX);
    dist_root
        .join(host.dist_dir_name())
        .join(host.tools_dir_name())
        .join(format!("fmusim{}", host.executable_suffix()))
}
