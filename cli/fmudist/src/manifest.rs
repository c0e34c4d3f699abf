//! `fmudist.toml` manifest parsing and conversion into pipeline configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fmudist_docs::Template;
use fmudist_pipeline::{default_simulator, PipelineConfig, DEFAULT_TOOL_NAME};
use fmudist_platform::{parse_platform_list, FmiVariant, PlatformSet};
use fmudist_reference::RunParameters;
use fmudist_toolchain::{BuildConfig, Git, Solver};
use serde::{Deserialize, Serialize};

/// Manifest file name.
pub const MANIFEST_FILE: &str = "fmudist.toml";

/// The top-level manifest structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FmudistManifest {
    /// Project metadata (required).
    pub project: ProjectConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub platforms: Option<PlatformsConfig>,
    #[serde(default)]
    pub build: BuildSection,
    #[serde(default)]
    pub simulator: SimulatorSection,
    #[serde(default)]
    pub merge: MergeSection,
    #[serde(default)]
    pub provenance: ProvenanceSection,
    #[serde(default)]
    pub release: ReleaseSection,
    /// Run parameters per unit with a reference scenario.
    #[serde(default)]
    pub units: BTreeMap<String, RunParameters>,
}

/// Project metadata section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectConfig {
    pub name: String,
    /// Directory holding `<Unit>/readme.md`, the CMake project and extra files.
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,
}

fn default_source_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Directory layout, relative to the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PathsConfig {
    pub build_root: PathBuf,
    pub dist_root: PathBuf,
    pub output_dir: PathBuf,
    pub reference_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            build_root: PathBuf::from("build"),
            dist_root: PathBuf::from("build/fmus"),
            output_dir: PathBuf::from("dist-merged"),
            reference_dir: PathBuf::from("references"),
        }
    }
}

/// Declared platform order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformsConfig {
    pub order: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BuildSection {
    pub cmake: Option<PathBuf>,
    pub generator: Option<String>,
    /// Holds `aarch64-linux-toolchain.cmake`; the build root otherwise.
    pub toolchain_dir: Option<PathBuf>,
    pub variants: Option<Vec<FmiVariant>>,
    /// Build without the simulator when `false`.
    pub with_simulator: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SimulatorSection {
    /// Defaults to the host platform's staged simulator.
    pub executable: Option<PathBuf>,
    pub solver: Option<Solver>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct MergeSection {
    pub allow_divergent_shared: bool,
    pub require_build_ledger: bool,
    /// Where scratch workspaces are created; the system temp dir otherwise.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for MergeSection {
    fn default() -> Self {
        Self {
            allow_divergent_shared: false,
            require_build_ledger: true,
            scratch_dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ProvenanceSection {
    pub tool_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ReleaseSection {
    pub extra_files: Option<Vec<PathBuf>>,
    /// HTML template for `documentation/index.html`.
    pub template: Option<PathBuf>,
}

impl FmudistManifest {
    /// Search upward from `start_dir` for an `fmudist.toml` file, parse and
    /// return it along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(MANIFEST_FILE);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let manifest: FmudistManifest = toml::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Parse a manifest from a TOML string.
    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing fmudist.toml")
    }

    /// The declared platform order, or the built-in one.
    pub fn platform_set(&self) -> Result<PlatformSet> {
        match &self.platforms {
            Some(p) => parse_platform_list(p.order.as_slice()).context("parsing [platforms] order"),
            None => Ok(PlatformSet::builtin()),
        }
    }

    /// Resolve the manifest against `project_dir` into explicit pipeline
    /// configuration.
    pub fn to_pipeline_config(&self, project_dir: &Path) -> Result<PipelineConfig> {
        let resolve = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                project_dir.join(p)
            }
        };
        let source_dir = resolve(&self.project.source_dir);
        let build_root = resolve(&self.paths.build_root);
        let dist_root = resolve(&self.paths.dist_root);

        let mut config = PipelineConfig::new(project_dir);
        config.platforms = self.platform_set()?;
        if let Some(ref variants) = self.build.variants {
            config.variants = variants.clone();
        }

        let mut build = BuildConfig::new(&source_dir, &build_root);
        if let Some(ref cmake) = self.build.cmake {
            build.cmake = cmake.clone();
        }
        build.generator = self.build.generator.clone();
        if let Some(ref dir) = self.build.toolchain_dir {
            build.toolchain_dir = resolve(dir);
        }
        if let Some(with_simulator) = self.build.with_simulator {
            build.with_simulator = with_simulator;
        }
        config.build = build;

        config.simulator.executable = match self.simulator.executable {
            Some(ref exe) => resolve(exe),
            None => default_simulator(&dist_root),
        };
        if let Some(solver) = self.simulator.solver {
            config.simulator.solver = solver;
        }

        config.merge.allow_divergent_shared = self.merge.allow_divergent_shared;
        config.merge.scratch_root = self.merge.scratch_dir.as_deref().map(resolve);
        config.require_build_ledger = self.merge.require_build_ledger;

        config.tool_name = self
            .provenance
            .tool_name
            .clone()
            .unwrap_or_else(|| DEFAULT_TOOL_NAME.to_string());
        if let Some(ref files) = self.release.extra_files {
            config.extra_files = files.clone();
        }
        if let Some(ref template) = self.release.template {
            let path = resolve(template);
            config.template = Template::load(&path)
                .with_context(|| format!("loading template {}", path.display()))?;
        }

        config.units = self.units.clone();
        config.git = Git::new(&source_dir);
        config.source_dir = source_dir;
        config.dist_root = dist_root;
        config.output_dir = resolve(&self.paths.output_dir);
        config.reference_dir = resolve(&self.paths.reference_dir);
        Ok(config)
    }

    /// Generate the default manifest for `fmudist init`.
    pub fn template(name: &str) -> String {
        format!(
            r#"[project]
name = "{name}"
source-dir = "."

[paths]
build-root = "build"
dist-root = "build/fmus"
output-dir = "dist-merged"
reference-dir = "references"

[platforms]
order = ["x86-windows", "x86_64-windows", "x86_64-linux", "aarch64-linux", "x86_64-darwin", "aarch64-darwin"]

[build]
variants = ["1.0/me", "1.0/cs", "2.0", "3.0"]

[simulator]
solver = "cvode"

[merge]
allow-divergent-shared = false
require-build-ledger = true

[provenance]
tool-name = "{DEFAULT_TOOL_NAME}"

[release]
extra-files = ["LICENSE.txt", "README.md"]

[units.BouncingBall]
output-interval = 0.05
stop-time = 3

[units.Dahlquist]
output-interval = 0.2
stop-time = 10

[units.Feedthrough]
output-interval = 1
stop-time = 2

[units.LinearTransform]
output-interval = 1
stop-time = 2

[units.Resource]
output-interval = 1
stop-time = 2

[units.Stair]
output-interval = 10
stop-time = 10

[units.VanDerPol]
output-interval = 0.2
stop-time = 20
"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fmudist_platform::Platform;

    #[test]
    fn parse_full_manifest() {
        let toml_str = r#"
[project]
name = "Reference-FMUs"
source-dir = "src"

[paths]
dist-root = "fmus"

[platforms]
order = ["x86_64-linux", "x86_64-darwin"]

[build]
generator = "Ninja"
variants = ["3.0"]

[simulator]
executable = "/opt/fmusim"
solver = "euler"

[merge]
allow-divergent-shared = true

[provenance]
tool-name = "Acme FMUs"

[release]
extra-files = ["COPYING"]

[units.Stair]
output-interval = 1
interface-type = "cs"
"#;
        let manifest = FmudistManifest::from_str(toml_str).unwrap();
        assert_eq!(manifest.project.name, "Reference-FMUs");
        assert!(manifest.merge.require_build_ledger);

        let config = manifest.to_pipeline_config(Path::new("/proj")).unwrap();
        assert_eq!(config.source_dir, Path::new("/proj/src"));
        assert_eq!(config.dist_root, Path::new("/proj/fmus"));
        assert_eq!(config.output_dir, Path::new("/proj/dist-merged"));
        assert_eq!(
            config.platforms.as_slice(),
            [Platform::X86_64_LINUX, Platform::X86_64_DARWIN]
        );
        assert_eq!(config.variants, [FmiVariant::Fmi3]);
        assert_eq!(config.build.generator.as_deref(), Some("Ninja"));
        assert_eq!(config.build.source_dir, Path::new("/proj/src"));
        assert_eq!(config.simulator.executable, Path::new("/opt/fmusim"));
        assert_eq!(config.simulator.solver, Solver::Euler);
        assert!(config.merge.allow_divergent_shared);
        assert_eq!(config.tool_name, "Acme FMUs");
        assert_eq!(config.extra_files, [PathBuf::from("COPYING")]);
        assert_eq!(config.units["Stair"].output_interval, Some(1.0));
    }

    #[test]
    fn parse_minimal_manifest() {
        let manifest = FmudistManifest::from_str("[project]\nname = \"minimal\"\n").unwrap();
        let config = manifest.to_pipeline_config(Path::new("/proj")).unwrap();
        assert_eq!(config.platforms, PlatformSet::builtin());
        assert_eq!(config.variants.len(), 4);
        assert_eq!(config.dist_root, Path::new("/proj/build/fmus"));
        assert!(config.units.is_empty());
        assert_eq!(config.tool_name, DEFAULT_TOOL_NAME);
    }

    #[test]
    fn reject_unknown_platform() {
        let manifest = FmudistManifest::from_str(
            "[project]\nname = \"x\"\n[platforms]\norder = [\"x86-linux\"]\n",
        )
        .unwrap();
        assert!(manifest.to_pipeline_config(Path::new("/proj")).is_err());
    }

    #[test]
    fn reject_unknown_run_parameter() {
        let bad = "[project]\nname = \"x\"\n[units.Stair]\ninterval = 1\n";
        assert!(FmudistManifest::from_str(bad).is_err());
    }

    #[test]
    fn template_is_valid_manifest() {
        let manifest = FmudistManifest::from_str(&FmudistManifest::template("demo")).unwrap();
        assert_eq!(manifest.project.name, "demo");
        assert_eq!(manifest.units.len(), 7);
        assert_eq!(manifest.units["BouncingBall"].output_interval, Some(0.05));
        assert_eq!(manifest.units["VanDerPol"].stop_time, Some(20.0));
        let config = manifest.to_pipeline_config(Path::new("/proj")).unwrap();
        assert!(config.check().is_ok());
    }

    #[test]
    fn find_and_load_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "[project]\nname = \"parent\"\n").unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let (manifest, found_dir) = FmudistManifest::find_and_load(&nested).unwrap().unwrap();
        assert_eq!(manifest.project.name, "parent");
        assert_eq!(found_dir, dir.path());
    }
}
