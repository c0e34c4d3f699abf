//! The release driver: barrier, merge, regenerate, document, stamp, emit.

use std::fs;
use std::path::Path;

use fmudist_docs::{render_docs, stamp_provenance, DocsInput, ProvenanceStamp};
use fmudist_merge::{merge_variant, MergeOutcome, MergedPackage};
use fmudist_package::layout::DOCUMENTATION_DIR;
use fmudist_package::{ModelDescription, MODEL_DESCRIPTION};
use fmudist_reference::regenerate::DOC_PLOT_FILE;
use fmudist_reference::{regenerate, RegenerateRequest, Regenerated};
use fmudist_toolchain::ProcessRunner;
use tracing::{error, info, warn};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::ledger::check_barrier;
use crate::report::{
    BarrierRejection, PackageFailure, RegenerationFailure, ReleaseReport, ReleasedPackage,
};

/// Release every configured variant.
///
/// Per-package problems are logged and recorded in the report; only
/// configuration, ledger and I/O errors outside a single package abort
/// the run.
pub fn release(config: &PipelineConfig, runner: &dyn ProcessRunner) -> Result<ReleaseReport> {
    config.check()?;
    let mut report = ReleaseReport::default();

    match ProvenanceStamp::resolve(&config.git, runner) {
        Ok((state, stamp)) => {
            if !state.is_clean() {
                warn!(
                    target: "fmudist::pipeline",
                    "working tree has local changes, packages keep the development placeholder"
                );
            }
            report.tree_clean = Some(state.is_clean());
            report.stamp = stamp;
        }
        Err(e) => {
            warn!(
                target: "fmudist::pipeline",
                error = %e,
                "cannot query working tree, packages keep the development placeholder"
            );
        }
    }
    let stamper = Stamper {
        tree_is_clean: report.tree_clean == Some(true),
        stamp: report.stamp.clone(),
    };

    for &variant in &config.variants {
        if config.require_build_ledger {
            match check_barrier(&config.dist_root, variant, &config.platforms) {
                Ok(()) => {}
                Err(PipelineError::BarrierNotSatisfied { variant, missing }) => {
                    error!(
                        target: "fmudist::pipeline",
                        variant = %variant,
                        missing = missing.len(),
                        "build barrier not satisfied, variant not merged"
                    );
                    report.rejected.push(BarrierRejection { variant, missing });
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        let outcomes = merge_variant(
            &config.dist_root,
            variant,
            config.platforms.as_slice(),
            &config.merge,
        )?;
        for outcome in outcomes {
            match outcome {
                MergeOutcome::Merged(merged) => {
                    let out = config.output_package(variant, &merged.name);
                    match emit(config, runner, &stamper, &merged, &out) {
                        Ok((released, regeneration)) => {
                            report.released.push(released);
                            report.regeneration_failures.extend(regeneration);
                        }
                        Err(e) => {
                            error!(
                                target: "fmudist::pipeline",
                                package = %merged.name,
                                variant = %variant,
                                error = %e,
                                "package not emitted"
                            );
                            if out.exists() {
                                let _ = fs::remove_file(&out);
                            }
                            report.failed.push(PackageFailure {
                                variant,
                                name: merged.name.clone(),
                                error: e.to_string(),
                            });
                        }
                    }
                }
                MergeOutcome::Skipped { name } => report.skipped.push((variant, name)),
                MergeOutcome::Failed { name, error } => report.failed.push(PackageFailure {
                    variant,
                    name,
                    error: error.to_string(),
                }),
            }
        }
    }

    copy_tools(config, &mut report)?;
    copy_extra_files(config, &mut report)?;

    info!(
        target: "fmudist::pipeline",
        released = report.released.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        rejected = report.rejected.len(),
        "release finished"
    );
    Ok(report)
}

/// Provenance resolved once for the whole run.
struct Stamper {
    tree_is_clean: bool,
    stamp: Option<ProvenanceStamp>,
}

/// Emit one merged package.
///
/// The merged tree is serialized first so the simulator runs against the
/// package as released, then documentation and the stamp are added and
/// the package is serialized again.
fn emit(
    config: &PipelineConfig,
    runner: &dyn ProcessRunner,
    stamper: &Stamper,
    merged: &MergedPackage,
    out: &Path,
) -> Result<(ReleasedPackage, Option<RegenerationFailure>)> {
    merged.serialize(out)?;

    let docs_dir = merged.workspace.join(DOCUMENTATION_DIR);
    let mut regeneration_failure = None;
    let regenerated: Option<Regenerated> = match config.units.get(&merged.unit) {
        Some(parameters) => {
            let reference_path = config.reference_path(merged.variant, &merged.unit);
            let request = RegenerateRequest {
                unit: &merged.unit,
                variant: merged.variant,
                package: out,
                parameters,
                reference_path: &reference_path,
            };
            match regenerate(runner, &config.simulator, &request) {
                Ok(r) => {
                    r.write_documentation(&docs_dir)?;
                    Some(r)
                }
                Err(e) => {
                    regeneration_failure = Some(RegenerationFailure {
                        variant: merged.variant,
                        unit: merged.unit.clone(),
                        error: e.to_string(),
                    });
                    None
                }
            }
        }
        None => None,
    };

    let metadata_path = merged.workspace.join(MODEL_DESCRIPTION);
    let model_description = ModelDescription::parse(&fs::read_to_string(&metadata_path)?)?;
    let source_dir = config.unit_source_dir(&merged.unit);
    let input = DocsInput {
        unit: &merged.unit,
        source_dir: &source_dir,
        model_description: &model_description,
        simulator_args: regenerated.as_ref().map(|r| r.simulator_args.as_slice()),
        plot: regenerated.as_ref().map(|_| DOC_PLOT_FILE),
        template: &config.template,
    };
    let documented = render_docs(&input, &docs_dir)?.is_some();

    let stamp = stamp_provenance(
        &metadata_path,
        stamper.tree_is_clean,
        stamper.stamp.as_ref(),
        &config.tool_name,
    )?;

    merged.serialize(out)?;
    info!(
        target: "fmudist::pipeline",
        package = %merged.name,
        variant = %merged.variant,
        path = %out.display(),
        stamp = stamp.as_str(),
        "emitted"
    );

    let released = ReleasedPackage {
        variant: merged.variant,
        name: merged.name.clone(),
        path: out.to_path_buf(),
        platforms: merged.platforms.clone(),
        reference_samples: regenerated.as_ref().map(|r| r.result.len()),
        documented,
        stamp,
        divergent_shared: merged.divergences.len(),
    };
    Ok((released, regeneration_failure))
}

/// Copy each platform's staged simulator directory into the output.
fn copy_tools(config: &PipelineConfig, report: &mut ReleaseReport) -> Result<()> {
    for platform in config.platforms.as_slice() {
        let name = platform.tools_dir_name();
        let src = config.dist_root.join(platform.dist_dir_name()).join(&name);
        if !src.is_dir() {
            continue;
        }
        let dst = config.output_dir.join(&name);
        if dst.exists() {
            fs::remove_dir_all(&dst)?;
        }
        copy_tree(&src, &dst)?;
        report.tools.push(dst);
    }
    Ok(())
}

fn copy_extra_files(config: &PipelineConfig, report: &mut ReleaseReport) -> Result<()> {
    for file in &config.extra_files {
        let src = config.source_dir.join(file);
        let Some(name) = file.file_name() else {
            continue;
        };
        if !src.is_file() {
            warn!(target: "fmudist::pipeline", file = %src.display(), "extra file not found");
            report.missing_extra_files.push(src);
            continue;
        }
        fs::create_dir_all(&config.output_dir)?;
        let dst = config.output_dir.join(name);
        fs::copy(&src, &dst)?;
        report.extra_files.push(dst);
    }
    Ok(())
}

fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
