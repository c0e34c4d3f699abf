//! End-to-end release runs over staged platform packages, with scripted
//! git and simulator processes.

use std::fs;
use std::path::{Path, PathBuf};

use fmudist_merge::variant_dir;
use fmudist_package::{serialize, Package};
use fmudist_pipeline::{
    build_platform, release, BuildLedger, BuildRecord, BuildStatus, PipelineConfig, ReleaseReport,
};
use fmudist_platform::{parse_platform_list, FmiVariant, Platform};
use fmudist_reference::{ResultTable, RunParameters};
use fmudist_toolchain::{RecordingRunner, ToolOutput};

const METADATA: &str = r#"<fmiModelDescription fmiVersion="3.0" modelName="Alpha"
  generationTool="Reference FMUs (development build)">
  <ModelVariables>
    <Float64 name="time" valueReference="0" causality="independent" unit="s"/>
    <Float64 name="y" valueReference="1" causality="output" unit="m"/>
  </ModelVariables>
</fmiModelDescription>"#;

const RESULT: &str = "\"time\",\"y\"\n0,0\n1,1\n2,2\n";

const PLATFORMS: [Platform; 2] = [Platform::X86_64_LINUX, Platform::X86_64_DARWIN];

fn stage(dist: &Path, platform: Platform) {
    let src = tempfile::tempdir().expect("tempdir");
    fs::write(src.path().join("modelDescription.xml"), METADATA).expect("write metadata");
    let bin = src.path().join("binaries").join(platform.to_string());
    fs::create_dir_all(&bin).expect("mkdir binaries");
    fs::write(bin.join("Alpha.bin"), platform.to_string()).expect("write binary");
    let out = variant_dir(dist, platform, FmiVariant::Fmi3).join("Alpha.fmu");
    serialize(src.path(), &out).expect("serialize platform package");

    let tools = dist
        .join(platform.dist_dir_name())
        .join(platform.tools_dir_name());
    fs::create_dir_all(&tools).expect("mkdir tools");
    fs::write(tools.join("fmusim"), b"exe").expect("write tool");
}

fn record(dist: &Path, platform: Platform) {
    let mut ledger = BuildLedger::default();
    ledger.record(BuildRecord::now("fmi3", FmiVariant::Fmi3, BuildStatus::Succeeded));
    ledger.save(dist, platform).expect("save ledger");
}

fn project(root: &Path) -> PipelineConfig {
    let mut config = PipelineConfig::new(root);
    config.platforms = parse_platform_list(&["x86_64-linux", "x86_64-darwin"]).expect("platforms");
    config.variants = vec![FmiVariant::Fmi3];
    config.extra_files = vec![PathBuf::from("LICENSE.txt")];
    config.simulator.executable = root.join("fmusim");
    fs::write(&config.simulator.executable, b"").expect("write simulator stub");
    config.units.insert(
        "Alpha".into(),
        RunParameters {
            output_interval: Some(1.0),
            ..Default::default()
        },
    );

    fs::create_dir_all(root.join("Alpha")).expect("mkdir unit source");
    fs::write(root.join("Alpha/readme.md"), "# Alpha\n\nA ramp.\n").expect("write readme");
    fs::write(root.join("LICENSE.txt"), "BSD-2-Clause").expect("write license");
    for platform in PLATFORMS {
        stage(&config.dist_root, platform);
    }
    config
}

/// Git reports `status` output and a tag; the simulator writes [`RESULT`].
fn scripted(status: &'static str, simulator_exit: i32) -> RecordingRunner {
    RecordingRunner::new(move |cmd| {
        if cmd.program == Path::new("git") {
            let out = match cmd.args_lossy().first().map(String::as_str) {
                Some("status") => status,
                Some("tag") => "v0.0.30\n",
                _ => "",
            };
            return Ok(ToolOutput::success(out));
        }
        if simulator_exit != 0 {
            return Ok(ToolOutput::failure(simulator_exit, "Failed to instantiate FMU."));
        }
        let out = PathBuf::from(cmd.flag_value("--output-file").expect("output flag"));
        fs::write(out, RESULT)?;
        Ok(ToolOutput::success(""))
    })
}

fn entry_text(package: &Package, name: &str) -> String {
    String::from_utf8(package.read_entry(name).expect("read entry")).expect("utf-8 entry")
}

#[test]
fn clean_release_merges_documents_and_stamps() {
    let root = tempfile::tempdir().expect("tempdir");
    let config = project(root.path());
    for platform in PLATFORMS {
        record(&config.dist_root, platform);
    }

    let report: ReleaseReport = release(&config, &scripted("", 0)).expect("release");
    assert_eq!(report.exit_code(), 0, "{report}");
    assert_eq!(report.released.len(), 1);
    assert_eq!(report.released[0].reference_samples, Some(3));
    assert_eq!(report.stamp.as_ref().map(|s| s.version.as_str()), Some("v0.0.30"));

    let package = Package::open(&config.output_package(FmiVariant::Fmi3, "Alpha.fmu"))
        .expect("open released package");
    let partitions: Vec<String> = package.binary_partitions().into_iter().collect();
    assert_eq!(partitions, ["x86_64-darwin", "x86_64-linux"]);

    let metadata = entry_text(&package, "modelDescription.xml");
    assert!(metadata.contains("generationTool=\"Reference FMUs (v0.0.30)\""));
    assert!(metadata.contains("generationDateAndTime=\""));

    let index = entry_text(&package, "documentation/index.html");
    assert!(index.contains("A ramp."));
    assert!(index.contains("<td>y</td><td>output</td><td>m</td>"));
    assert!(index.contains("--output-interval 1"));
    assert!(package.contains("documentation/result.svg"));
    assert_eq!(entry_text(&package, "documentation/result.csv"), RESULT);

    let stored = ResultTable::read(&config.reference_path(FmiVariant::Fmi3, "Alpha"))
        .expect("read stored reference");
    assert_eq!(stored.times(), [0.0, 1.0, 2.0]);

    assert!(config.output_dir.join("fmusim-x86_64-linux/fmusim").is_file());
    assert!(config.output_dir.join("fmusim-x86_64-darwin/fmusim").is_file());
    assert!(config.output_dir.join("LICENSE.txt").is_file());
}

#[test]
fn dirty_tree_keeps_placeholder() {
    let root = tempfile::tempdir().expect("tempdir");
    let config = project(root.path());
    for platform in PLATFORMS {
        record(&config.dist_root, platform);
    }

    let report = release(&config, &scripted(" M src/fmi3Functions.c\n", 0)).expect("release");
    assert_eq!(report.exit_code(), 0);
    assert_eq!(report.tree_clean, Some(false));
    assert!(report.stamp.is_none());

    let package = Package::open(&config.output_package(FmiVariant::Fmi3, "Alpha.fmu"))
        .expect("open released package");
    assert!(entry_text(&package, "modelDescription.xml")
        .contains("\"Reference FMUs (development build)\""));
}

#[test]
fn simulator_failure_still_emits_package() {
    let root = tempfile::tempdir().expect("tempdir");
    let config = project(root.path());
    for platform in PLATFORMS {
        record(&config.dist_root, platform);
    }
    let reference = config.reference_path(FmiVariant::Fmi3, "Alpha");
    fs::create_dir_all(reference.parent().expect("parent")).expect("mkdir references");
    fs::write(&reference, "\"time\",\"y\"\n0,0\n1,1\n").expect("write prior reference");

    let report = release(&config, &scripted("", 1)).expect("release");
    assert_eq!(report.exit_code(), 0, "regeneration failure alone must not fail the run");
    assert_eq!(report.regeneration_failures.len(), 1);
    assert_eq!(report.released.len(), 1);
    assert_eq!(report.released[0].reference_samples, None);
    assert_eq!(
        fs::read_to_string(&reference).expect("read reference"),
        "\"time\",\"y\"\n0,0\n1,1\n"
    );

    let package = Package::open(&config.output_package(FmiVariant::Fmi3, "Alpha.fmu"))
        .expect("open released package");
    assert!(package.contains("documentation/index.html"));
    assert!(!package.contains("documentation/result.svg"));
}

#[test]
fn missing_build_record_rejects_variant() {
    let root = tempfile::tempdir().expect("tempdir");
    let config = project(root.path());
    record(&config.dist_root, Platform::X86_64_LINUX);

    let report = release(&config, &scripted("", 0)).expect("release");
    assert_eq!(report.exit_code(), 1);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].missing, [Platform::X86_64_DARWIN]);
    assert!(report.released.is_empty());
    assert!(!config.output_package(FmiVariant::Fmi3, "Alpha.fmu").exists());
}

#[test]
fn skipping_the_barrier_merges_anyway() {
    let root = tempfile::tempdir().expect("tempdir");
    let mut config = project(root.path());
    config.require_build_ledger = false;

    let report = release(&config, &scripted("", 0)).expect("release");
    assert_eq!(report.exit_code(), 0, "{report}");
    assert_eq!(report.released.len(), 1);
}

#[test]
fn corrupt_platform_package_fails_run() {
    let root = tempfile::tempdir().expect("tempdir");
    let config = project(root.path());
    for platform in PLATFORMS {
        record(&config.dist_root, platform);
    }
    let darwin = variant_dir(&config.dist_root, Platform::X86_64_DARWIN, FmiVariant::Fmi3)
        .join("Alpha.fmu");
    fs::write(&darwin, b"not a zip").expect("corrupt package");

    let report = release(&config, &scripted("", 0)).expect("release");
    assert_eq!(report.exit_code(), 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].name, "Alpha.fmu");
    assert!(!config.output_package(FmiVariant::Fmi3, "Alpha.fmu").exists());
}

#[test]
fn failed_platform_rebuild_contributes_nothing() {
    let root = tempfile::tempdir().expect("tempdir");
    let config = project(root.path());
    for platform in PLATFORMS {
        record(&config.dist_root, platform);
    }

    let failing = RecordingRunner::new(|_| Ok(ToolOutput::failure(1, "CMake Error: no compiler")));
    let build = build_platform(&config, &failing, Platform::X86_64_DARWIN, &[FmiVariant::Fmi3])
        .expect("build darwin");
    assert_eq!(build.exit_code(), 1);
    let ledger = BuildLedger::load(&config.dist_root, Platform::X86_64_DARWIN).expect("load ledger");
    assert_eq!(
        ledger.get("fmi3", FmiVariant::Fmi3).expect("darwin record").status,
        BuildStatus::Failed
    );

    let report = release(&config, &scripted("", 0)).expect("release");
    let package = Package::open(&config.output_package(FmiVariant::Fmi3, "Alpha.fmu"))
        .expect("open released package");
    let partitions: Vec<String> = package.binary_partitions().into_iter().collect();
    assert_eq!(partitions, ["x86_64-linux"], "{report}");
}
