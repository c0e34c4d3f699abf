//! Per-variant merge of platform packages.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use fmudist_package::{EntryKind, Package, PackageError};
use fmudist_platform::{FmiVariant, Platform};
use tracing::{debug, error, info, warn};

use crate::conflict::{verify_shared, SharedDivergence};
use crate::error::{MergeError, Result};
use crate::workspace::ScratchWorkspace;

/// Options for merging.
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    /// Keep the first platform's copy when shared content differs instead
    /// of failing the package.
    pub allow_divergent_shared: bool,
    /// Directory scratch workspaces are created in; system temp otherwise.
    pub scratch_root: Option<PathBuf>,
}

/// One platform's copy of a package.
#[derive(Debug, Clone)]
pub struct Contribution {
    pub platform: Platform,
    pub path: PathBuf,
}

/// A merged package, assembled but not yet serialized.
#[derive(Debug)]
pub struct MergedPackage {
    /// Package file name (`BouncingBall.fmu`).
    pub name: String,
    /// File stem, which is the unit name (`BouncingBall`).
    pub unit: String,
    pub variant: FmiVariant,
    /// Workspace holding the merged tree.
    pub workspace: ScratchWorkspace,
    /// Platforms that contributed, in declared order.
    pub platforms: Vec<Platform>,
    /// Shared files that differed and were taken from the first platform.
    pub divergences: Vec<SharedDivergence>,
}

impl MergedPackage {
    /// Serialize the merged tree to `out`.
    pub fn serialize(&self, out: &Path) -> Result<Package> {
        self.workspace.serialize(out)
    }
}

/// Result of merging one worklist entry.
#[derive(Debug)]
pub enum MergeOutcome {
    /// The package was merged.
    Merged(MergedPackage),
    /// No platform contributed the package.
    Skipped { name: String },
    /// Merging the package failed.
    Failed { name: String, error: MergeError },
}

impl MergeOutcome {
    /// Package file name this outcome is about.
    pub fn name(&self) -> &str {
        match self {
            MergeOutcome::Merged(m) => &m.name,
            MergeOutcome::Skipped { name } | MergeOutcome::Failed { name, .. } => name,
        }
    }
}

/// Directory holding one platform's packages for a variant.
pub fn variant_dir(dist_root: &Path, platform: Platform, variant: FmiVariant) -> PathBuf {
    dist_root
        .join(platform.dist_dir_name())
        .join(variant.dist_subdir())
}

/// Package file names present for the first platform that builds `variant`.
///
/// A missing directory yields an empty worklist.
pub fn list_worklist(
    dist_root: &Path,
    variant: FmiVariant,
    platforms: &[Platform],
) -> Result<Vec<String>> {
    let Some(first) = platforms.iter().find(|p| p.supports(variant)) else {
        return Ok(Vec::new());
    };
    let dir = variant_dir(dist_root, *first, variant);
    if !dir.is_dir() {
        warn!(
            target: "fmudist::merge",
            platform = %first,
            variant = %variant,
            dir = %dir.display(),
            "first platform has no output directory, nothing to merge"
        );
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if name.ends_with(".fmu") {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

/// Merge one package name from the given per-platform copies.
///
/// `contributions` must be in declared platform order. Returns `Ok(None)`
/// when it is empty.
pub fn merge_package(
    name: &str,
    variant: FmiVariant,
    contributions: &[Contribution],
    options: &MergeOptions,
) -> Result<Option<MergedPackage>> {
    if contributions.is_empty() {
        return Ok(None);
    }

    let mut opened = Vec::with_capacity(contributions.len());
    for c in contributions {
        let package = Package::open(&c.path)?;
        package.require_layout()?;
        let partition = expected_partition(&package, c.platform, variant)?;
        opened.push((c.platform, package, partition));
    }

    let mut digests = Vec::with_capacity(opened.len());
    for (platform, package, _) in &opened {
        digests.push((*platform, package.shared_digests()?));
    }
    let divergences = verify_shared(name, &digests, options.allow_divergent_shared)?;

    let workspace = ScratchWorkspace::new(options.scratch_root.as_deref())?;
    for (i, (platform, package, partition)) in opened.iter().enumerate() {
        if i == 0 {
            package.extract_to(workspace.path())?;
        } else {
            package.extract_filtered(workspace.path(), |entry| match entry.kind() {
                EntryKind::BinaryRoot => true,
                EntryKind::Binary { partition: p } => p == *partition,
                _ => false,
            })?;
        }
        debug!(
            target: "fmudist::merge",
            package = name,
            platform = %platform,
            partition = %partition,
            "extracted contribution"
        );
    }

    let unit = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
        .to_string();

    Ok(Some(MergedPackage {
        name: name.to_string(),
        unit,
        variant,
        workspace,
        platforms: opened.iter().map(|(p, _, _)| *p).collect(),
        divergences,
    }))
}

/// The partition a platform's package must carry, checked against its contents.
fn expected_partition(package: &Package, platform: Platform, variant: FmiVariant) -> Result<String> {
    let expected = platform
        .binary_partition(variant)
        .ok_or(MergeError::NoPartition { platform })?;
    let found = package.binary_partitions();
    if found.len() == 1 && found.contains(&expected) {
        return Ok(expected);
    }
    let found: Vec<&str> = found.iter().map(String::as_str).collect();
    Err(PackageError::InvalidLayout {
        path: package.path().to_path_buf(),
        missing: format!(
            "exactly one binary partition 'binaries/{expected}' (found [{}])",
            found.join(", ")
        ),
    }
    .into())
}

/// Merge every package of `variant` across `platforms`.
///
/// Platforms that do not build the variant are ignored. A platform missing
/// one package contributes nothing to it. Every failure is logged and
/// recorded; it never stops the remaining names.
pub fn merge_variant(
    dist_root: &Path,
    variant: FmiVariant,
    platforms: &[Platform],
    options: &MergeOptions,
) -> Result<Vec<MergeOutcome>> {
    let participating: Vec<Platform> = platforms
        .iter()
        .copied()
        .filter(|p| p.supports(variant))
        .collect();
    let worklist = list_worklist(dist_root, variant, &participating)?;
    info!(
        target: "fmudist::merge",
        variant = %variant,
        packages = worklist.len(),
        platforms = participating.len(),
        "merging variant"
    );

    let mut outcomes = Vec::with_capacity(worklist.len());
    for name in worklist {
        let mut contributions = Vec::new();
        let mut absent = BTreeSet::new();
        for platform in &participating {
            let path = variant_dir(dist_root, *platform, variant).join(&name);
            if path.is_file() {
                contributions.push(Contribution {
                    platform: *platform,
                    path,
                });
            } else {
                absent.insert(platform.to_string());
            }
        }
        if !absent.is_empty() {
            debug!(
                target: "fmudist::merge",
                package = %name,
                absent = ?absent,
                "platforms without a copy contribute nothing"
            );
        }

        let outcome = match merge_package(&name, variant, &contributions, options) {
            Ok(Some(merged)) => {
                info!(
                    target: "fmudist::merge",
                    package = %name,
                    platforms = merged.platforms.len(),
                    "merged"
                );
                MergeOutcome::Merged(merged)
            }
            Ok(None) => {
                warn!(target: "fmudist::merge", package = %name, "no platform contributed, skipping");
                MergeOutcome::Skipped { name }
            }
            Err(e) => {
                error!(target: "fmudist::merge", package = %name, error = %e, "merge failed");
                MergeOutcome::Failed { name, error: e }
            }
        };
        outcomes.push(outcome);
    }
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_platform_package(
        dist: &Path,
        platform: Platform,
        variant: FmiVariant,
        name: &str,
        metadata: &str,
    ) -> PathBuf {
        let src = tempfile::tempdir().unwrap();
        fs::write(src.path().join("modelDescription.xml"), metadata).unwrap();
        let partition = platform.binary_partition(variant).unwrap();
        let bin = src.path().join("binaries").join(&partition);
        fs::create_dir_all(&bin).unwrap();
        fs::write(bin.join("model.bin"), partition.as_bytes()).unwrap();
        let out = variant_dir(dist, platform, variant).join(name);
        fmudist_package::serialize(src.path(), &out).unwrap();
        out
    }

    #[test]
    fn worklist_comes_from_first_supporting_platform() {
        let dist = tempfile::tempdir().unwrap();
        let v = FmiVariant::Fmi2;
        write_platform_package(dist.path(), Platform::X86_WINDOWS, v, "B.fmu", "<m/>");
        write_platform_package(dist.path(), Platform::X86_WINDOWS, v, "A.fmu", "<m/>");
        write_platform_package(dist.path(), Platform::X86_64_LINUX, v, "C.fmu", "<m/>");

        let order = [Platform::AARCH64_LINUX, Platform::X86_WINDOWS, Platform::X86_64_LINUX];
        let names = list_worklist(dist.path(), v, &order).unwrap();
        assert_eq!(names, ["A.fmu", "B.fmu"]);
    }

    #[test]
    fn empty_contributions_yield_none() {
        let merged = merge_package("A.fmu", FmiVariant::Fmi3, &[], &MergeOptions::default()).unwrap();
        assert!(merged.is_none());
    }

    #[test]
    fn foreign_partition_is_invalid_layout() {
        let dist = tempfile::tempdir().unwrap();
        let v = FmiVariant::Fmi3;
        // Linux's package staged under the Windows directory.
        let src = tempfile::tempdir().unwrap();
        fs::write(src.path().join("modelDescription.xml"), "<m/>").unwrap();
        fs::create_dir_all(src.path().join("binaries/x86_64-linux")).unwrap();
        fs::write(src.path().join("binaries/x86_64-linux/m.so"), b"so").unwrap();
        let path = variant_dir(dist.path(), Platform::X86_64_WINDOWS, v).join("A.fmu");
        fmudist_package::serialize(src.path(), &path).unwrap();

        let contributions = [Contribution {
            platform: Platform::X86_64_WINDOWS,
            path,
        }];
        let err = merge_package("A.fmu", v, &contributions, &MergeOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            MergeError::Package(PackageError::InvalidLayout { .. })
        ));
    }

    #[test]
    fn divergent_metadata_fails_package_only() {
        let dist = tempfile::tempdir().unwrap();
        let v = FmiVariant::Fmi3;
        write_platform_package(dist.path(), Platform::X86_64_WINDOWS, v, "A.fmu", "<a/>");
        write_platform_package(dist.path(), Platform::X86_64_LINUX, v, "A.fmu", "<b/>");
        write_platform_package(dist.path(), Platform::X86_64_WINDOWS, v, "B.fmu", "<m/>");
        write_platform_package(dist.path(), Platform::X86_64_LINUX, v, "B.fmu", "<m/>");

        let order = [Platform::X86_64_WINDOWS, Platform::X86_64_LINUX];
        let outcomes = merge_variant(dist.path(), v, &order, &MergeOptions::default()).unwrap();
        assert_eq!(outcomes.len(), 2);
        assert!(matches!(
            outcomes[0],
            MergeOutcome::Failed {
                error: MergeError::SharedContentConflict { .. },
                ..
            }
        ));
        assert!(matches!(outcomes[1], MergeOutcome::Merged(_)));
    }

    #[test]
    fn divergence_override_keeps_first_copy() {
        let dist = tempfile::tempdir().unwrap();
        let v = FmiVariant::Fmi3;
        write_platform_package(dist.path(), Platform::X86_64_WINDOWS, v, "A.fmu", "<a/>");
        write_platform_package(dist.path(), Platform::X86_64_LINUX, v, "A.fmu", "<b/>");

        let options = MergeOptions {
            allow_divergent_shared: true,
            ..Default::default()
        };
        let order = [Platform::X86_64_WINDOWS, Platform::X86_64_LINUX];
        let outcomes = merge_variant(dist.path(), v, &order, &options).unwrap();
        let MergeOutcome::Merged(ref merged) = outcomes[0] else {
            panic!("expected merge, got {:?}", outcomes[0]);
        };
        assert_eq!(merged.divergences.len(), 1);
        let metadata = fs::read_to_string(merged.workspace.join("modelDescription.xml")).unwrap();
        assert_eq!(metadata, "<a/>");
    }

    #[test]
    fn corrupt_contribution_is_recorded() {
        let dist = tempfile::tempdir().unwrap();
        let v = FmiVariant::Fmi3;
        write_platform_package(dist.path(), Platform::X86_64_WINDOWS, v, "A.fmu", "<m/>");
        let bad = variant_dir(dist.path(), Platform::X86_64_LINUX, v);
        fs::create_dir_all(&bad).unwrap();
        fs::write(bad.join("A.fmu"), b"not a zip").unwrap();

        let order = [Platform::X86_64_WINDOWS, Platform::X86_64_LINUX];
        let outcomes = merge_variant(dist.path(), v, &order, &MergeOptions::default()).unwrap();
        assert!(matches!(
            outcomes[0],
            MergeOutcome::Failed {
                error: MergeError::Package(PackageError::CorruptPackage { .. }),
                ..
            }
        ));
    }
}
