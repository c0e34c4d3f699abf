//! Summary of a release run.

use std::fmt;
use std::path::PathBuf;

use fmudist_docs::{ProvenanceStamp, StampOutcome};
use fmudist_platform::{FmiVariant, Platform};

/// A package that was emitted.
#[derive(Debug, Clone)]
pub struct ReleasedPackage {
    pub variant: FmiVariant,
    pub name: String,
    pub path: PathBuf,
    /// Platforms whose binaries it carries.
    pub platforms: Vec<Platform>,
    /// Samples in the regenerated reference, if one was made.
    pub reference_samples: Option<usize>,
    pub documented: bool,
    pub stamp: StampOutcome,
    /// Shared files that differed across platforms and were taken from the first.
    pub divergent_shared: usize,
}

/// A package that failed to merge or emit.
#[derive(Debug, Clone)]
pub struct PackageFailure {
    pub variant: FmiVariant,
    pub name: String,
    pub error: String,
}

/// A reference that could not be regenerated. Not fatal to the run.
#[derive(Debug, Clone)]
pub struct RegenerationFailure {
    pub variant: FmiVariant,
    pub unit: String,
    pub error: String,
}

/// A variant the build barrier kept from merging.
#[derive(Debug, Clone)]
pub struct BarrierRejection {
    pub variant: FmiVariant,
    pub missing: Vec<Platform>,
}

/// Everything a release run did.
#[derive(Debug, Clone, Default)]
pub struct ReleaseReport {
    /// Stamp applied to every package; `None` if none could be resolved.
    pub stamp: Option<ProvenanceStamp>,
    /// Whether the working tree was clean; `None` if it could not be queried.
    pub tree_clean: Option<bool>,
    pub released: Vec<ReleasedPackage>,
    /// Packages no platform contributed.
    pub skipped: Vec<(FmiVariant, String)>,
    pub failed: Vec<PackageFailure>,
    pub regeneration_failures: Vec<RegenerationFailure>,
    pub rejected: Vec<BarrierRejection>,
    /// Simulator directories copied into the output.
    pub tools: Vec<PathBuf>,
    /// Extra files copied into the output.
    pub extra_files: Vec<PathBuf>,
    /// Extra files that were not found.
    pub missing_extra_files: Vec<PathBuf>,
}

impl ReleaseReport {
    /// Whether every package was emitted and no variant was rejected.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.rejected.is_empty()
    }

    /// Process exit code: 0 on success, 1 if a package failed to emit or
    /// the barrier rejected a variant. Regeneration failures do not count.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

impl fmt::Display for ReleaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Release Report ===")?;
        match (&self.stamp, self.tree_clean) {
            (Some(stamp), _) => writeln!(f, "Version: {} ({})", stamp.version, stamp.timestamp)?,
            (None, Some(false)) => writeln!(f, "Version: development build (working tree has local changes)")?,
            (None, _) => writeln!(f, "Version: development build")?,
        }

        writeln!(f)?;
        writeln!(f, "--- Packages ({} released) ---", self.released.len())?;
        for p in &self.released {
            let reference = match p.reference_samples {
                Some(n) => format!(", reference {n} samples"),
                None => String::new(),
            };
            writeln!(
                f,
                "  {}/{}: {} platforms{}{}, {}",
                p.variant,
                p.name,
                p.platforms.len(),
                reference,
                if p.documented { ", documented" } else { "" },
                p.stamp.as_str(),
            )?;
            if p.divergent_shared > 0 {
                writeln!(
                    f,
                    "    warning: {} shared files differed across platforms",
                    p.divergent_shared
                )?;
            }
        }

        if !self.skipped.is_empty() {
            writeln!(f)?;
            writeln!(f, "--- Skipped ({}) ---", self.skipped.len())?;
            for (variant, name) in &self.skipped {
                writeln!(f, "  {variant}/{name}: no platform contributed")?;
            }
        }

        if !self.regeneration_failures.is_empty() {
            writeln!(f)?;
            writeln!(
                f,
                "--- Reference regeneration failed ({}) ---",
                self.regeneration_failures.len()
            )?;
            for r in &self.regeneration_failures {
                writeln!(f, "  {}/{}: {}", r.variant, r.unit, r.error)?;
            }
        }

        if !self.failed.is_empty() {
            writeln!(f)?;
            writeln!(f, "--- Failed ({}) ---", self.failed.len())?;
            for p in &self.failed {
                writeln!(f, "  {}/{}: {}", p.variant, p.name, p.error)?;
            }
        }

        for r in &self.rejected {
            writeln!(f)?;
            let missing: Vec<String> = r.missing.iter().map(Platform::to_string).collect();
            writeln!(
                f,
                "--- FMI {} not merged: no build record from {} ---",
                r.variant,
                missing.join(", ")
            )?;
        }

        for path in &self.missing_extra_files {
            writeln!(f, "warning: extra file {} not found", path.display())?;
        }

        writeln!(f)?;
        writeln!(f, "Result: {}", if self.is_success() { "OK" } else { "FAILED" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn released(name: &str) -> ReleasedPackage {
        ReleasedPackage {
            variant: FmiVariant::Fmi3,
            name: name.into(),
            path: PathBuf::from(format!("dist-merged/3.0/{name}")),
            platforms: vec![Platform::X86_64_LINUX, Platform::X86_64_WINDOWS],
            reference_samples: Some(61),
            documented: true,
            stamp: StampOutcome::Stamped,
            divergent_shared: 0,
        }
    }

    #[test]
    fn regeneration_failure_keeps_exit_zero() {
        let report = ReleaseReport {
            released: vec![released("Stair.fmu")],
            regeneration_failures: vec![RegenerationFailure {
                variant: FmiVariant::Fmi3,
                unit: "Stair".into(),
                error: "simulator exited with 1".into(),
            }],
            ..Default::default()
        };
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn failed_package_or_rejection_exits_one() {
        let failed = ReleaseReport {
            failed: vec![PackageFailure {
                variant: FmiVariant::Fmi2,
                name: "Feedthrough.fmu".into(),
                error: "corrupt".into(),
            }],
            ..Default::default()
        };
        assert_eq!(failed.exit_code(), 1);

        let rejected = ReleaseReport {
            rejected: vec![BarrierRejection {
                variant: FmiVariant::Fmi3,
                missing: vec![Platform::AARCH64_DARWIN],
            }],
            ..Default::default()
        };
        assert_eq!(rejected.exit_code(), 1);
    }

    #[test]
    fn display_lists_packages() {
        let report = ReleaseReport {
            released: vec![released("Stair.fmu")],
            skipped: vec![(FmiVariant::Fmi1Cs, "Resource.fmu".into())],
            ..Default::default()
        };
        let text = report.to_string();
        assert!(text.contains("Release Report"));
        assert!(text.contains("3.0/Stair.fmu: 2 platforms, reference 61 samples, documented, stamped"));
        assert!(text.contains("1.0/cs/Resource.fmu: no platform contributed"));
        assert!(text.contains("Result: OK"));
    }
}
