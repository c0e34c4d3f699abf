//! Parsing and validation of declared platform lists.
//!
//! The declared order is significant: the first platform that contributes
//! to a merged package supplies its shared metadata. A list is therefore
//! kept exactly as written, and duplicates are rejected rather than
//! silently collapsed.

use crate::error::{PlatformError, Result};
use crate::platform::Platform;
use crate::variant::FmiVariant;

/// A validation issue found in a platform list.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Severity: "error" or "warning".
    pub severity: &'static str,
    /// Human-readable description.
    pub message: String,
}

/// An ordered, duplicate-free list of platforms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformSet {
    platforms: Vec<Platform>,
}

impl PlatformSet {
    /// Build a set from an already-parsed list, rejecting duplicates.
    pub fn new(platforms: Vec<Platform>) -> Result<Self> {
        let set = PlatformSet { platforms };
        if let Err(issues) = validate_platform_set(&set) {
            let errors: Vec<String> = issues
                .into_iter()
                .filter(|i| i.severity == "error")
                .map(|i| i.message)
                .collect();
            if !errors.is_empty() {
                return Err(PlatformError::InvalidList {
                    detail: errors.join("; "),
                });
            }
        }
        Ok(set)
    }

    /// The built-in declared order.
    pub fn builtin() -> Self {
        PlatformSet {
            platforms: Platform::builtin_order(),
        }
    }

    /// All platforms in declared order.
    pub fn as_slice(&self) -> &[Platform] {
        &self.platforms
    }

    /// Platforms that build `variant`, in declared order.
    pub fn supporting(&self, variant: FmiVariant) -> Vec<Platform> {
        self.platforms
            .iter()
            .copied()
            .filter(|p| p.supports(variant))
            .collect()
    }

    /// Number of platforms.
    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }

    /// Whether the set contains `platform`.
    pub fn contains(&self, platform: &Platform) -> bool {
        self.platforms.contains(platform)
    }
}

/// Parse a list of platform identifiers, keeping their order.
pub fn parse_platform_list<S: AsRef<str>>(ids: &[S]) -> Result<PlatformSet> {
    let platforms = ids
        .iter()
        .map(|id| id.as_ref().parse::<Platform>())
        .collect::<Result<Vec<_>>>()?;
    PlatformSet::new(platforms)
}


/// Validate a platform list for structural correctness.
///
/// Returns `Ok(())` if valid, or `Err(issues)` with a list of problems.
pub fn validate_platform_set(set: &PlatformSet) -> std::result::Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    // 1. At least one platform
    if set.platforms.is_empty() {
        issues.push(ValidationIssue {
            severity: "error",
            message: "platform list is empty".into(),
        });
    }

    // 2. No duplicates
    for (i, platform) in set.platforms.iter().enumerate() {
        if set.platforms[..i].contains(platform) {
            issues.push(ValidationIssue {
                severity: "error",
                message: format!("platform '{platform}' is listed more than once"),
            });
        }
    }

    // 3. Variants nobody builds
    for variant in FmiVariant::ALL {
        if !set.platforms.is_empty() && set.supporting(variant).is_empty() {
            issues.push(ValidationIssue {
                severity: "warning",
                message: format!("no listed platform builds FMI variant {variant}"),
            });
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}
