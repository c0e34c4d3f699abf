//! Cross-platform verification of shared package content.
//!
//! Metadata, resources and every other non-binary file are expected to be
//! byte-identical in all platform builds of a package. The digests of each
//! contribution are compared against the first one in declared order.

use std::collections::BTreeMap;

use fmudist_package::ContentHash;
use fmudist_platform::Platform;
use tracing::warn;

use crate::error::{MergeError, Result};

/// A shared file that differs from the first platform's copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedDivergence {
    /// Entry name inside the package.
    pub entry: String,
    /// Platform whose copy is kept.
    pub first: Platform,
    /// Platform whose copy differs or lacks the entry.
    pub other: Platform,
}

/// Compare shared digests of all contributions to the first one.
///
/// With `allow_divergent` unset, the first difference is returned as
/// [`MergeError::SharedContentConflict`] (or `SharedContentMissing`).
/// Otherwise every difference is logged and returned, and the caller keeps
/// the first platform's copy.
pub fn verify_shared(
    package: &str,
    digests: &[(Platform, BTreeMap<String, ContentHash>)],
    allow_divergent: bool,
) -> Result<Vec<SharedDivergence>> {
    let Some((first, reference)) = digests.first() else {
        return Ok(Vec::new());
    };

    let mut divergences = Vec::new();
    for (other, theirs) in &digests[1..] {
        for (entry, digest) in reference {
            match theirs.get(entry) {
                Some(d) if d == digest => {}
                Some(d) => {
                    if !allow_divergent {
                        return Err(MergeError::SharedContentConflict {
                            package: package.to_string(),
                            entry: entry.clone(),
                            first: *first,
                            other: *other,
                            first_digest: digest.short().to_string(),
                            other_digest: d.short().to_string(),
                        });
                    }
                    divergences.push(SharedDivergence {
                        entry: entry.clone(),
                        first: *first,
                        other: *other,
                    });
                }
                None => {
                    if !allow_divergent {
                        return Err(MergeError::SharedContentMissing {
                            package: package.to_string(),
                            entry: entry.clone(),
                            present: *first,
                            absent: *other,
                        });
                    }
                    divergences.push(SharedDivergence {
                        entry: entry.clone(),
                        first: *first,
                        other: *other,
                    });
                }
            }
        }
        for entry in theirs.keys().filter(|e| !reference.contains_key(*e)) {
            if !allow_divergent {
                return Err(MergeError::SharedContentMissing {
                    package: package.to_string(),
                    entry: entry.clone(),
                    present: *other,
                    absent: *first,
                });
            }
            divergences.push(SharedDivergence {
                entry: entry.clone(),
                first: *first,
                other: *other,
            });
        }
    }

    for d in &divergences {
        warn!(
            target: "fmudist::merge",
            package,
            entry = %d.entry,
            kept = %d.first,
            other = %d.other,
            "shared content diverges, keeping first platform's copy"
        );
    }
    Ok(divergences)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digests(files: &[(&str, &str)]) -> BTreeMap<String, ContentHash> {
        files
            .iter()
            .map(|(name, body)| (name.to_string(), ContentHash::compute(body.as_bytes())))
            .collect()
    }

    #[test]
    fn identical_content_passes() {
        let d = digests(&[("modelDescription.xml", "<a/>"), ("resources/r.txt", "r")]);
        let all = vec![
            (Platform::X86_64_WINDOWS, d.clone()),
            (Platform::X86_64_LINUX, d.clone()),
            (Platform::X86_64_DARWIN, d),
        ];
        assert!(verify_shared("A.fmu", &all, false).unwrap().is_empty());
    }

    #[test]
    fn differing_metadata_is_conflict() {
        let all = vec![
            (Platform::X86_64_WINDOWS, digests(&[("modelDescription.xml", "<a/>")])),
            (Platform::X86_64_LINUX, digests(&[("modelDescription.xml", "<b/>")])),
        ];
        let err = verify_shared("A.fmu", &all, false).unwrap_err();
        match err {
            MergeError::SharedContentConflict { entry, first, other, .. } => {
                assert_eq!(entry, "modelDescription.xml");
                assert_eq!(first, Platform::X86_64_WINDOWS);
                assert_eq!(other, Platform::X86_64_LINUX);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn extra_shared_file_is_reported() {
        let all = vec![
            (Platform::X86_64_WINDOWS, digests(&[("modelDescription.xml", "<a/>")])),
            (
                Platform::X86_64_LINUX,
                digests(&[("modelDescription.xml", "<a/>"), ("resources/extra", "x")]),
            ),
        ];
        assert!(matches!(
            verify_shared("A.fmu", &all, false),
            Err(MergeError::SharedContentMissing { .. })
        ));
    }

    #[test]
    fn override_collects_divergences() {
        let all = vec![
            (Platform::X86_64_WINDOWS, digests(&[("modelDescription.xml", "<a/>")])),
            (Platform::X86_64_LINUX, digests(&[("modelDescription.xml", "<b/>")])),
            (Platform::X86_64_DARWIN, digests(&[])),
        ];
        let found = verify_shared("A.fmu", &all, true).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].other, Platform::X86_64_DARWIN);
    }
}
