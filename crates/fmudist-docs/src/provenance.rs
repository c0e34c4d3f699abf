//! Provenance stamping of package metadata.
//!
//! Platform builds write `generationTool="<tool> (development build)"`. A
//! release run replaces the placeholder with the tag (or short revision)
//! of a clean working tree and records the release time:
//!
//! ```text
//! generationTool="Reference FMUs (v0.0.30)"
//!   generationDateAndTime="2024-03-01T10:00:00Z"
//! ```
//!
//! A dirty tree never gets a release identity; the placeholder stays.

use std::fs;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use fmudist_toolchain::{Git, ProcessRunner, VcsState};
use tracing::{debug, info};

use crate::error::Result;

/// Suffix marking an unreleased build.
pub const DEVELOPMENT_BUILD: &str = "development build";

const DATE_ATTRIBUTE: &str = "generationDateAndTime";

/// Release identity applied to every package of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvenanceStamp {
    /// Tag or short revision.
    pub version: String,
    /// UTC ISO-8601 timestamp.
    pub timestamp: String,
}

impl ProvenanceStamp {
    pub fn new(version: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            version: version.into(),
            timestamp: at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// Stamp for a queried working tree; `None` if it is dirty or has no
    /// resolvable version.
    pub fn from_state(state: &VcsState, at: DateTime<Utc>) -> Option<Self> {
        if state.has_local_changes {
            return None;
        }
        state
            .release_id
            .as_deref()
            .filter(|v| !v.is_empty())
            .map(|v| Self::new(v, at))
    }

    /// Query git and build the stamp, timestamped now.
    pub fn resolve(git: &Git, runner: &dyn ProcessRunner) -> Result<(VcsState, Option<Self>)> {
        let state = git.query(runner)?;
        let stamp = Self::from_state(&state, Utc::now());
        Ok((state, stamp))
    }
}

/// What [`stamp_provenance`] did to a metadata file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StampOutcome {
    /// The placeholder was replaced.
    Stamped,
    /// The tree has local changes; nothing was written.
    SkippedDirtyTree,
    /// The tree is clean but no version could be resolved; nothing was written.
    VersionUnresolved,
    /// The file carries no placeholder; nothing was written.
    PlaceholderAbsent,
}

impl StampOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            StampOutcome::Stamped => "stamped",
            StampOutcome::SkippedDirtyTree => "skipped (dirty tree)",
            StampOutcome::VersionUnresolved => "skipped (no version)",
            StampOutcome::PlaceholderAbsent => "skipped (no placeholder)",
        }
    }
}

/// Replace the placeholder in metadata text.
///
/// Returns `None` if `text` does not contain the quoted placeholder. An
/// existing `generationDateAndTime` attribute is updated in place rather
/// than duplicated.
pub fn stamp_text(text: &str, tool_name: &str, stamp: &ProvenanceStamp) -> Option<String> {
    let placeholder = format!("\"{tool_name} ({DEVELOPMENT_BUILD})\"");
    if !text.contains(&placeholder) {
        return None;
    }
    let released = format!("\"{tool_name} ({})\"", stamp.version);

    let date_prefix = format!("{DATE_ATTRIBUTE}=\"");
    if let Some(start) = text.find(&date_prefix) {
        let value_start = start + date_prefix.len();
        if let Some(len) = text[value_start..].find('"') {
            let mut out = String::with_capacity(text.len() + 32);
            out.push_str(&text[..value_start]);
            out.push_str(&stamp.timestamp);
            out.push_str(&text[value_start + len..]);
            return Some(out.replace(&placeholder, &released));
        }
    }
    let with_date = format!("{released}\n  {DATE_ATTRIBUTE}=\"{}\"", stamp.timestamp);
    Some(text.replace(&placeholder, &with_date))
}

/// Stamp the metadata file at `path`.
///
/// The file is only rewritten for [`StampOutcome::Stamped`].
pub fn stamp_provenance(
    path: &Path,
    tree_is_clean: bool,
    stamp: Option<&ProvenanceStamp>,
    tool_name: &str,
) -> Result<StampOutcome> {
    if !tree_is_clean {
        debug!(target: "fmudist::provenance", path = %path.display(), "working tree dirty, not stamping");
        return Ok(StampOutcome::SkippedDirtyTree);
    }
    let Some(stamp) = stamp else {
        return Ok(StampOutcome::VersionUnresolved);
    };
    let text = fs::read_to_string(path)?;
    match stamp_text(&text, tool_name, stamp) {
        Some(stamped) => {
            fs::write(path, stamped)?;
            info!(
                target: "fmudist::provenance",
                path = %path.display(),
                version = %stamp.version,
                "stamped provenance"
            );
            Ok(StampOutcome::Stamped)
        }
        None => Ok(StampOutcome::PlaceholderAbsent),
    }
}
