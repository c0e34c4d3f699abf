//! Build-record ledger and the merge barrier.
//!
//! Each platform's distribution directory holds `build-record.json`, one
//! record per (unit, variant) build that ran to completion, successful or
//! not. A variant may only be merged once every platform that builds it has
//! a record.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use fmudist_platform::{FmiVariant, Platform, PlatformSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PipelineError, Result};

/// Ledger file inside `dist-<platform>/`.
pub const LEDGER_FILE: &str = "build-record.json";

/// How a recorded build ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    Succeeded,
    Failed,
}

/// One finished build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRecord {
    pub unit: String,
    pub variant: FmiVariant,
    pub status: BuildStatus,
    /// UTC ISO-8601.
    pub finished_at: String,
    /// Packages staged by a successful build.
    #[serde(default)]
    pub packages: usize,
    /// Failure message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl BuildRecord {
    /// A record finished now.
    pub fn now(unit: &str, variant: FmiVariant, status: BuildStatus) -> Self {
        Self {
            unit: unit.to_string(),
            variant,
            status,
            finished_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            packages: 0,
            detail: None,
        }
    }
}

/// All build records of one platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildLedger {
    pub records: Vec<BuildRecord>,
}

impl BuildLedger {
    /// Location of `platform`'s ledger.
    pub fn path(dist_root: &Path, platform: Platform) -> PathBuf {
        dist_root.join(platform.dist_dir_name()).join(LEDGER_FILE)
    }

    /// Load `platform`'s ledger. A missing file is an empty ledger.
    pub fn load(dist_root: &Path, platform: Platform) -> Result<Self> {
        let path = Self::path(dist_root, platform);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(&path)?;
        serde_json::from_str(&text).map_err(|source| PipelineError::Ledger { path, source })
    }

    /// Write the ledger, replacing the previous file atomically.
    pub fn save(&self, dist_root: &Path, platform: Platform) -> Result<PathBuf> {
        let path = Self::path(dist_root, platform);
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| dist_root.to_path_buf());
        fs::create_dir_all(&dir)?;
        let json = serde_json::to_string_pretty(self).map_err(|source| PipelineError::Ledger {
            path: path.clone(),
            source,
        })?;
        let mut temp = tempfile::NamedTempFile::new_in(&dir)?;
        temp.write_all(json.as_bytes())?;
        temp.write_all(b"\n")?;
        temp.persist(&path).map_err(|e| PipelineError::Io(e.error))?;
        Ok(path)
    }

    /// Add `record`, replacing an earlier one for the same unit and variant.
    pub fn record(&mut self, record: BuildRecord) {
        self.records
            .retain(|r| !(r.unit == record.unit && r.variant == record.variant));
        self.records.push(record);
    }

    /// Whether any build of `variant` was recorded.
    pub fn has_variant(&self, variant: FmiVariant) -> bool {
        self.records.iter().any(|r| r.variant == variant)
    }

    /// The latest record for `unit` and `variant`.
    pub fn get(&self, unit: &str, variant: FmiVariant) -> Option<&BuildRecord> {
        self.records
            .iter()
            .find(|r| r.unit == unit && r.variant == variant)
    }
}

/// Reject merging `variant` until every supporting platform recorded a build.
pub fn check_barrier(dist_root: &Path, variant: FmiVariant, platforms: &PlatformSet) -> Result<()> {
    let mut missing = Vec::new();
    for platform in platforms.supporting(variant) {
        let ledger = BuildLedger::load(dist_root, platform)?;
        if !ledger.has_variant(variant) {
            missing.push(platform);
        }
    }
    if !missing.is_empty() {
        return Err(PipelineError::BarrierNotSatisfied { variant, missing });
    }
    debug!(target: "fmudist::pipeline", variant = %variant, "build barrier satisfied");
    Ok(())
}
