//! Reading, extracting and deterministically writing package archives.
//!
//! [`serialize`] walks a directory tree in sorted order and writes every
//! entry with a fixed timestamp and fixed permissions, so two runs over the
//! same tree produce byte-identical archives.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::error::{PackageError, Result};
use crate::integrity::ContentHash;
use crate::layout::{EntryKind, MODEL_DESCRIPTION};
use crate::model_description::ModelDescription;

/// One entry of a package archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
    /// Normalized entry name (`/`-separated, no trailing slash).
    pub name: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
    /// Uncompressed size in bytes.
    pub size: u64,
}

impl PackageEntry {
    /// Layout classification of this entry.
    pub fn kind(&self) -> EntryKind {
        EntryKind::classify(&self.name)
    }
}

/// An opened package archive.
///
/// Opening reads the central directory only; entry contents are read on
/// demand. The archive on disk is never modified through this type.
#[derive(Debug, Clone)]
pub struct Package {
    path: PathBuf,
    entries: Vec<PackageEntry>,
}

impl Package {
    /// Open a package and list its entries.
    ///
    /// Fails with [`PackageError::CorruptPackage`] if the file is not a
    /// readable archive or contains an entry whose name escapes the root.
    pub fn open(path: &Path) -> Result<Package> {
        let mut archive = open_archive(path)?;
        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let entry = archive.by_index(i).map_err(|e| corrupt(path, e))?;
            let name = checked_name(path, entry.name(), entry.enclosed_name().is_some())?;
            if name.is_empty() {
                continue;
            }
            entries.push(PackageEntry {
                name,
                is_dir: entry.is_dir(),
                size: entry.size(),
            });
        }
        debug!(target: "fmudist::package", path = %path.display(), entries = entries.len(), "opened package");
        Ok(Package {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Path of the archive on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries in archive order.
    pub fn entries(&self) -> &[PackageEntry] {
        &self.entries
    }

    /// Whether a file entry with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| !e.is_dir && e.name == name)
    }

    /// Check that the metadata file is present.
    pub fn require_layout(&self) -> Result<()> {
        if self.contains(MODEL_DESCRIPTION) {
            Ok(())
        } else {
            Err(PackageError::InvalidLayout {
                path: self.path.clone(),
                missing: MODEL_DESCRIPTION.to_string(),
            })
        }
    }

    /// Read the bytes of a single file entry.
    pub fn read_entry(&self, name: &str) -> Result<Vec<u8>> {
        let mut archive = open_archive(&self.path)?;
        let mut entry = match archive.by_name(name) {
            Ok(entry) => entry,
            Err(zip::result::ZipError::FileNotFound) => {
                return Err(PackageError::EntryNotFound {
                    path: self.path.clone(),
                    name: name.to_string(),
                })
            }
            Err(e) => return Err(corrupt(&self.path, e)),
        };
        let mut data = Vec::with_capacity(read_capacity(entry.size()));
        entry
            .read_to_end(&mut data)
            .map_err(|e| corrupt(&self.path, e))?;
        Ok(data)
    }

    /// Names of the partitions present under `binaries/`.
    pub fn binary_partitions(&self) -> BTreeSet<String> {
        self.entries
            .iter()
            .filter_map(|e| match e.kind() {
                EntryKind::Binary { partition } => Some(partition),
                _ => None,
            })
            .collect()
    }

    /// SHA-256 digests of every shared (non-binary) file entry, keyed by name.
    pub fn shared_digests(&self) -> Result<BTreeMap<String, ContentHash>> {
        let mut archive = open_archive(&self.path)?;
        let mut digests = BTreeMap::new();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).map_err(|e| corrupt(&self.path, e))?;
            if entry.is_dir() {
                continue;
            }
            let name = checked_name(&self.path, entry.name(), entry.enclosed_name().is_some())?;
            if !EntryKind::classify(&name).is_shared() {
                continue;
            }
            let mut data = Vec::with_capacity(read_capacity(entry.size()));
            entry
                .read_to_end(&mut data)
                .map_err(|e| corrupt(&self.path, e))?;
            digests.insert(name, ContentHash::compute(&data));
        }
        Ok(digests)
    }

    /// Parse the package's metadata file.
    pub fn model_description(&self) -> Result<ModelDescription> {
        let bytes = self.read_entry(MODEL_DESCRIPTION)?;
        let text = String::from_utf8(bytes).map_err(|e| PackageError::InvalidMetadata {
            detail: format!("invalid UTF-8: {e}"),
        })?;
        ModelDescription::parse(&text)
    }

    /// Extract every entry into `dir`, preserving directory structure and bytes.
    ///
    /// Existing files are overwritten. Fails with
    /// [`PackageError::InvalidLayout`] if no metadata file exists in `dir`
    /// afterwards.
    pub fn extract_to(&self, dir: &Path) -> Result<()> {
        self.extract_filtered(dir, |_| true)
    }

    /// Extract only the entries accepted by `filter`.
    ///
    /// The metadata check of [`Package::extract_to`] still applies to `dir`.
    pub fn extract_filtered<F>(&self, dir: &Path, filter: F) -> Result<()>
    where
        F: Fn(&PackageEntry) -> bool,
    {
        let mut archive = open_archive(&self.path)?;
        fs::create_dir_all(dir)?;
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).map_err(|e| corrupt(&self.path, e))?;
            let name = checked_name(&self.path, entry.name(), entry.enclosed_name().is_some())?;
            if name.is_empty() {
                continue;
            }
            let listed = PackageEntry {
                name,
                is_dir: entry.is_dir(),
                size: entry.size(),
            };
            if !filter(&listed) {
                continue;
            }
            let target = dir.join(&listed.name);
            if listed.is_dir {
                fs::create_dir_all(&target)?;
                continue;
            }
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&target)?;
            io::copy(&mut entry, &mut out).map_err(|e| corrupt(&self.path, e))?;
        }
        if !dir.join(MODEL_DESCRIPTION).is_file() {
            return Err(PackageError::InvalidLayout {
                path: self.path.clone(),
                missing: MODEL_DESCRIPTION.to_string(),
            });
        }
        Ok(())
    }
}

/// Serialize a directory tree into a package archive at `out`.
///
/// Entries are written depth-first in byte order of their names. The
/// archive is written next to `out` and renamed into place, so a failed
/// write never leaves a partial package behind.
pub fn serialize(dir: &Path, out: &Path) -> Result<Package> {
    let mut tree = Vec::new();
    collect_tree(dir, "", &mut tree)?;

    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut temp_name = out.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = out.with_file_name(temp_name);

    match write_archive(&tree, &temp_path) {
        Ok(()) => {
            fs::rename(&temp_path, out)?;
        }
        Err(e) => {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }
    }

    debug!(target: "fmudist::package", path = %out.display(), entries = tree.len(), "serialized package");
    Package::open(out)
}

/// A file or directory found while walking a tree.
struct TreeEntry {
    name: String,
    source: PathBuf,
    is_dir: bool,
}

fn collect_tree(root: &Path, prefix: &str, out: &mut Vec<TreeEntry>) -> Result<()> {
    let dir = if prefix.is_empty() {
        root.to_path_buf()
    } else {
        root.join(prefix)
    };
    let mut children = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let name = file_name
            .to_str()
            .ok_or_else(|| PackageError::NonUtf8Path { path: entry.path() })?
            .to_string();
        children.push((name, entry.path(), entry.file_type()?.is_dir()));
    }
    children.sort_by(|a, b| a.0.cmp(&b.0));

    for (name, source, is_dir) in children {
        let full = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };
        out.push(TreeEntry {
            name: full.clone(),
            source,
            is_dir,
        });
        if is_dir {
            collect_tree(root, &full, out)?;
        }
    }
    Ok(())
}

fn write_archive(tree: &[TreeEntry], path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = ZipWriter::new(BufWriter::new(file));

    let file_options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644);
    let dir_options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o755);

    for entry in tree {
        if entry.is_dir {
            writer.add_directory(format!("{}/", entry.name), dir_options)?;
        } else {
            writer.start_file(entry.name.clone(), file_options)?;
            let mut source = BufReader::new(File::open(&entry.source)?);
            io::copy(&mut source, &mut writer)?;
        }
    }

    let mut inner = writer.finish()?;
    inner.flush()?;
    Ok(())
}

fn open_archive(path: &Path) -> Result<ZipArchive<BufReader<File>>> {
    let file = File::open(path)?;
    ZipArchive::new(BufReader::new(file)).map_err(|e| corrupt(path, e))
}

/// Largest read buffer reserved up front from an entry's declared size.
const MAX_PREALLOC: usize = 1 << 20;

/// The declared uncompressed size comes from the archive and is untrusted.
fn read_capacity(declared: u64) -> usize {
    usize::try_from(declared).map_or(MAX_PREALLOC, |size| size.min(MAX_PREALLOC))
}

fn corrupt(path: &Path, reason: impl std::fmt::Display) -> PackageError {
    PackageError::CorruptPackage {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Normalize an entry name and reject names that escape the archive root.
fn checked_name(path: &Path, raw: &str, enclosed: bool) -> Result<String> {
    if !enclosed {
        return Err(corrupt(path, format!("entry '{raw}' escapes the package root")));
    }
    let normalized = raw.replace('\\', "/");
    let trimmed = normalized
        .trim_start_matches("./")
        .trim_end_matches('/')
        .to_string();
    Ok(trimmed)
}
