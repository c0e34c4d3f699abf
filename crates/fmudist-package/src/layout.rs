//! Canonical internal layout of a package.

/// The shared metadata file at the package root.
pub const MODEL_DESCRIPTION: &str = "modelDescription.xml";

/// Root of the per-platform binary subtree.
pub const BINARIES_DIR: &str = "binaries";

/// Root of the shared resource subtree.
pub const RESOURCES_DIR: &str = "resources";

/// Root of the generated documentation subtree.
pub const DOCUMENTATION_DIR: &str = "documentation";

/// Classification of an archive entry by its position in the layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// The metadata file.
    Metadata,
    /// The `binaries/` directory itself.
    BinaryRoot,
    /// Anything under `binaries/<partition>/`.
    Binary { partition: String },
    /// Anything under `resources/`.
    Resource,
    /// Anything under `documentation/`.
    Documentation,
    /// Any other shared file (sources, icons, ...).
    Other,
}

impl EntryKind {
    /// Classify a normalized (`/`-separated, no trailing slash) entry name.
    pub fn classify(name: &str) -> EntryKind {
        if name == MODEL_DESCRIPTION {
            return EntryKind::Metadata;
        }
        let mut parts = name.splitn(3, '/');
        match (parts.next(), parts.next()) {
            (Some(BINARIES_DIR), None) => EntryKind::BinaryRoot,
            (Some(BINARIES_DIR), Some(partition)) => EntryKind::Binary {
                partition: partition.to_string(),
            },
            (Some(RESOURCES_DIR), _) => EntryKind::Resource,
            (Some(DOCUMENTATION_DIR), _) => EntryKind::Documentation,
            _ => EntryKind::Other,
        }
    }

    /// Whether the entry belongs to content that must be identical across platforms.
    pub fn is_shared(&self) -> bool {
        !matches!(self, EntryKind::BinaryRoot | EntryKind::Binary { .. })
    }
}
