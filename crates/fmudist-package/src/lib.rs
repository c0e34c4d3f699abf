//! Package archive model for the fmudist release pipeline.
//!
//! A package is a zip container with a fixed internal layout:
//!
//! ```text
//! modelDescription.xml        shared metadata (one copy)
//! binaries/<partition>/...    one partition per platform
//! resources/...               shared resources (optional)
//! documentation/...           generated documentation (optional)
//! ```
//!
//! Packages written by platform builds are never modified; merges read them
//! and emit a new archive with [`serialize`].

pub mod archive;
pub mod error;
pub mod integrity;
pub mod layout;
pub mod model_description;

pub use archive::{serialize, Package, PackageEntry};
pub use error::{PackageError, Result};
pub use integrity::ContentHash;
pub use layout::{EntryKind, MODEL_DESCRIPTION};
pub use model_description::{ModelDescription, ModelVariable};
