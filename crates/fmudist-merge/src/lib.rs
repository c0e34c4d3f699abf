//! Merge engine for the fmudist release pipeline.
//!
//! For one FMI variant, every package name found in the first declared
//! platform's distribution directory is merged across all platforms that
//! build the variant:
//!
//! 1. open each platform's copy and check that it contributes exactly its
//!    own binary partition;
//! 2. compare the shared (non-binary) content of all copies by digest;
//! 3. extract the first platform's copy into a scratch workspace, then add
//!    only the binary partitions of the others.
//!
//! The workspace is handed back to the caller, which may add documentation
//! before serializing it. Dropping the workspace removes it.

pub mod conflict;
pub mod engine;
pub mod error;
pub mod workspace;

pub use conflict::{verify_shared, SharedDivergence};
pub use engine::{
    list_worklist, merge_package, merge_variant, variant_dir, Contribution, MergeOptions,
    MergeOutcome, MergedPackage,
};
pub use error::{MergeError, Result};
pub use workspace::ScratchWorkspace;
