//! Release pipeline orchestration.
//!
//! Platform builds are recorded in a per-platform ledger. A release checks
//! that ledger before merging a variant, then for each merged package
//! regenerates its reference (when the unit has run parameters), renders
//! its documentation, stamps provenance and emits the final archive.
//!
//! ```text
//! build_platform ──> build-record.json ──> check_barrier
//!                                              │
//!            merge_variant ─> regenerate ─> render_docs ─> stamp ─> emit
//! ```

pub mod build;
pub mod check;
pub mod config;
pub mod error;
pub mod ledger;
pub mod release;
pub mod report;

pub use build::{build_platform, BuildAttempt, PlatformBuildReport};
pub use check::{regenerate_unit, validate_references, CheckOutcome, UnitCheck};
pub use config::{default_simulator, PipelineConfig, DEFAULT_TOOL_NAME};
pub use error::{PipelineError, Result};
pub use ledger::{check_barrier, BuildLedger, BuildRecord, BuildStatus, LEDGER_FILE};
pub use release::release;
pub use report::{
    BarrierRejection, PackageFailure, RegenerationFailure, ReleaseReport, ReleasedPackage,
};
