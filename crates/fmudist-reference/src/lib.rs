//! Reference result regeneration and validation.
//!
//! A unit with declared [`RunParameters`] is simulated through the external
//! simulator. On a zero exit the captured table replaces the unit's stored
//! reference and a plot is rendered from it; on any failure the stored
//! reference is left as it was. [`validate`] compares a fresh result with a
//! stored reference and never writes anything.

pub mod error;
pub mod plot;
pub mod regenerate;
pub mod result;
pub mod run_parameters;
pub mod validate;

pub use error::{ReferenceError, Result};
pub use plot::render_svg;
pub use regenerate::{regenerate, simulate, RegenerateRequest, Regenerated};
pub use result::ResultTable;
pub use run_parameters::{RunParameters, SimulatorConfig};
pub use validate::{validate, SignalCheck, ValidationReport, DEFAULT_TOLERANCE};
