//! Documentation rendering and provenance stamping.
//!
//! [`render_docs`] turns a unit's `readme.md` plus facts from its
//! model description into `documentation/index.html`. [`stamp_provenance`]
//! replaces the development placeholder of the generation tool attribute
//! with a release identity, and only for a clean working tree.

pub mod error;
pub mod provenance;
pub mod render;
pub mod template;

pub use error::{DocsError, Result};
pub use provenance::{stamp_provenance, stamp_text, ProvenanceStamp, StampOutcome};
pub use render::{render_docs, DocTree, DocsInput};
pub use template::{Template, TemplateValues};
