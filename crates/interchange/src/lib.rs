//! formc-interchange: typed input documents for the form compiler.
//!
//! Two documents feed the compiler:
//!
//! - schema bundles (the attribute graph, one document per digest), parsed
//!   by [`bundle_from_json()`] into a [`SchemaBundle`];
//! - the presentation document (pages, interaction hints, page titles),
//!   parsed by [`presentation_from_json()`] into a [`Presentation`].
//!
//! Both are read-only models. Nothing in this crate interprets widget
//! hints or resolves references; that is the compiler's job.

pub mod deserialize;
pub mod presentation;
pub mod types;

pub use deserialize::{bundle_from_json, presentation_from_json, InterchangeError};
pub use presentation::*;
pub use types::*;
