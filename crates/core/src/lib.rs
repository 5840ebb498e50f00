//! formc-core: compiles a schema bundle and its presentation into a
//! renderable form.
//!
//! The pipeline runs in three stages:
//!
//! 1. check that the presentation targets the bundle;
//! 2. resolve every reference, transitively, against the loaded
//!    dependency bundles ([`resolve_dependencies()`]);
//! 3. walk the presentation pages in order, mapping each attribute to a
//!    field descriptor ([`build_field()`]) while collecting locale strings
//!    and list identifier metadata.
//!
//! # Public API
//!
//! - [`compile()`] / [`compile_json()`] -- run the whole pipeline
//! - [`CompiledForm`] -- form IR, locale dictionaries, metadata tree
//! - [`CompileError`] -- every fatal condition
//! - [`Path`] -- dotted attribute paths
//! - [`FieldDescriptor`] and the other IR node types

pub mod compile;
pub mod dates;
pub mod descriptor;
pub mod error;
pub mod locale;
pub mod mapper;
pub mod meta;
pub mod path;
pub mod props;
pub mod resolve;
pub mod walk;

// ── Convenience re-exports ──────────────────────────────────────────

pub use compile::{compile, compile_json, CompileOptions, CompileRequest, CompiledForm};
pub use descriptor::*;
pub use error::CompileError;
pub use locale::{I18n, Locale, LocaleText};
pub use mapper::build_field;
pub use meta::{ListIdentifier, MetadataTree};
pub use path::Path;
pub use props::PresentationProps;
pub use resolve::{resolve_dependencies, BundleRegistry, DependencyMap};
pub use walk::Conditionals;
