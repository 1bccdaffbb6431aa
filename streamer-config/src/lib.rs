//! Validation and normalization of streaming job configurations.
//!
//! A job is described by two untyped JSON documents, the input
//! configuration and the pipeline configuration. [`validate`] checks both
//! against a fixed schema table and either returns a fully defaulted
//! [`NormalizedConfig`] or the first [`ValidationError`] it finds.

pub(crate) mod error;
pub(crate) mod normalize;
pub(crate) mod schema;
pub(crate) mod timecode;
pub(crate) mod types;
pub(crate) mod validate;


pub use error::{ErrorType, Result, ValidationError};
pub use schema::{FieldKind, FieldSpec, ObjectKind, Requirement};
pub use timecode::parse_time;
pub use types::*;
pub use validate::{validate, validate_request};
