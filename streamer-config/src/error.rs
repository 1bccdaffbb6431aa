use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Category of a configuration failure.
///
/// This list is exhaustive: every detectable misconfiguration maps onto
/// exactly one of these four variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    /// A key that is not part of the schema for its object
    UnrecognizedField,

    /// A field that is required in this context is absent
    MissingRequiredField,

    /// A field has the wrong JSON type or a value outside its domain
    WrongType,

    /// A field is well-typed but invalid in context
    MalformedField,
}

impl ErrorType {
    /// Wire name of the error type
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorType::UnrecognizedField => "UnrecognizedField",
            ErrorType::MissingRequiredField => "MissingRequiredField",
            ErrorType::WrongType => "WrongType",
            ErrorType::MalformedField => "MalformedField",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured configuration error.
///
/// Serializes to exactly `{"error_type": ..., "field_name": ...}`. The full
/// location of the field (`inputs[0].frame_rate`) is kept for diagnostics
/// but never put on the wire.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{error_type}: field {field_name:?} at {location}")]
pub struct ValidationError {
    pub error_type: ErrorType,
    pub field_name: String,
    #[serde(skip)]
    pub location: String,
}

impl ValidationError {
    pub fn new(
        error_type: ErrorType,
        field_name: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            error_type,
            field_name: field_name.into(),
            location: location.into(),
        }
    }

    /// Error for `field` inside the object at `parent`. An empty parent is
    /// the document root.
    ///
    /// The field name is kept exactly as given, even when it contains path
    /// separators of its own.
    pub fn at(error_type: ErrorType, parent: &str, field: &str) -> Self {
        let location = if parent.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", parent, field)
        };
        Self::new(error_type, field, location)
    }

    pub fn unrecognized(parent: &str, field: &str) -> Self {
        Self::at(ErrorType::UnrecognizedField, parent, field)
    }

    pub fn missing(parent: &str, field: &str) -> Self {
        Self::at(ErrorType::MissingRequiredField, parent, field)
    }

    pub fn wrong_type(parent: &str, field: &str) -> Self {
        Self::at(ErrorType::WrongType, parent, field)
    }

    pub fn malformed(parent: &str, field: &str) -> Self {
        Self::at(ErrorType::MalformedField, parent, field)
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ValidationError>;
