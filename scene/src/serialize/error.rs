//! Error types for document export and import.

use std::fmt;

use crate::error::SceneError;

/// Errors that can occur while exporting.
#[derive(Debug)]
pub enum SerializeError {
    /// A field could not be converted to a document value.
    FieldError { field: String, message: String },
    /// The object, component or scene to export does not exist.
    NotFound(String),
    /// Format encoding error (JSON/RON).
    FormatError(String),
}

impl fmt::Display for SerializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldError { field, message } => {
                write!(f, "failed to serialize field '{field}': {message}")
            }
            Self::NotFound(what) => write!(f, "{what} not found"),
            Self::FormatError(msg) => write!(f, "format error: {msg}"),
        }
    }
}

impl std::error::Error for SerializeError {}

/// Errors that abort an import.
///
/// Problems with individual variables (unknown names, ill-typed values,
/// unresolved references) do not abort; they are collected in the
/// [`ImportReport`](super::ImportReport).
#[derive(Debug)]
pub enum DeserializeError {
    /// A required field was missing from the document.
    MissingField { field: String, context: String },
    /// A field value had an unexpected shape.
    TypeMismatch {
        field: String,
        expected: String,
        found: String,
    },
    /// The world refused an operation the import needed.
    Scene(SceneError),
    /// Format decoding error.
    FormatError(String),
}

impl fmt::Display for DeserializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { field, context } => {
                write!(f, "missing field '{field}' in {context}")
            }
            Self::TypeMismatch {
                field,
                expected,
                found,
            } => {
                write!(
                    f,
                    "type mismatch for field '{field}': expected {expected}, found {found}"
                )
            }
            Self::Scene(err) => write!(f, "{err}"),
            Self::FormatError(msg) => write!(f, "format error: {msg}"),
        }
    }
}

impl std::error::Error for DeserializeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Scene(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SceneError> for DeserializeError {
    fn from(err: SceneError) -> Self {
        Self::Scene(err)
    }
}
