//! Error types for the JSON bridge.

use thiserror::Error;

/// Structured error types for JSON export and import.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum JsonError {
    /// The input is not valid JSON
    #[error("Invalid JSON: {reason}")]
    Parse { reason: String },

    /// Documents can only be imported from a JSON object
    #[error("JSON root must be an object, found {found}")]
    RootNotObject { found: String },

    /// The document could not be rendered as JSON text
    #[error("Failed to render JSON: {reason}")]
    Render { reason: String },
}

impl JsonError {
    /// Check if the input had the wrong top-level shape
    pub fn is_type_error(&self) -> bool {
        matches!(self, JsonError::RootNotObject { .. })
    }

    /// Check if the input could not be parsed
    pub fn is_parse_error(&self) -> bool {
        matches!(self, JsonError::Parse { .. })
    }
}

impl From<JsonError> for crate::Error {
    fn from(err: JsonError) -> Self {
        crate::Error::Json(err)
    }
}
