//! Error types for path parsing.

use thiserror::Error;

/// Path expression could not be parsed, or cannot be used for the requested operation.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    /// An `[` was opened but never closed
    #[error("Malformed path '{path}': unclosed '[' at offset {offset}")]
    UnclosedBracket { path: String, offset: usize },

    /// A `]` appeared without a matching `[`
    #[error("Malformed path '{path}': unexpected ']' at offset {offset}")]
    UnexpectedBracket { path: String, offset: usize },

    /// The text between brackets is not a non-negative integer
    #[error("Malformed path '{path}': invalid index '{index}'")]
    InvalidIndex { path: String, index: String },

    /// A key started directly after a closing bracket without a `.`
    #[error("Malformed path '{path}': expected '.' or '[' at offset {offset}")]
    MissingSeparator { path: String, offset: usize },

    /// Writes need at least one segment to name the target
    #[error("Path '{path}' does not name a writable node")]
    EmptyPath { path: String },
}

impl PathError {
    /// Check if this error was produced by the parser rather than by a write check.
    pub fn is_syntax_error(&self) -> bool {
        !matches!(self, PathError::EmptyPath { .. })
    }

    /// The path text the error refers to.
    pub fn path(&self) -> &str {
        match self {
            PathError::UnclosedBracket { path, .. }
            | PathError::UnexpectedBracket { path, .. }
            | PathError::InvalidIndex { path, .. }
            | PathError::MissingSeparator { path, .. }
            | PathError::EmptyPath { path } => path,
        }
    }
}

impl From<PathError> for crate::Error {
    fn from(err: PathError) -> Self {
        crate::Error::Path(err)
    }
}
