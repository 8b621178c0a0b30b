//! Error types for CRDT operations.
//!
//! Covers structural failures found while resolving a path against the
//! document tree (missing nodes, wrong variants, list bounds) and operations
//! that cannot be applied to the object they target.

use thiserror::Error;

/// Structured error types for CRDT operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CRDTError {
    /// A node exists at the path but has a different variant than the operation needs
    #[error("Type mismatch at '{path}': expected {expected}, found {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// The path does not reach an existing node
    #[error("No node at path '{path}'")]
    NotFound { path: String },

    /// A list index past the end of the list
    #[error("Index {index} out of bounds at '{path}' (length {len})")]
    IndexOutOfBounds {
        path: String,
        index: usize,
        len: usize,
    },

    /// An operation names an object the op set does not contain
    #[error("Unknown object {obj}")]
    MissingObject { obj: String },

    /// An operation references a sequence element the object does not contain
    #[error("Unknown element {elem} in object {obj}")]
    MissingElement { obj: String, elem: String },

    /// An operation's action is not valid for the object it targets
    #[error("Invalid operation: {reason}")]
    InvalidOperation { reason: String },

    /// Text that does not parse as an actor id
    #[error("Invalid actor id '{value}'")]
    InvalidActorId { value: String },
}

impl CRDTError {
    /// Check if this error is related to type mismatches
    pub fn is_type_error(&self) -> bool {
        matches!(self, CRDTError::TypeMismatch { .. })
    }

    /// Check if this error reports an absent node
    pub fn is_not_found_error(&self) -> bool {
        matches!(self, CRDTError::NotFound { .. })
    }

    /// Check if this error reports a list index past the end
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, CRDTError::IndexOutOfBounds { .. })
    }

    /// Check if this error comes from an operation that does not fit the op set
    pub fn is_invalid_operation(&self) -> bool {
        matches!(
            self,
            CRDTError::MissingObject { .. }
                | CRDTError::MissingElement { .. }
                | CRDTError::InvalidOperation { .. }
        )
    }
}

impl From<CRDTError> for crate::Error {
    fn from(err: CRDTError) -> Self {
        crate::Error::CRDT(err)
    }
}
