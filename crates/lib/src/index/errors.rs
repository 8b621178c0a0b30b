//! Error types for shadow index configuration.

use thiserror::Error;

/// Structured error types for the index registry.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// The key pattern is not a valid glob
    #[error("Invalid index pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A configured path does not parse
    #[error("Invalid index path '{path}' for pattern '{pattern}': {reason}")]
    InvalidPath {
        pattern: String,
        path: String,
        reason: String,
    },

    /// A configuration needs at least one path
    #[error("Index pattern '{pattern}' needs at least one path")]
    NoPaths { pattern: String },

    /// No configuration exists for the pattern
    #[error("No index configured for pattern '{pattern}'")]
    NotConfigured { pattern: String },
}

impl IndexError {
    /// Check if this error refers to a pattern that was never configured
    pub fn is_not_found(&self) -> bool {
        matches!(self, IndexError::NotConfigured { .. })
    }

    /// Check if this error was caused by invalid configuration input
    pub fn is_invalid_config(&self) -> bool {
        matches!(
            self,
            IndexError::InvalidPattern { .. }
                | IndexError::InvalidPath { .. }
                | IndexError::NoPaths { .. }
        )
    }
}

impl From<IndexError> for crate::Error {
    fn from(err: IndexError) -> Self {
        crate::Error::Index(err)
    }
}
