//! Error types for change records and synchronization.

use thiserror::Error;

/// Structured error types for encoding, decoding and merging change records.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ChangeError {
    /// The bytes do not start with the change record marker
    #[error("Not a change record: bad magic prefix")]
    InvalidMagic,

    /// The record body could not be decoded
    #[error("Failed to decode change record: {reason}")]
    DecodeFailed { reason: String },

    /// The record body could not be encoded
    #[error("Failed to encode change record: {reason}")]
    EncodeFailed { reason: String },

    /// Text that does not parse as a change hash
    #[error("Invalid change hash '{value}'")]
    InvalidHash { value: String },

    /// The record depends on changes this document has not seen
    #[error("Change {hash} is missing {missing} dependencies")]
    MissingDependencies { hash: String, missing: usize },

    /// The record's sequence number does not follow its actor's last change
    #[error("Change {hash} from actor {actor} has seq {found}, expected {expected}")]
    OutOfOrder {
        hash: String,
        actor: String,
        expected: u64,
        found: u64,
    },

    /// A hash the caller claims to have is unknown to this document
    #[error("Unknown change {hash}")]
    UnknownChange { hash: String },

    /// An operation inside the record does not fit the document
    #[error("Change {hash} contains an invalid operation: {reason}")]
    InvalidOperation { hash: String, reason: String },
}

impl ChangeError {
    /// Check if the record was rejected for unmet causal dependencies
    pub fn is_missing_dependency(&self) -> bool {
        matches!(
            self,
            ChangeError::MissingDependencies { .. } | ChangeError::OutOfOrder { .. }
        )
    }

    /// Check if the bytes were not a well-formed record
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            ChangeError::InvalidMagic | ChangeError::DecodeFailed { .. }
        )
    }

    /// Check if a referenced change is unknown
    pub fn is_unknown_change(&self) -> bool {
        matches!(self, ChangeError::UnknownChange { .. })
    }
}

impl From<ChangeError> for crate::Error {
    fn from(err: ChangeError) -> Self {
        crate::Error::Change(err)
    }
}
