//! Error types for the persistence codec.

use thiserror::Error;

/// Structured error types for saving and loading documents.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CodecError {
    /// The blob is shorter than its header or declared body
    #[error("Truncated blob: {len} bytes, need at least {needed}")]
    Truncated { len: usize, needed: usize },

    /// The blob does not start with the document marker
    #[error("Not a document blob: bad magic prefix")]
    BadMagic,

    /// The blob was written by an unknown format version
    #[error("Unsupported blob version {found}; only version {supported} is supported")]
    UnsupportedVersion { found: u8, supported: u8 },

    /// The declared body length disagrees with the bytes present
    #[error("Blob body length mismatch: header says {declared}, found {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    /// The body does not hash to the stored checksum
    #[error("Blob checksum mismatch")]
    ChecksumMismatch,

    /// The body could not be decoded
    #[error("Failed to decode blob body: {reason}")]
    DecodeFailed { reason: String },

    /// The document could not be encoded
    #[error("Failed to encode document: {reason}")]
    EncodeFailed { reason: String },

    /// A stored change could not be replayed
    #[error("Failed to replay stored change {index}: {reason}")]
    ReplayFailed { index: usize, reason: String },

    /// The body exceeds what the length field can describe
    #[error("Document body of {len} bytes is too large to save")]
    TooLarge { len: usize },
}

impl CodecError {
    /// Check if this error means the blob failed validation on load
    pub fn is_corrupt(&self) -> bool {
        !matches!(
            self,
            CodecError::EncodeFailed { .. } | CodecError::TooLarge { .. }
        )
    }
}

impl From<CodecError> for crate::Error {
    fn from(err: CodecError) -> Self {
        crate::Error::Codec(err)
    }
}
