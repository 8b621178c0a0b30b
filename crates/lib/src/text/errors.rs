//! Error types for text editing.

use thiserror::Error;

/// Structured error types for splices and diff replay.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TextError {
    /// The splice start lies past the end of the text
    #[error("Splice position {pos} is past the end of the text (length {len})")]
    PositionOutOfRange { pos: usize, len: usize },

    /// The splice would delete past the end of the text
    #[error("Cannot delete {del} characters at {pos} from text of length {len}")]
    DeleteOutOfRange { pos: usize, del: usize, len: usize },

    /// A line of the diff could not be parsed
    #[error("Malformed diff at line {line}: {reason}")]
    MalformedDiff { line: usize, reason: String },

    /// A hunk's old lines do not match the current text
    #[error("Diff hunk {hunk} does not apply: {reason}")]
    HunkMismatch { hunk: usize, reason: String },
}

impl TextError {
    /// Check if this error comes from an unparsable or stale diff
    pub fn is_malformed_diff(&self) -> bool {
        matches!(
            self,
            TextError::MalformedDiff { .. } | TextError::HunkMismatch { .. }
        )
    }

    /// Check if this error is a splice outside the text bounds
    pub fn is_out_of_range(&self) -> bool {
        matches!(
            self,
            TextError::PositionOutOfRange { .. } | TextError::DeleteOutOfRange { .. }
        )
    }
}

impl From<TextError> for crate::Error {
    fn from(err: TextError) -> Self {
        crate::Error::Text(err)
    }
}
