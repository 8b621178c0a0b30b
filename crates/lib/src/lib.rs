//!
//! kvdoc: a mergeable JSON-like document value for key-value servers.
//!
//! A [`Document`] is a tree of maps, lists, text and scalar leaves that any
//! number of replicas can edit independently and later merge without conflicts.
//!
//! ## Core Concepts
//!
//! * **Paths (`path::Path`)**: Dotted expressions such as `$.address.city` or `tags[0]` that address a node.
//! * **CRDT engine (`crdt`)**: Op-based replicated maps, lists, text sequences, counters and LWW scalars.
//! * **Changes (`change::Change`)**: Content-addressed, self-describing records of one local transaction.
//!   They form a causal graph whose frontier is the document's *heads*.
//! * **Text editing (`text`)**: Splices by Unicode scalar offset and replay of unified diffs.
//! * **Persistence (`codec`)**: A checksummed snapshot blob that reloads to an equivalent document.
//! * **JSON bridge (`json`)**: Export to and import from plain JSON text.
//! * **Shadow indexing (`index`)**: Flat projections of selected paths for secondary search indexes.
//! * **Commands (`commands`)**: The `AM.*` command family a key-value host exposes to clients.

pub mod change;
pub mod clock;
pub mod codec;
pub mod commands;
pub mod constants;
pub mod crdt;
pub mod document;
pub mod index;
pub mod json;
pub mod path;
pub mod text;

pub use change::{Change, ChangeHash};
pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "testing"))]
pub use clock::FixedClock;
pub use crdt::{ActorId, NodeKind, ScalarValue};
pub use document::{ApplyReport, Document, NodeValue};
pub use path::Path;

/// Result type used throughout the kvdoc library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the kvdoc library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structured path syntax errors from the path module
    #[error(transparent)]
    Path(path::PathError),

    /// Structured CRDT errors from the crdt module
    #[error(transparent)]
    CRDT(crdt::CRDTError),

    /// Structured change and sync errors from the change module
    #[error(transparent)]
    Change(change::ChangeError),

    /// Structured text editing errors from the text module
    #[error(transparent)]
    Text(text::TextError),

    /// Structured persistence errors from the codec module
    #[error(transparent)]
    Codec(codec::CodecError),

    /// Structured JSON bridge errors from the json module
    #[error(transparent)]
    Json(json::JsonError),

    /// Structured index configuration errors from the index module
    #[error(transparent)]
    Index(index::IndexError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Path(_) => "path",
            Error::CRDT(_) => "crdt",
            Error::Change(_) => "change",
            Error::Text(_) => "text",
            Error::Codec(_) => "codec",
            Error::Json(_) => "json",
            Error::Index(_) => "index",
        }
    }

    /// Check if this error indicates a node, change or index was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::CRDT(crdt_err) => crdt_err.is_not_found_error(),
            Error::Change(change_err) => change_err.is_unknown_change(),
            Error::Index(index_err) => index_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error is a type mismatch between a path and the node it reached.
    pub fn is_type_error(&self) -> bool {
        match self {
            Error::CRDT(crdt_err) => crdt_err.is_type_error(),
            Error::Json(json_err) => json_err.is_type_error(),
            _ => false,
        }
    }

    /// Check if this error is caused by unparsable path syntax.
    pub fn is_malformed_path(&self) -> bool {
        matches!(self, Error::Path(_))
    }

    /// Check if this error is caused by a unified diff that cannot be applied.
    pub fn is_malformed_diff(&self) -> bool {
        match self {
            Error::Text(text_err) => text_err.is_malformed_diff(),
            _ => false,
        }
    }

    /// Check if this error reports a position or index outside the addressed node.
    pub fn is_out_of_range(&self) -> bool {
        match self {
            Error::CRDT(crdt_err) => crdt_err.is_out_of_range(),
            Error::Text(text_err) => text_err.is_out_of_range(),
            _ => false,
        }
    }

    /// Check if this error reports a change whose dependencies are not present.
    pub fn is_missing_dependency(&self) -> bool {
        match self {
            Error::Change(change_err) => change_err.is_missing_dependency(),
            _ => false,
        }
    }

    /// Check if this error reports a snapshot blob that failed validation.
    pub fn is_corrupt_blob(&self) -> bool {
        match self {
            Error::Codec(codec_err) => codec_err.is_corrupt(),
            _ => false,
        }
    }
}
