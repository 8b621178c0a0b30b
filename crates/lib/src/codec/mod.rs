//! Persistence codec: whole-document snapshots.
//!
//! A saved document is a framed blob:
//!
//! ```text
//! "KVDOC" | version: u8 | body length: u32 LE | sha256(body): 32 bytes | body
//! ```
//!
//! The body is the postcard encoding of every change record in application
//! order. Loading validates the frame, then replays each record through the
//! normal merge path, so a loaded document has the full history and keeps
//! syncing with its peers. Actor identity is not stored: a loaded document
//! writes under a fresh actor, and saving it again yields the same bytes.

mod errors;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub use errors::CodecError;

use crate::{
    Change, Document, Result,
    constants::{BLOB_MAGIC, BLOB_VERSION},
};

const HEADER_LEN: usize = BLOB_MAGIC.len() + 1 + 4 + 32;

#[derive(Serialize, Deserialize)]
struct Body {
    changes: Vec<Vec<u8>>,
}

impl Document {
    /// Encode the document and its full history.
    pub fn save(&self) -> Result<Vec<u8>> {
        let body = Body {
            changes: self
                .history
                .iter()
                .map(|change| change.bytes().to_vec())
                .collect(),
        };
        let body = postcard::to_allocvec(&body).map_err(|e| CodecError::EncodeFailed {
            reason: e.to_string(),
        })?;
        let len = u32::try_from(body.len()).map_err(|_| CodecError::TooLarge { len: body.len() })?;

        let mut blob = Vec::with_capacity(HEADER_LEN + body.len());
        blob.extend_from_slice(BLOB_MAGIC);
        blob.push(BLOB_VERSION);
        blob.extend_from_slice(&len.to_le_bytes());
        blob.extend_from_slice(&Sha256::digest(&body));
        blob.extend_from_slice(&body);
        Ok(blob)
    }

    /// Rebuild a document from a blob produced by [`save`](Document::save).
    ///
    /// Any validation or replay failure returns an error and no document.
    pub fn load(blob: &[u8]) -> Result<Document> {
        let body = open_frame(blob)?;
        let (decoded, rest) = postcard::take_from_bytes::<Body>(body).map_err(|e| {
            CodecError::DecodeFailed {
                reason: e.to_string(),
            }
        })?;
        if !rest.is_empty() {
            return Err(CodecError::DecodeFailed {
                reason: format!("{} trailing bytes", rest.len()),
            }
            .into());
        }

        let mut document = Document::new();
        for (index, bytes) in decoded.changes.into_iter().enumerate() {
            let replayed = Change::from_bytes(bytes)
                .map_err(crate::Error::from)
                .and_then(|change| document.apply_change(change));
            match replayed {
                Ok(true) => {}
                Ok(false) => {
                    return Err(CodecError::ReplayFailed {
                        index,
                        reason: "duplicate change".to_string(),
                    }
                    .into());
                }
                Err(err) => {
                    return Err(CodecError::ReplayFailed {
                        index,
                        reason: err.to_string(),
                    }
                    .into());
                }
            }
        }
        tracing::info!(
            changes = document.num_changes(),
            actor = %document.actor(),
            "loaded document"
        );
        Ok(document)
    }
}

/// Validate the frame and return the body.
fn open_frame(blob: &[u8]) -> std::result::Result<&[u8], CodecError> {
    if blob.len() < HEADER_LEN {
        if !blob.is_empty() && !BLOB_MAGIC.starts_with(&blob[..blob.len().min(BLOB_MAGIC.len())]) {
            return Err(CodecError::BadMagic);
        }
        return Err(CodecError::Truncated {
            len: blob.len(),
            needed: HEADER_LEN,
        });
    }
    let (magic, rest) = blob.split_at(BLOB_MAGIC.len());
    if magic != BLOB_MAGIC {
        return Err(CodecError::BadMagic);
    }
    let (version, rest) = rest.split_at(1);
    if version[0] != BLOB_VERSION {
        return Err(CodecError::UnsupportedVersion {
            found: version[0],
            supported: BLOB_VERSION,
        });
    }
    let (len, rest) = rest.split_at(4);
    let declared = u32::from_le_bytes([len[0], len[1], len[2], len[3]]) as usize;
    let (checksum, body) = rest.split_at(32);
    if body.len() != declared {
        return Err(CodecError::LengthMismatch {
            declared,
            actual: body.len(),
        });
    }
    if Sha256::digest(body).as_slice() != checksum {
        return Err(CodecError::ChecksumMismatch);
    }
    Ok(body)
}
