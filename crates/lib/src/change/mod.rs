//! Change records: the unit of history and synchronization.
//!
//! Each successful mutation of a [`Document`](crate::Document) produces exactly
//! one [`Change`]. A change names its author, its position in that author's
//! stream (`seq`), the first op counter it uses, and the hashes of the changes
//! that were the document's heads when it was made. Its identity is the SHA-256
//! of its encoded bytes, so the same record has the same [`ChangeHash`] on
//! every replica.
//!
//! The encoded form is the `KVCH` marker followed by a postcard body.

mod errors;
pub(crate) mod history;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub use errors::ChangeError;

use crate::{
    constants::CHANGE_MAGIC,
    crdt::{ActorId, OpId, op::Op},
};

/// Content hash of an encoded change record.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChangeHash([u8; 32]);

impl ChangeHash {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    fn of(bytes: &[u8]) -> Self {
        Self(Sha256::digest(bytes).into())
    }
}

impl fmt::Display for ChangeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ChangeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChangeHash({self})")
    }
}

impl FromStr for ChangeHash {
    type Err = ChangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| ChangeError::InvalidHash {
            value: s.to_string(),
        })?;
        Ok(Self(bytes))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ChangeBody {
    pub actor: ActorId,
    pub seq: u64,
    pub start_op: u64,
    pub time: i64,
    pub deps: Vec<ChangeHash>,
    pub ops: Vec<Op>,
}

/// One encoded, content-addressed change record.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    body: ChangeBody,
    hash: ChangeHash,
    bytes: Vec<u8>,
}

impl Change {
    pub(crate) fn new(body: ChangeBody) -> Result<Self, ChangeError> {
        let encoded = postcard::to_allocvec(&body).map_err(|e| ChangeError::EncodeFailed {
            reason: e.to_string(),
        })?;
        let mut bytes = Vec::with_capacity(CHANGE_MAGIC.len() + encoded.len());
        bytes.extend_from_slice(CHANGE_MAGIC);
        bytes.extend_from_slice(&encoded);
        Ok(Self {
            hash: ChangeHash::of(&bytes),
            body,
            bytes,
        })
    }

    /// Decode a record received from another replica or read from storage.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, ChangeError> {
        let bytes = bytes.into();
        let encoded = bytes
            .strip_prefix(CHANGE_MAGIC.as_slice())
            .ok_or(ChangeError::InvalidMagic)?;
        let (body, rest) = postcard::take_from_bytes::<ChangeBody>(encoded).map_err(|e| {
            ChangeError::DecodeFailed {
                reason: e.to_string(),
            }
        })?;
        if !rest.is_empty() {
            return Err(ChangeError::DecodeFailed {
                reason: format!("{} trailing bytes", rest.len()),
            });
        }
        // Op ids run from start_op to start_op + len - 1 and never reach u64::MAX.
        if body.start_op == 0
            || body
                .start_op
                .checked_add(body.ops.len() as u64)
                .is_none()
        {
            return Err(ChangeError::DecodeFailed {
                reason: format!(
                    "op counters starting at {} do not fit {} ops",
                    body.start_op,
                    body.ops.len()
                ),
            });
        }
        Ok(Self {
            hash: ChangeHash::of(&bytes),
            body,
            bytes,
        })
    }

    pub fn hash(&self) -> ChangeHash {
        self.hash
    }

    /// The encoded record, suitable for publishing or storage.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn actor(&self) -> ActorId {
        self.body.actor
    }

    /// Position of this change in its actor's stream, starting at 1.
    pub fn seq(&self) -> u64 {
        self.body.seq
    }

    pub fn start_op(&self) -> u64 {
        self.body.start_op
    }

    /// Commit time in milliseconds since Unix epoch, as reported by the author's clock.
    pub fn time(&self) -> i64 {
        self.body.time
    }

    pub fn deps(&self) -> &[ChangeHash] {
        &self.body.deps
    }

    /// Number of operations in the change.
    pub fn len(&self) -> usize {
        self.body.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.ops.is_empty()
    }

    /// Operations with the ids they were assigned.
    pub(crate) fn ops(&self) -> impl Iterator<Item = (OpId, &Op)> {
        let actor = self.body.actor;
        let start = self.body.start_op;
        self.body
            .ops
            .iter()
            .enumerate()
            .map(move |(i, op)| (OpId::new(start + i as u64, actor), op))
    }
}
