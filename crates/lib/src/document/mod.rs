//! The document engine.
//!
//! A [`Document`] owns the materialized CRDT state of one stored key, the
//! history of every change applied to it, and the actor identity its own
//! edits are attributed to. Typed reads and writes live in the `ops` module,
//! text editing in [`crate::text`], persistence in [`crate::codec`] and the
//! JSON bridge in [`crate::json`]; all of them go through the types here.
//!
//! Every successful mutation produces exactly one [`Change`]. Merging foreign
//! changes is done with [`Document::apply`]: each record is checked against
//! the local history and applied atomically, or rejected without effect.

mod ops;
pub(crate) mod transaction;

use std::sync::Arc;

use crate::{
    Result,
    change::{Change, ChangeError, ChangeHash, history::History},
    clock::{Clock, SystemClock},
    crdt::{ActorId, NodeKind, OpSet, ScalarValue},
};

pub(crate) use transaction::Transaction;

/// A replicated JSON-like document.
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) actor: ActorId,
    pub(crate) ops: OpSet,
    pub(crate) history: History,
    clock: Arc<dyn Clock>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of the node at a path.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    Map { len: usize },
    List { len: usize },
    Text(String),
    Scalar(ScalarValue),
}

impl NodeValue {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeValue::Map { .. } => NodeKind::Map,
            NodeValue::List { .. } => NodeKind::List,
            NodeValue::Text(_) => NodeKind::Text,
            NodeValue::Scalar(value) => value.kind(),
        }
    }

    /// Leaves are text and scalars; maps and lists are not.
    pub fn is_leaf(&self) -> bool {
        !self.kind().is_container()
    }
}

/// Outcome of merging a batch of foreign change records.
#[derive(Debug, Default)]
pub struct ApplyReport {
    /// Hashes of the records merged by this call, in order.
    pub applied: Vec<ChangeHash>,
    /// Records that were already part of the history.
    pub duplicates: usize,
    /// Records that were refused, by position in the batch.
    pub rejected: Vec<(usize, crate::Error)>,
}

impl ApplyReport {
    /// Whether every record was merged or already known.
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }
}

impl Document {
    /// An empty document with a random actor.
    pub fn new() -> Self {
        Self::with_actor(ActorId::random())
    }

    /// An empty document whose edits are attributed to `actor`.
    ///
    /// Two documents must never share an actor while both are being edited.
    pub fn with_actor(actor: ActorId) -> Self {
        Self {
            actor,
            ops: OpSet::new(),
            history: History::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Use `clock` to timestamp future changes.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn actor(&self) -> ActorId {
        self.actor
    }

    /// Number of changes in the history.
    pub fn num_changes(&self) -> usize {
        self.history.len()
    }

    /// Hashes of the changes no other change depends on.
    pub fn heads(&self) -> Vec<ChangeHash> {
        self.history.heads()
    }

    pub fn get_change(&self, hash: &ChangeHash) -> Option<&Change> {
        self.history.get(hash)
    }

    /// Changes the holder of `have` has not seen, in causal order.
    ///
    /// `have` is a set of hashes the caller already holds (typically the heads
    /// it last synced to); an empty slice returns the whole history.
    pub fn changes(&self, have: &[ChangeHash]) -> Result<Vec<&Change>> {
        Ok(self.history.since(have)?)
    }

    /// Every change in application order.
    pub fn all_changes(&self) -> impl Iterator<Item = &Change> {
        self.history.iter()
    }

    /// Merge a single foreign change.
    ///
    /// Returns `Ok(false)` when the change is already in the history. A change
    /// with unmet dependencies, a gap in its actor's sequence, or an op that
    /// does not fit the document is rejected and leaves the document unchanged.
    pub fn apply_change(&mut self, change: Change) -> Result<bool> {
        let hash = change.hash();
        if self.history.contains(&hash) {
            return Ok(false);
        }
        let missing = self.history.missing_deps(&change);
        if !missing.is_empty() {
            return Err(ChangeError::MissingDependencies {
                hash: hash.to_string(),
                missing: missing.len(),
            }
            .into());
        }
        let expected = self.history.last_seq(&change.actor()) + 1;
        if change.seq() != expected {
            return Err(ChangeError::OutOfOrder {
                hash: hash.to_string(),
                actor: change.actor().to_string(),
                expected,
                found: change.seq(),
            }
            .into());
        }

        let mut staged = self.ops.clone();
        for (id, op) in change.ops() {
            staged
                .apply_op(id, op)
                .map_err(|err| ChangeError::InvalidOperation {
                    hash: hash.to_string(),
                    reason: err.to_string(),
                })?;
        }
        self.ops = staged;
        self.history.push(change);
        Ok(true)
    }

    /// Merge a batch of foreign changes in order.
    ///
    /// A record may depend on records earlier in the same batch. Rejected
    /// records do not stop the rest of the batch.
    pub fn apply<I>(&mut self, changes: I) -> ApplyReport
    where
        I: IntoIterator<Item = Change>,
    {
        self.apply_results(changes.into_iter().map(Ok))
    }

    /// Decode and merge a batch of encoded change records.
    ///
    /// Undecodable records are reported as rejected like any other failure.
    pub fn apply_encoded<I, B>(&mut self, records: I) -> ApplyReport
    where
        I: IntoIterator<Item = B>,
        B: Into<Vec<u8>>,
    {
        self.apply_results(
            records
                .into_iter()
                .map(|bytes| Change::from_bytes(bytes).map_err(crate::Error::from)),
        )
    }

    fn apply_results<I>(&mut self, changes: I) -> ApplyReport
    where
        I: IntoIterator<Item = Result<Change>>,
    {
        let mut report = ApplyReport::default();
        for (position, change) in changes.into_iter().enumerate() {
            let outcome = change.and_then(|change| {
                let hash = change.hash();
                self.apply_change(change).map(|fresh| (hash, fresh))
            });
            match outcome {
                Ok((hash, true)) => report.applied.push(hash),
                Ok((_, false)) => report.duplicates += 1,
                Err(err) => {
                    tracing::warn!(position, error = %err, "rejected change record");
                    report.rejected.push((position, err));
                }
            }
        }
        report
    }

    pub(crate) fn transaction(&mut self) -> Transaction<'_> {
        Transaction::new(self)
    }
}
