//! Append-only log of applied changes.

use std::collections::{BTreeSet, HashMap, HashSet};

use super::{Change, ChangeError, ChangeHash};
use crate::crdt::ActorId;

/// Changes in the order this replica applied them, indexed by hash.
///
/// The application order is always a valid causal order: a change is only
/// appended once all of its dependencies are present.
#[derive(Debug, Clone, Default)]
pub(crate) struct History {
    changes: Vec<Change>,
    index: HashMap<ChangeHash, usize>,
    heads: BTreeSet<ChangeHash>,
    seqs: HashMap<ActorId, u64>,
}

impl History {
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn contains(&self, hash: &ChangeHash) -> bool {
        self.index.contains_key(hash)
    }

    pub fn get(&self, hash: &ChangeHash) -> Option<&Change> {
        self.index.get(hash).map(|&i| &self.changes[i])
    }

    /// Changes that no other change depends on, sorted.
    pub fn heads(&self) -> Vec<ChangeHash> {
        self.heads.iter().copied().collect()
    }

    /// Highest sequence number seen from `actor`, 0 if none.
    pub fn last_seq(&self, actor: &ActorId) -> u64 {
        self.seqs.get(actor).copied().unwrap_or(0)
    }

    pub fn missing_deps(&self, change: &Change) -> Vec<ChangeHash> {
        change
            .deps()
            .iter()
            .filter(|dep| !self.contains(dep))
            .copied()
            .collect()
    }

    /// Append a change whose dependencies are already present.
    pub fn push(&mut self, change: Change) {
        let hash = change.hash();
        for dep in change.deps() {
            self.heads.remove(dep);
        }
        self.heads.insert(hash);
        self.seqs.insert(change.actor(), change.seq());
        self.index.insert(hash, self.changes.len());
        self.changes.push(change);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Change> {
        self.changes.iter()
    }

    /// Changes that are not ancestors of (or equal to) any hash in `have`.
    pub fn since(&self, have: &[ChangeHash]) -> Result<Vec<&Change>, ChangeError> {
        let mut known = HashSet::new();
        let mut stack = Vec::new();
        for hash in have {
            if !self.contains(hash) {
                return Err(ChangeError::UnknownChange {
                    hash: hash.to_string(),
                });
            }
            stack.push(*hash);
        }
        while let Some(hash) = stack.pop() {
            if !known.insert(hash) {
                continue;
            }
            if let Some(change) = self.get(&hash) {
                stack.extend(change.deps().iter().copied());
            }
        }
        Ok(self
            .changes
            .iter()
            .filter(|change| !known.contains(&change.hash()))
            .collect())
    }
}
