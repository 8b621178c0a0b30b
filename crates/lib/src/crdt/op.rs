//! Operations carried inside change records.

use serde::{Deserialize, Serialize};

use super::{ElemRef, ObjId, ObjType, OpId, ScalarValue};

/// Where inside its object an operation lands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) enum Key {
    Map(String),
    Seq(ElemRef),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) enum OpAction {
    /// Create an empty container; the new object is named by this op's id.
    Make(ObjType),
    Set(ScalarValue),
    /// Insert one character into a text object.
    Char(char),
    /// Add to the counter written by `counter`.
    Increment { counter: OpId, delta: i64 },
    /// Hide a text character.
    Delete,
}

impl OpAction {
    pub fn name(&self) -> &'static str {
        match self {
            OpAction::Make(_) => "make",
            OpAction::Set(_) => "set",
            OpAction::Char(_) => "char",
            OpAction::Increment { .. } => "increment",
            OpAction::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Op {
    pub obj: ObjId,
    pub key: Key,
    /// Sequence insertion after `key`, rather than an update of the slot at `key`.
    pub insert: bool,
    pub action: OpAction,
}

impl Op {
    pub fn put(obj: ObjId, key: Key, action: OpAction) -> Self {
        Self {
            obj,
            key,
            insert: false,
            action,
        }
    }

    pub fn insert(obj: ObjId, after: ElemRef, action: OpAction) -> Self {
        Self {
            obj,
            key: Key::Seq(after),
            insert: true,
            action,
        }
    }
}
