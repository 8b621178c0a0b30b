//! Leaf values and node kinds.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ObjType;

/// A scalar leaf stored in a map entry or list slot.
///
/// Strings are never scalars: text always lives in a Text object so it can be
/// edited character by character.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScalarValue {
    Int(i64),
    Double(f64),
    Bool(bool),
    /// Merges by summing concurrent increments rather than by last writer.
    Counter(i64),
    /// Milliseconds since Unix epoch.
    Timestamp(i64),
}

impl ScalarValue {
    pub fn kind(&self) -> NodeKind {
        match self {
            ScalarValue::Int(_) => NodeKind::Int,
            ScalarValue::Double(_) => NodeKind::Double,
            ScalarValue::Bool(_) => NodeKind::Bool,
            ScalarValue::Counter(_) => NodeKind::Counter,
            ScalarValue::Timestamp(_) => NodeKind::Timestamp,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Int(v) | ScalarValue::Counter(v) | ScalarValue::Timestamp(v) => {
                write!(f, "{v}")
            }
            ScalarValue::Double(v) => write!(f, "{v}"),
            ScalarValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// The variant of a node in the document tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Map,
    List,
    Text,
    Int,
    Double,
    Bool,
    Counter,
    Timestamp,
}

impl NodeKind {
    /// Lowercase name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Map => "map",
            NodeKind::List => "list",
            NodeKind::Text => "text",
            NodeKind::Int => "int",
            NodeKind::Double => "double",
            NodeKind::Bool => "bool",
            NodeKind::Counter => "counter",
            NodeKind::Timestamp => "timestamp",
        }
    }

    /// Whether the kind is a container of other nodes.
    pub fn is_container(&self) -> bool {
        matches!(self, NodeKind::Map | NodeKind::List)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<ObjType> for NodeKind {
    fn from(obj_type: ObjType) -> Self {
        match obj_type {
            ObjType::Map => NodeKind::Map,
            ObjType::List => NodeKind::List,
            ObjType::Text => NodeKind::Text,
        }
    }
}
