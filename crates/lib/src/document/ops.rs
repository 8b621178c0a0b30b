//! Typed reads and writes addressed by path.
//!
//! Writers plan the whole edit against the current state before opening a
//! transaction, so a rejected path never produces ops or a change. Readers
//! return `Ok(None)` for absent nodes and a type error when the node exists
//! with a different variant.

use super::{Document, NodeValue};
use crate::{
    Result,
    change::Change,
    crdt::{
        CRDTError, NodeKind, ObjId, ObjType, Object, ScalarValue,
        op::{Op, OpAction},
    },
    path::{
        Path,
        resolve::{self, Resolved},
    },
    text,
};

impl Document {
    /// The node at `path`, if any.
    pub fn get(&self, path: &str) -> Result<Option<NodeValue>> {
        let path = Path::parse(path)?;
        let Some(node) = resolve::read(&self.ops, &path) else {
            return Ok(None);
        };
        let value = match node.object() {
            Some((obj, _)) => match self.ops.object(obj) {
                Some(Object::Map(entries)) => NodeValue::Map { len: entries.len() },
                Some(Object::List(items)) => NodeValue::List { len: items.len() },
                Some(Object::Text(chars)) => NodeValue::Text(chars.values().collect()),
                None => return Ok(None),
            },
            None => match node {
                Resolved::Slot { register, .. } => match register.scalar() {
                    Some(value) => NodeValue::Scalar(*value),
                    None => return Ok(None),
                },
                Resolved::Root => return Ok(None),
            },
        };
        Ok(Some(value))
    }

    /// Set the text at `path`.
    ///
    /// Existing text is edited in place with the smallest single splice that
    /// turns it into `value`, so concurrent edits elsewhere in the text survive.
    pub fn put_text(&mut self, path: &str, value: &str) -> Result<Change> {
        let path = Path::parse(path)?;
        let plan = resolve::plan_write(&self.ops, &path)?;
        tracing::debug!(%path, chars = value.chars().count(), "put text");
        let existing = plan.existing_object(ObjType::Text);
        let mut tx = self.transaction();
        match existing {
            Some(obj) => {
                let current = tx.ops().text_string(obj).unwrap_or_default();
                let edit = text::minimal_splice(&current, value);
                tx.splice(obj, edit.pos, edit.del, &edit.insert)?;
            }
            None => {
                let id = tx.write(&plan, OpAction::Make(ObjType::Text))?;
                tx.splice(ObjId::Op(id), 0, 0, value)?;
            }
        }
        tx.commit()
    }

    pub fn put_int(&mut self, path: &str, value: i64) -> Result<Change> {
        self.put_scalar(path, ScalarValue::Int(value))
    }

    pub fn put_double(&mut self, path: &str, value: f64) -> Result<Change> {
        self.put_scalar(path, ScalarValue::Double(value))
    }

    pub fn put_bool(&mut self, path: &str, value: bool) -> Result<Change> {
        self.put_scalar(path, ScalarValue::Bool(value))
    }

    /// Set a counter, discarding any increments made to a previous value.
    pub fn put_counter(&mut self, path: &str, value: i64) -> Result<Change> {
        self.put_scalar(path, ScalarValue::Counter(value))
    }

    /// Set a timestamp in milliseconds since Unix epoch.
    pub fn put_timestamp(&mut self, path: &str, millis: i64) -> Result<Change> {
        self.put_scalar(path, ScalarValue::Timestamp(millis))
    }

    fn put_scalar(&mut self, path: &str, value: ScalarValue) -> Result<Change> {
        let path = Path::parse(path)?;
        let plan = resolve::plan_write(&self.ops, &path)?;
        tracing::debug!(%path, kind = %value.kind(), "put scalar");
        let mut tx = self.transaction();
        tx.write(&plan, OpAction::Set(value))?;
        tx.commit()
    }

    pub fn get_text(&self, path: &str) -> Result<Option<String>> {
        let path = Path::parse(path)?;
        match resolve::read(&self.ops, &path) {
            None => Ok(None),
            Some(node) => match node.object() {
                Some((obj, ObjType::Text)) => Ok(self.ops.text_string(obj)),
                _ => Err(mismatch(&path, NodeKind::Text, node.kind())),
            },
        }
    }

    pub fn get_int(&self, path: &str) -> Result<Option<i64>> {
        Ok(match self.get_scalar(path, NodeKind::Int)? {
            Some(ScalarValue::Int(value)) => Some(value),
            _ => None,
        })
    }

    pub fn get_double(&self, path: &str) -> Result<Option<f64>> {
        Ok(match self.get_scalar(path, NodeKind::Double)? {
            Some(ScalarValue::Double(value)) => Some(value),
            _ => None,
        })
    }

    pub fn get_bool(&self, path: &str) -> Result<Option<bool>> {
        Ok(match self.get_scalar(path, NodeKind::Bool)? {
            Some(ScalarValue::Bool(value)) => Some(value),
            _ => None,
        })
    }

    /// Current counter value: the last written value plus every increment made to it.
    pub fn get_counter(&self, path: &str) -> Result<Option<i64>> {
        Ok(match self.get_scalar(path, NodeKind::Counter)? {
            Some(ScalarValue::Counter(value)) => Some(value),
            _ => None,
        })
    }

    pub fn get_timestamp(&self, path: &str) -> Result<Option<i64>> {
        Ok(match self.get_scalar(path, NodeKind::Timestamp)? {
            Some(ScalarValue::Timestamp(value)) => Some(value),
            _ => None,
        })
    }

    fn get_scalar(&self, path: &str, kind: NodeKind) -> Result<Option<ScalarValue>> {
        let path = Path::parse(path)?;
        let Some(node) = resolve::read(&self.ops, &path) else {
            return Ok(None);
        };
        match node {
            Resolved::Slot { register, .. } if register.kind() == kind => {
                Ok(register.scalar().copied())
            }
            other => Err(mismatch(&path, kind, other.kind())),
        }
    }

    /// Add `delta` to the counter at `path`.
    ///
    /// Increments from different actors commute: replicas that have seen the
    /// same increments agree on the sum whatever order they arrived in.
    pub fn inc_counter(&mut self, path: &str, delta: i64) -> Result<Change> {
        let parsed = Path::parse(path)?;
        let (parent, key, counter) = match resolve::read(&self.ops, &parsed) {
            None => {
                return Err(CRDTError::NotFound {
                    path: parsed.to_string(),
                }
                .into());
            }
            Some(Resolved::Slot {
                parent,
                key,
                register,
            }) if register.kind() == NodeKind::Counter => (parent, key.to_key(), register.id),
            Some(other) => return Err(mismatch(&parsed, NodeKind::Counter, other.kind())),
        };
        tracing::debug!(path = %parsed, delta, "increment counter");
        let mut tx = self.transaction();
        tx.push(Op::put(parent, key, OpAction::Increment { counter, delta }))?;
        tx.commit()
    }

    /// Ensure an empty list exists at `path`.
    ///
    /// When a list is already there the document is left as is and an empty
    /// change is recorded.
    pub fn create_list(&mut self, path: &str) -> Result<Change> {
        let parsed = Path::parse(path)?;
        let plan = resolve::plan_write(&self.ops, &parsed)?;
        match &plan.existing {
            Some(register) if register.kind() != NodeKind::List => {
                return Err(mismatch(&parsed, NodeKind::List, register.kind()));
            }
            _ => {}
        }
        let mut tx = self.transaction();
        if plan.existing.is_none() {
            tx.write(&plan, OpAction::Make(ObjType::List))?;
        }
        tx.commit()
    }

    /// Append a new text element to the list at `path`.
    pub fn append_text(&mut self, path: &str, value: &str) -> Result<Change> {
        let list = self.list_target(path)?;
        let mut tx = self.transaction();
        let id = tx.append(list, OpAction::Make(ObjType::Text))?;
        tx.splice(ObjId::Op(id), 0, 0, value)?;
        tx.commit()
    }

    pub fn append_int(&mut self, path: &str, value: i64) -> Result<Change> {
        self.append_scalar(path, ScalarValue::Int(value))
    }

    pub fn append_double(&mut self, path: &str, value: f64) -> Result<Change> {
        self.append_scalar(path, ScalarValue::Double(value))
    }

    pub fn append_bool(&mut self, path: &str, value: bool) -> Result<Change> {
        self.append_scalar(path, ScalarValue::Bool(value))
    }

    fn append_scalar(&mut self, path: &str, value: ScalarValue) -> Result<Change> {
        let list = self.list_target(path)?;
        let mut tx = self.transaction();
        tx.append(list, OpAction::Set(value))?;
        tx.commit()
    }

    fn list_target(&self, path: &str) -> Result<ObjId> {
        let parsed = Path::parse(path)?;
        match resolve::read(&self.ops, &parsed) {
            None => Err(CRDTError::NotFound {
                path: parsed.to_string(),
            }
            .into()),
            Some(node) => match node.object() {
                Some((obj, ObjType::List)) => Ok(obj),
                _ => Err(mismatch(&parsed, NodeKind::List, node.kind())),
            },
        }
    }

    /// Number of elements in the list at `path`.
    pub fn list_len(&self, path: &str) -> Result<Option<usize>> {
        self.container_len(path, ObjType::List)
    }

    /// Number of keys in the map at `path`; the empty path is the root.
    pub fn map_len(&self, path: &str) -> Result<Option<usize>> {
        self.container_len(path, ObjType::Map)
    }

    fn container_len(&self, path: &str, expected: ObjType) -> Result<Option<usize>> {
        let parsed = Path::parse(path)?;
        let Some(node) = resolve::read(&self.ops, &parsed) else {
            return Ok(None);
        };
        match node.object() {
            Some((obj, found)) if found == expected => {
                Ok(self.ops.object(obj).map(|object| object.len()))
            }
            _ => Err(mismatch(&parsed, expected.into(), node.kind())),
        }
    }
}

fn mismatch(path: &Path, expected: NodeKind, actual: NodeKind) -> crate::Error {
    CRDTError::TypeMismatch {
        path: path.to_string(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
    .into()
}
