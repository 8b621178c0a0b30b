//! Character-level text editing.
//!
//! Both entry points end in the same primitive: a splice that deletes `del`
//! characters at `pos` and inserts new text there. Positions and lengths count
//! Unicode scalar values, never bytes. [`Document::splice_text`] takes the
//! splice from the caller; [`Document::put_diff`] derives splices from a
//! unified diff against the current text.

pub(crate) mod diff;
mod errors;

pub use errors::TextError;

use crate::{
    Document, Result,
    change::Change,
    crdt::{CRDTError, NodeKind, ObjId, ObjType, op::OpAction},
    path::{Path, resolve},
};

/// A positional text edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    pub pos: usize,
    pub del: usize,
    pub insert: String,
}

impl Splice {
    pub fn new(pos: usize, del: usize, insert: impl Into<String>) -> Self {
        Self {
            pos,
            del,
            insert: insert.into(),
        }
    }

    fn at(pos: usize) -> Self {
        Self::new(pos, 0, String::new())
    }

    /// The splice that undoes this one when applied to its result.
    ///
    /// `removed` is the text this splice deleted.
    pub fn inverse(&self, removed: &str) -> Splice {
        Splice::new(self.pos, self.insert.chars().count(), removed)
    }

    /// Check the splice fits a text of `len` characters.
    pub fn validate(&self, len: usize) -> std::result::Result<(), TextError> {
        if self.pos > len {
            return Err(TextError::PositionOutOfRange { pos: self.pos, len });
        }
        if self.del > len - self.pos {
            return Err(TextError::DeleteOutOfRange {
                pos: self.pos,
                del: self.del,
                len,
            });
        }
        Ok(())
    }
}

/// The single splice turning `old` into `new`, after trimming their common
/// prefix and suffix.
pub(crate) fn minimal_splice(old: &str, new: &str) -> Splice {
    let old: Vec<char> = old.chars().collect();
    let new: Vec<char> = new.chars().collect();
    let prefix = old
        .iter()
        .zip(&new)
        .take_while(|(a, b)| a == b)
        .count();
    let room = old.len().min(new.len()) - prefix;
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take(room)
        .take_while(|(a, b)| a == b)
        .count();
    Splice::new(
        prefix,
        old.len() - prefix - suffix,
        new[prefix..new.len() - suffix].iter().collect::<String>(),
    )
}

impl Document {
    /// Delete `del` characters at `pos` of the text at `path`, then insert `insert` there.
    ///
    /// Out-of-range positions are an error, never clamped.
    pub fn splice_text(&mut self, path: &str, pos: usize, del: usize, insert: &str) -> Result<Change> {
        let parsed = Path::parse(path)?;
        let obj = self.text_target(&parsed)?;
        let len = self.ops.text(obj).map(|chars| chars.len()).unwrap_or(0);
        Splice::new(pos, del, insert).validate(len)?;
        tracing::debug!(path = %parsed, pos, del, insert_len = insert.chars().count(), "splice text");
        let mut tx = self.transaction();
        tx.splice(obj, pos, del, insert)?;
        tx.commit()
    }

    /// Apply a unified diff to the text at `path`.
    ///
    /// The diff must match the current text exactly; a stale or unparsable
    /// diff fails without touching the document. An absent path is treated as
    /// empty text and created. A diff without hunks records an empty change.
    pub fn put_diff(&mut self, path: &str, unified_diff: &str) -> Result<Change> {
        let parsed = Path::parse(path)?;
        let hunks = diff::parse(unified_diff)?;
        if hunks.is_empty() {
            return self.transaction().commit();
        }
        let plan = resolve::plan_write(&self.ops, &parsed)?;
        let existing = match &plan.existing {
            None => None,
            Some(register) => match register.child() {
                Some((obj, ObjType::Text)) => Some(obj),
                _ => {
                    return Err(CRDTError::TypeMismatch {
                        path: parsed.to_string(),
                        expected: NodeKind::Text.to_string(),
                        actual: register.kind().to_string(),
                    }
                    .into());
                }
            },
        };
        let current = existing
            .and_then(|obj| self.ops.text_string(obj))
            .unwrap_or_default();
        let splices = diff::replay(&current, &hunks)?;
        tracing::debug!(path = %parsed, hunks = hunks.len(), splices = splices.len(), "apply diff");

        let mut tx = self.transaction();
        let obj = match existing {
            Some(obj) => obj,
            None => ObjId::Op(tx.write(&plan, OpAction::Make(ObjType::Text))?),
        };
        for splice in &splices {
            tx.splice(obj, splice.pos, splice.del, &splice.insert)?;
        }
        tx.commit()
    }

    fn text_target(&self, path: &Path) -> Result<ObjId> {
        match resolve::read(&self.ops, path) {
            None => Err(CRDTError::NotFound {
                path: path.to_string(),
            }
            .into()),
            Some(node) => match node.object() {
                Some((obj, ObjType::Text)) => Ok(obj),
                _ => Err(CRDTError::TypeMismatch {
                    path: path.to_string(),
                    expected: NodeKind::Text.to_string(),
                    actual: node.kind().to_string(),
                }
                .into()),
            },
        }
    }
}
