//! Local transactions.
//!
//! A transaction numbers and applies ops on behalf of the document's actor
//! and then seals them into one [`Change`]. Ops are applied to a staged copy
//! of the op set; the document only sees them once the change commits, so a
//! failed or dropped transaction leaves it untouched.

use super::Document;
use crate::{
    Result,
    change::{Change, ChangeBody},
    crdt::{
        CRDTError, ElemRef, ObjId, ObjType, OpId, OpSet,
        op::{Key, Op, OpAction},
    },
    path::resolve::WritePlan,
};

pub(crate) struct Transaction<'a> {
    doc: &'a mut Document,
    staged: OpSet,
    start_op: u64,
    ops: Vec<Op>,
}

impl<'a> Transaction<'a> {
    pub fn new(doc: &'a mut Document) -> Self {
        let staged = doc.ops.clone();
        let start_op = staged.max_op().saturating_add(1);
        Self {
            doc,
            staged,
            start_op,
            ops: Vec::new(),
        }
    }

    pub fn ops(&self) -> &OpSet {
        &self.staged
    }

    fn next_id(&self) -> Result<OpId> {
        let counter = self
            .start_op
            .checked_add(self.ops.len() as u64)
            .filter(|counter| *counter < u64::MAX)
            .ok_or_else(|| CRDTError::InvalidOperation {
                reason: "op counter exhausted".to_string(),
            })?;
        Ok(OpId::new(counter, self.doc.actor))
    }

    pub fn push(&mut self, op: Op) -> Result<OpId> {
        let id = self.next_id()?;
        self.staged.apply_op(id, &op)?;
        self.ops.push(op);
        Ok(id)
    }

    /// Create the maps a plan is missing and return the object its leaf lives in.
    pub fn materialize(&mut self, plan: &WritePlan) -> Result<ObjId> {
        let mut parent = plan.parent;
        for name in &plan.missing {
            let id = self.push(Op::put(
                parent,
                Key::Map(name.clone()),
                OpAction::Make(ObjType::Map),
            ))?;
            parent = ObjId::Op(id);
        }
        Ok(parent)
    }

    /// Write `action` at the plan's leaf, creating missing maps first.
    pub fn write(&mut self, plan: &WritePlan, action: OpAction) -> Result<OpId> {
        let parent = self.materialize(plan)?;
        self.push(Op::put(parent, plan.leaf.to_key(), action))
    }

    /// Append a new slot at the end of `list`.
    pub fn append(&mut self, list: ObjId, action: OpAction) -> Result<OpId> {
        let after = self
            .staged
            .list(list)
            .map(|items| items.anchor_for(items.len()))
            .ok_or_else(|| CRDTError::MissingObject {
                obj: list.to_string(),
            })?;
        self.push(Op::insert(list, after, action))
    }

    /// Replace `del` characters at `pos` of `text` with `insert`.
    ///
    /// Positions count Unicode scalar values and must already be validated.
    pub fn splice(&mut self, text: ObjId, pos: usize, del: usize, insert: &str) -> Result<()> {
        let (mut after, doomed) = {
            let chars = self
                .staged
                .text(text)
                .ok_or_else(|| CRDTError::MissingObject {
                    obj: text.to_string(),
                })?;
            (chars.anchor_for(pos), chars.visible_ids(pos, del))
        };
        for elem in doomed {
            self.push(Op::put(text, Key::Seq(ElemRef::Id(elem)), OpAction::Delete))?;
        }
        for ch in insert.chars() {
            let id = self.push(Op::insert(text, after, OpAction::Char(ch)))?;
            after = ElemRef::Id(id);
        }
        Ok(())
    }

    /// Seal the pushed ops into a change and append it to history.
    pub fn commit(self) -> Result<Change> {
        let doc = self.doc;
        let change = Change::new(ChangeBody {
            actor: doc.actor,
            seq: doc.history.last_seq(&doc.actor) + 1,
            start_op: self.start_op,
            time: doc.clock.now_millis(),
            deps: doc.history.heads(),
            ops: self.ops,
        })?;
        doc.ops = self.staged;
        doc.history.push(change.clone());
        tracing::debug!(
            hash = %change.hash(),
            ops = change.len(),
            seq = change.seq(),
            "committed change"
        );
        Ok(change)
    }
}
