//! Replicated growable array used by lists and text.
//!
//! Elements are never removed, only hidden, so that operations from other
//! replicas can still name them as insertion anchors. A new element is placed
//! directly after its anchor, skipping over any neighbours with a greater
//! [`OpId`]; those were inserted concurrently at the same anchor and win the
//! earlier position. Every replica therefore sees the same order no matter in
//! which order the inserts arrive.

use serde::{Deserialize, Serialize};

use super::OpId;

/// Anchor of a sequence insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElemRef {
    /// Before the first element.
    Head,
    /// After the element created by this op.
    Id(OpId),
}

#[derive(Debug, Clone)]
pub(crate) struct Element<T> {
    pub id: OpId,
    pub value: T,
    pub visible: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct Sequence<T> {
    elements: Vec<Element<T>>,
    visible: usize,
}

impl<T> Default for Sequence<T> {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
            visible: 0,
        }
    }
}

impl<T> Sequence<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of visible elements.
    pub fn len(&self) -> usize {
        self.visible
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.visible == 0
    }

    fn position(&self, id: OpId) -> Option<usize> {
        self.elements.iter().position(|element| element.id == id)
    }

    /// Insert `value` after `after`. Returns `false` if the anchor is unknown.
    pub fn insert_after(&mut self, after: ElemRef, id: OpId, value: T) -> bool {
        let mut index = match after {
            ElemRef::Head => 0,
            ElemRef::Id(anchor) => match self.position(anchor) {
                Some(position) => position + 1,
                None => return false,
            },
        };
        while index < self.elements.len() && self.elements[index].id > id {
            index += 1;
        }
        self.elements.insert(
            index,
            Element {
                id,
                value,
                visible: true,
            },
        );
        self.visible += 1;
        true
    }

    /// Hide the element created by `id`. Returns `false` if it is unknown.
    ///
    /// Hiding an already hidden element succeeds; concurrent deletes of one
    /// character are not a conflict.
    pub fn delete(&mut self, id: OpId) -> bool {
        match self.elements.iter_mut().find(|element| element.id == id) {
            Some(element) => {
                if element.visible {
                    element.visible = false;
                    self.visible -= 1;
                }
                true
            }
            None => false,
        }
    }

    /// The visible element at `index`.
    pub fn get(&self, index: usize) -> Option<&Element<T>> {
        self.iter().nth(index)
    }

    /// Any element, visible or not, by the op that created it.
    pub fn element_mut(&mut self, id: OpId) -> Option<&mut Element<T>> {
        self.elements.iter_mut().find(|element| element.id == id)
    }

    /// Anchor that places a new element at visible position `index`.
    ///
    /// `index` must not exceed [`len`](Self::len).
    pub fn anchor_for(&self, index: usize) -> ElemRef {
        match index.checked_sub(1).and_then(|prev| self.get(prev)) {
            Some(element) => ElemRef::Id(element.id),
            None => ElemRef::Head,
        }
    }

    /// Ids of `count` visible elements starting at visible position `start`.
    pub fn visible_ids(&self, start: usize, count: usize) -> Vec<OpId> {
        self.iter()
            .skip(start)
            .take(count)
            .map(|element| element.id)
            .collect()
    }

    /// Visible elements in order.
    pub fn iter(&self) -> impl Iterator<Item = &Element<T>> {
        self.elements.iter().filter(|element| element.visible)
    }

    /// Visible values in order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.iter().map(|element| &element.value)
    }
}
