//! Materialized document state.
//!
//! The op set holds one entry per container object. Map entries and list slots
//! are last-writer-wins registers ordered by [`OpId`]; text objects are
//! sequences of characters. Applying an op is deterministic and independent of
//! what else the replica has seen, so replaying the same set of changes in any
//! causal order yields the same state.

use std::collections::{BTreeMap, HashMap};

use super::{
    CRDTError, ElemRef, NodeKind, ObjId, ObjType, OpId, ScalarValue, Sequence,
    op::{Key, Op, OpAction},
};

/// Contents of a register.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Slot {
    Scalar(ScalarValue),
    /// A child container, named by the register's id.
    Object(ObjType),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Register {
    pub id: OpId,
    pub slot: Slot,
}

impl Register {
    pub fn kind(&self) -> NodeKind {
        match &self.slot {
            Slot::Scalar(value) => value.kind(),
            Slot::Object(obj_type) => NodeKind::from(*obj_type),
        }
    }

    /// The child object held by this register, if any.
    pub fn child(&self) -> Option<(ObjId, ObjType)> {
        match self.slot {
            Slot::Object(obj_type) => Some((ObjId::Op(self.id), obj_type)),
            Slot::Scalar(_) => None,
        }
    }

    pub fn scalar(&self) -> Option<&ScalarValue> {
        match &self.slot {
            Slot::Scalar(value) => Some(value),
            Slot::Object(_) => None,
        }
    }

    fn overwrite(&mut self, id: OpId, slot: Slot) {
        if id > self.id {
            self.id = id;
            self.slot = slot;
        }
    }

    fn increment(&mut self, counter: OpId, delta: i64) {
        if self.id != counter {
            return;
        }
        if let Slot::Scalar(ScalarValue::Counter(value)) = &mut self.slot {
            *value = value.wrapping_add(delta);
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Object {
    Map(BTreeMap<String, Register>),
    List(Sequence<Register>),
    Text(Sequence<char>),
}

impl Object {
    fn new(obj_type: ObjType) -> Self {
        match obj_type {
            ObjType::Map => Object::Map(BTreeMap::new()),
            ObjType::List => Object::List(Sequence::new()),
            ObjType::Text => Object::Text(Sequence::new()),
        }
    }

    pub fn obj_type(&self) -> ObjType {
        match self {
            Object::Map(_) => ObjType::Map,
            Object::List(_) => ObjType::List,
            Object::Text(_) => ObjType::Text,
        }
    }

    /// Number of visible children.
    pub fn len(&self) -> usize {
        match self {
            Object::Map(entries) => entries.len(),
            Object::List(items) => items.len(),
            Object::Text(chars) => chars.len(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct OpSet {
    objects: HashMap<ObjId, Object>,
    max_op: u64,
}

impl Default for OpSet {
    fn default() -> Self {
        let mut objects = HashMap::new();
        objects.insert(ObjId::Root, Object::Map(BTreeMap::new()));
        Self { objects, max_op: 0 }
    }
}

impl OpSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest op counter applied so far.
    pub fn max_op(&self) -> u64 {
        self.max_op
    }

    pub fn object(&self, obj: ObjId) -> Option<&Object> {
        self.objects.get(&obj)
    }

    pub fn map(&self, obj: ObjId) -> Option<&BTreeMap<String, Register>> {
        match self.objects.get(&obj) {
            Some(Object::Map(entries)) => Some(entries),
            _ => None,
        }
    }

    pub fn list(&self, obj: ObjId) -> Option<&Sequence<Register>> {
        match self.objects.get(&obj) {
            Some(Object::List(items)) => Some(items),
            _ => None,
        }
    }

    pub fn text(&self, obj: ObjId) -> Option<&Sequence<char>> {
        match self.objects.get(&obj) {
            Some(Object::Text(chars)) => Some(chars),
            _ => None,
        }
    }

    pub fn text_string(&self, obj: ObjId) -> Option<String> {
        self.text(obj).map(|chars| chars.values().collect())
    }

    /// Apply one operation with id `id`.
    ///
    /// Leaves the op set untouched when the op does not fit its target.
    pub fn apply_op(&mut self, id: OpId, op: &Op) -> Result<(), CRDTError> {
        let object = self
            .objects
            .get_mut(&op.obj)
            .ok_or_else(|| CRDTError::MissingObject {
                obj: op.obj.to_string(),
            })?;

        let created = match (object, &op.key) {
            (Object::Map(entries), Key::Map(name)) if !op.insert => match &op.action {
                OpAction::Increment { counter, delta } => {
                    if let Some(register) = entries.get_mut(name) {
                        register.increment(*counter, *delta);
                    }
                    None
                }
                action => {
                    let slot = register_slot(action, op)?;
                    let created = made_object(&slot);
                    match entries.get_mut(name) {
                        Some(register) => register.overwrite(id, slot),
                        None => {
                            entries.insert(name.clone(), Register { id, slot });
                        }
                    }
                    created
                }
            },
            (Object::List(items), Key::Seq(after)) if op.insert => {
                let slot = register_slot(&op.action, op)?;
                let created = made_object(&slot);
                if !items.insert_after(*after, id, Register { id, slot }) {
                    return Err(missing_element(op.obj, after));
                }
                created
            }
            (Object::List(items), Key::Seq(ElemRef::Id(elem))) => {
                let element = items
                    .element_mut(*elem)
                    .ok_or_else(|| missing_element(op.obj, &ElemRef::Id(*elem)))?;
                match &op.action {
                    OpAction::Increment { counter, delta } => {
                        element.value.increment(*counter, *delta);
                        None
                    }
                    action => {
                        let slot = register_slot(action, op)?;
                        let created = made_object(&slot);
                        element.value.overwrite(id, slot);
                        created
                    }
                }
            }
            (Object::Text(chars), Key::Seq(after)) if op.insert => {
                let OpAction::Char(ch) = op.action else {
                    return Err(invalid(op, ObjType::Text));
                };
                if !chars.insert_after(*after, id, ch) {
                    return Err(missing_element(op.obj, after));
                }
                None
            }
            (Object::Text(chars), Key::Seq(ElemRef::Id(elem)))
                if op.action == OpAction::Delete =>
            {
                if !chars.delete(*elem) {
                    return Err(missing_element(op.obj, &ElemRef::Id(*elem)));
                }
                None
            }
            (object, _) => return Err(invalid(op, object.obj_type())),
        };

        if let Some(obj_type) = created {
            self.objects
                .entry(ObjId::Op(id))
                .or_insert_with(|| Object::new(obj_type));
        }
        self.max_op = self.max_op.max(id.counter);
        Ok(())
    }
}

fn register_slot(action: &OpAction, op: &Op) -> Result<Slot, CRDTError> {
    match action {
        OpAction::Make(obj_type) => Ok(Slot::Object(*obj_type)),
        OpAction::Set(value) => Ok(Slot::Scalar(*value)),
        _ => Err(CRDTError::InvalidOperation {
            reason: format!("{} cannot fill a register in {}", action.name(), op.obj),
        }),
    }
}

fn made_object(slot: &Slot) -> Option<ObjType> {
    match slot {
        Slot::Object(obj_type) => Some(*obj_type),
        Slot::Scalar(_) => None,
    }
}

fn missing_element(obj: ObjId, elem: &ElemRef) -> CRDTError {
    CRDTError::MissingElement {
        obj: obj.to_string(),
        elem: match elem {
            ElemRef::Head => "_head".to_string(),
            ElemRef::Id(id) => id.to_string(),
        },
    }
}

fn invalid(op: &Op, target: ObjType) -> CRDTError {
    CRDTError::InvalidOperation {
        reason: format!(
            "{}{} does not apply to {} object {}",
            if op.insert { "insert " } else { "" },
            op.action.name(),
            NodeKind::from(target),
            op.obj
        ),
    }
}
