//! Walking a parsed [`Path`] through an op set.
//!
//! Reads never fail on shape: a missing key, an index past the end, or a step
//! into a scalar all mean "nothing here". Writes are planned before any op is
//! generated, so a failing plan leaves the document untouched. A write plan
//! follows existing containers as far as it can and records the map keys that
//! must be created for the rest of the path; lists are never created
//! implicitly, so an index step below a missing key is an error.

use super::{Path, PathError, PathSegment};
use crate::{
    Result,
    crdt::{CRDTError, ElemRef, NodeKind, ObjId, ObjType, OpId, OpSet, Register, op::Key},
};

/// A node reached by a read.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Resolved<'a> {
    /// The root map.
    Root,
    /// A map entry or list slot inside `parent`.
    Slot {
        parent: ObjId,
        key: SlotKey<'a>,
        register: &'a Register,
    },
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum SlotKey<'a> {
    Map(&'a str),
    Elem(OpId),
}

impl SlotKey<'_> {
    pub fn to_key(self) -> Key {
        match self {
            SlotKey::Map(name) => Key::Map(name.to_string()),
            SlotKey::Elem(id) => Key::Seq(ElemRef::Id(id)),
        }
    }
}

impl Resolved<'_> {
    pub fn kind(&self) -> NodeKind {
        match self {
            Resolved::Root => NodeKind::Map,
            Resolved::Slot { register, .. } => register.kind(),
        }
    }

    /// The container object at this node, if it is one.
    pub fn object(&self) -> Option<(ObjId, ObjType)> {
        match self {
            Resolved::Root => Some((ObjId::Root, ObjType::Map)),
            Resolved::Slot { register, .. } => register.child(),
        }
    }
}

/// Find the node at `path`, if there is one.
pub(crate) fn read<'a>(ops: &'a OpSet, path: &Path) -> Option<Resolved<'a>> {
    let mut current = Resolved::Root;
    for segment in path.segments() {
        let (obj, obj_type) = current.object()?;
        current = match (obj_type, segment) {
            (ObjType::Map, PathSegment::Key(name)) => {
                let (name, register) = ops.map(obj)?.get_key_value(name.as_str())?;
                Resolved::Slot {
                    parent: obj,
                    key: SlotKey::Map(name),
                    register,
                }
            }
            (ObjType::List, PathSegment::Index(index)) => {
                let element = ops.list(obj)?.get(*index)?;
                Resolved::Slot {
                    parent: obj,
                    key: SlotKey::Elem(element.id),
                    register: &element.value,
                }
            }
            _ => return None,
        };
    }
    Some(current)
}

/// Where a write lands once its missing maps exist.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Leaf {
    Key(String),
    Elem(OpId),
}

impl Leaf {
    pub fn to_key(&self) -> Key {
        match self {
            Leaf::Key(name) => Key::Map(name.clone()),
            Leaf::Elem(id) => Key::Seq(ElemRef::Id(*id)),
        }
    }
}

/// Outcome of planning a write.
#[derive(Debug, Clone)]
pub(crate) struct WritePlan {
    /// Deepest existing container on the path.
    pub parent: ObjId,
    /// Map keys to create below `parent`, outermost first.
    pub missing: Vec<String>,
    pub leaf: Leaf,
    /// The register currently at the leaf, if the whole path exists.
    pub existing: Option<Register>,
}

impl WritePlan {
    /// The object held at the leaf when it is of type `obj_type`.
    pub fn existing_object(&self, obj_type: ObjType) -> Option<ObjId> {
        match self.existing.as_ref()?.child() {
            Some((obj, found)) if found == obj_type => Some(obj),
            _ => None,
        }
    }
}

/// Plan a write to `path`, creating intermediate maps where keys are missing.
pub(crate) fn plan_write(ops: &OpSet, path: &Path) -> Result<WritePlan> {
    let Some((last, parents)) = path.split_last() else {
        return Err(PathError::EmptyPath {
            path: path.to_string(),
        }
        .into());
    };

    let mut parent = (ObjId::Root, ObjType::Map);
    let mut missing: Vec<String> = Vec::new();
    for (depth, segment) in parents.iter().enumerate() {
        if !missing.is_empty() {
            missing.push(key_below_missing(path, depth, segment)?);
            continue;
        }
        match step(ops, path, depth, parent, segment)? {
            Some((_, register)) => {
                parent = register.child().ok_or_else(|| CRDTError::TypeMismatch {
                    path: prefix(path, depth + 1),
                    expected: "map or list".to_string(),
                    actual: register.kind().to_string(),
                })?;
            }
            None => {
                if let PathSegment::Key(name) = segment {
                    missing.push(name.clone());
                }
            }
        }
    }

    let depth = parents.len();
    if !missing.is_empty() {
        let name = key_below_missing(path, depth, last)?;
        return Ok(WritePlan {
            parent: parent.0,
            missing,
            leaf: Leaf::Key(name),
            existing: None,
        });
    }

    let (leaf, existing) = match step(ops, path, depth, parent, last)? {
        Some((leaf, register)) => (leaf, Some(register.clone())),
        None => (Leaf::Key(key_below_missing(path, depth, last)?), None),
    };
    Ok(WritePlan {
        parent: parent.0,
        missing,
        leaf,
        existing,
    })
}

/// One step from an existing container. `Ok(None)` means a missing map key.
fn step<'a>(
    ops: &'a OpSet,
    path: &Path,
    depth: usize,
    (obj, obj_type): (ObjId, ObjType),
    segment: &PathSegment,
) -> Result<Option<(Leaf, &'a Register)>> {
    match (obj_type, segment) {
        (ObjType::Map, PathSegment::Key(name)) => Ok(ops
            .map(obj)
            .and_then(|entries| entries.get(name))
            .map(|register| (Leaf::Key(name.clone()), register))),
        (ObjType::List, PathSegment::Index(index)) => {
            let items = ops.list(obj).ok_or_else(|| CRDTError::NotFound {
                path: prefix(path, depth),
            })?;
            match items.get(*index) {
                Some(element) => Ok(Some((Leaf::Elem(element.id), &element.value))),
                None => Err(out_of_bounds(path, depth, *index, items.len()).into()),
            }
        }
        (found, segment) => Err(CRDTError::TypeMismatch {
            path: prefix(path, depth),
            expected: match segment {
                PathSegment::Key(_) => "map",
                PathSegment::Index(_) => "list",
            }
            .to_string(),
            actual: NodeKind::from(found).to_string(),
        }
        .into()),
    }
}

fn key_below_missing(path: &Path, depth: usize, segment: &PathSegment) -> Result<String> {
    match segment {
        PathSegment::Key(name) => Ok(name.clone()),
        PathSegment::Index(index) => Err(out_of_bounds(path, depth, *index, 0).into()),
    }
}

fn out_of_bounds(path: &Path, depth: usize, index: usize, len: usize) -> CRDTError {
    CRDTError::IndexOutOfBounds {
        path: prefix(path, depth),
        index,
        len,
    }
}

/// Text of the first `depth` segments of `path`, for error messages.
fn prefix(path: &Path, depth: usize) -> String {
    let mut partial = Path::root();
    for segment in &path.segments()[..depth.min(path.len())] {
        partial = match segment {
            PathSegment::Key(name) => partial.push_key(name.clone()),
            PathSegment::Index(index) => partial.push_index(*index),
        };
    }
    partial.to_string()
}
