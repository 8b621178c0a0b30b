//! Conflict-free replicated data types backing a document.
//!
//! The engine is op-based: every edit is an op with a globally
//! unique [`OpId`], and the op set materializes the current tree from the
//! ops it has been given. Map keys and list slots are last-writer-wins
//! registers, counters sum their increments, and lists and text are
//! replicated growable arrays.

mod errors;
pub(crate) mod op;
pub(crate) mod opset;
pub(crate) mod sequence;
mod types;
mod value;

pub use errors::CRDTError;
pub(crate) use sequence::ElemRef;
pub use types::{ActorId, ObjId, ObjType, OpId};
pub use value::{NodeKind, ScalarValue};

pub(crate) use opset::{Object, OpSet, Register, Slot};
pub(crate) use sequence::Sequence;
