//! JSON bridge.
//!
//! Export maps the tree onto plain JSON: maps become objects with sorted keys,
//! lists arrays, text strings, counters their current sum and timestamps
//! RFC 3339 strings. Import is the inverse for what JSON can express: objects,
//! arrays, strings, booleans, and numbers as Int when they fit an `i64` or
//! Double otherwise. Counters and timestamps cannot be requested on import.

mod errors;

use chrono::{DateTime, SecondsFormat};
use serde_json::{Map as JsonMap, Number, Value};

pub use errors::JsonError;

use crate::{
    Document, Result,
    crdt::{
        ObjId, ObjType, Object, OpSet, Register, ScalarValue, Slot,
        op::{Key, Op, OpAction},
    },
    document::Transaction,
};

impl Document {
    /// The document as a JSON value.
    pub fn to_json_value(&self) -> Value {
        object_to_json(&self.ops, ObjId::Root)
    }

    /// The document as JSON text, indented when `pretty` is set.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let value = self.to_json_value();
        let rendered = if pretty {
            serde_json::to_string_pretty(&value)
        } else {
            serde_json::to_string(&value)
        };
        Ok(rendered.map_err(|e| JsonError::Render {
            reason: e.to_string(),
        })?)
    }

    /// Build a new document from JSON text in a single change.
    ///
    /// `null` members and elements are skipped.
    pub fn from_json(text: &str) -> Result<Document> {
        let value: Value = serde_json::from_str(text).map_err(|e| JsonError::Parse {
            reason: e.to_string(),
        })?;
        let members = match value {
            Value::Object(members) => members,
            other => {
                return Err(JsonError::RootNotObject {
                    found: json_type(&other).to_string(),
                }
                .into());
            }
        };
        let mut document = Document::new();
        let mut tx = document.transaction();
        import_members(&mut tx, ObjId::Root, &members)?;
        let change = tx.commit()?;
        tracing::info!(ops = change.len(), "imported document from json");
        Ok(document)
    }
}

fn object_to_json(ops: &OpSet, obj: ObjId) -> Value {
    match ops.object(obj) {
        Some(Object::Map(entries)) => Value::Object(
            entries
                .iter()
                .map(|(key, register)| (key.clone(), register_to_json(ops, register)))
                .collect::<JsonMap<String, Value>>(),
        ),
        Some(Object::List(items)) => Value::Array(
            items
                .values()
                .map(|register| register_to_json(ops, register))
                .collect(),
        ),
        Some(Object::Text(chars)) => Value::String(chars.values().collect()),
        None => Value::Null,
    }
}

fn register_to_json(ops: &OpSet, register: &Register) -> Value {
    match &register.slot {
        Slot::Object(_) => object_to_json(ops, ObjId::Op(register.id)),
        Slot::Scalar(value) => scalar_to_json(value),
    }
}

fn scalar_to_json(value: &ScalarValue) -> Value {
    match *value {
        ScalarValue::Int(v) | ScalarValue::Counter(v) => Value::from(v),
        ScalarValue::Double(v) => Number::from_f64(v).map_or(Value::Null, Value::Number),
        ScalarValue::Bool(v) => Value::Bool(v),
        ScalarValue::Timestamp(ms) => match DateTime::from_timestamp_millis(ms) {
            Some(time) => Value::String(time.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => Value::from(ms),
        },
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Where an imported value goes.
enum Place<'a> {
    Member(ObjId, &'a str),
    Append(ObjId),
}

fn import_members(tx: &mut Transaction<'_>, obj: ObjId, members: &JsonMap<String, Value>) -> Result<()> {
    for (key, value) in members {
        import_value(tx, Place::Member(obj, key), value)?;
    }
    Ok(())
}

fn import_value(tx: &mut Transaction<'_>, place: Place<'_>, value: &Value) -> Result<()> {
    let action = match value {
        Value::Null => return Ok(()),
        Value::Bool(v) => OpAction::Set(ScalarValue::Bool(*v)),
        Value::Number(n) => match n.as_i64() {
            Some(v) => OpAction::Set(ScalarValue::Int(v)),
            None => OpAction::Set(ScalarValue::Double(n.as_f64().unwrap_or(f64::NAN))),
        },
        Value::String(_) => OpAction::Make(ObjType::Text),
        Value::Array(_) => OpAction::Make(ObjType::List),
        Value::Object(_) => OpAction::Make(ObjType::Map),
    };
    let id = match place {
        Place::Member(obj, key) => tx.push(Op::put(obj, Key::Map(key.to_string()), action))?,
        Place::Append(list) => tx.append(list, action)?,
    };
    let child = ObjId::Op(id);
    match value {
        Value::String(text) => tx.splice(child, 0, 0, text)?,
        Value::Array(items) => {
            for item in items {
                import_value(tx, Place::Append(child), item)?;
            }
        }
        Value::Object(members) => import_members(tx, child, members)?,
        _ => {}
    }
    Ok(())
}
