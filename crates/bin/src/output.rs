//! Output formatting helpers for human-readable and JSON output.

use base64ct::{Base64, Encoding};
use kvdoc::{commands::Reply, index::ShadowRecord};
use serde_json::Value;

use crate::cli::Format;

/// Render a reply the way redis-cli would, binary payloads as base64.
pub fn human(reply: &Reply) -> String {
    let mut out = String::new();
    write_human(&mut out, reply, 0);
    out
}

fn write_human(out: &mut String, reply: &Reply, indent: usize) {
    match reply {
        Reply::Ok => out.push_str("OK"),
        Reply::Null => out.push_str("(nil)"),
        Reply::Integer(v) => out.push_str(&format!("(integer) {v}")),
        Reply::Double(v) => out.push_str(&format!("(double) {v}")),
        Reply::Bulk(text) => out.push_str(&format!("{text:?}")),
        Reply::Binary(bytes) => out.push_str(&format!("(binary) {}", Base64::encode_string(bytes))),
        Reply::Array(items) if items.is_empty() => out.push_str("(empty array)"),
        Reply::Array(items) => {
            // Nested items line up under their parent's text, as in redis-cli.
            let width = items.len().to_string().len();
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push('\n');
                    out.push_str(&" ".repeat(indent));
                }
                let label = format!("{:>width$}) ", i + 1);
                out.push_str(&label);
                write_human(out, item, indent + label.len());
            }
        }
    }
}

/// A reply as JSON; binary payloads become base64 strings.
pub fn json(reply: &Reply) -> Value {
    match reply {
        Reply::Ok => Value::from("OK"),
        Reply::Null => Value::Null,
        Reply::Integer(v) => Value::from(*v),
        Reply::Double(v) => Value::from(*v),
        Reply::Bulk(text) => Value::from(text.as_str()),
        Reply::Binary(bytes) => Value::from(Base64::encode_string(bytes)),
        Reply::Array(items) => Value::Array(items.iter().map(json).collect()),
    }
}

pub fn print_reply(reply: &Reply, format: Format) {
    match format {
        Format::Human => println!("{}", human(reply)),
        Format::Json => println!("{}", json(reply)),
    }
}

pub fn print_error(message: &str, format: Format) {
    match format {
        Format::Human => println!("(error) {message}"),
        Format::Json => println!("{}", serde_json::json!({ "error": message })),
    }
}

pub fn print_shadow(key: &str, record: Option<&ShadowRecord>, format: Format) {
    match (format, record) {
        (Format::Json, record) => println!("{}", serde_json::json!({ "key": key, "fields": record })),
        (Format::Human, None) => println!("(no shadow record for {key})"),
        (Format::Human, Some(record)) if record.is_empty() => println!("(empty shadow record)"),
        (Format::Human, Some(record)) => {
            for (field, value) in record {
                println!("{field}: {value:?}");
            }
        }
    }
}
