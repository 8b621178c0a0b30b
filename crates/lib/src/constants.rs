//! Constants used throughout the kvdoc library.
//!
//! Wire markers for the binary formats and the naming rules shared between
//! the command surface and its host.

/// Magic prefix of every encoded change record.
pub const CHANGE_MAGIC: &[u8; 4] = b"KVCH";

/// Magic prefix of a persistence blob.
pub const BLOB_MAGIC: &[u8; 5] = b"KVDOC";

/// Current persistence blob format version.
pub const BLOB_VERSION: u8 = 1;

/// Optional namespace prefix accepted in front of command names.
pub const COMMAND_PREFIX: &str = "am.";

/// Prefix of the pub/sub channel that carries a key's change records.
pub const CHANGES_CHANNEL_PREFIX: &str = "changes:";

/// Pub/sub channel for change records produced by mutations of `key`.
pub fn changes_channel(key: &str) -> String {
    format!("{CHANGES_CHANNEL_PREFIX}{key}")
}
