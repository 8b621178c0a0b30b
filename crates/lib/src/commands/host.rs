//! The boundary between the command surface and the server hosting it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::CommandError;
use crate::index::ShadowRecord;

/// Side effects a command asks of its host.
///
/// Calls happen inline, after the document mutation has succeeded.
pub trait Host {
    /// Emit a keyspace notification such as `am.puttext` for `key`.
    fn notify_keyspace_event(&mut self, event: &str, key: &str);

    /// Publish `payload` on a pub/sub channel.
    fn publish(&mut self, channel: &str, payload: &[u8]);

    /// Forward a write command to replicas and the append-only log.
    ///
    /// `command` is the prefixed name (`am.puttext`); `argv` holds the key
    /// followed by the command's arguments exactly as received.
    fn replicate(&mut self, command: &str, argv: &[&[u8]]);

    /// Replace the shadow record stored for `key`.
    fn write_shadow(&mut self, key: &str, record: &ShadowRecord) -> Result<(), CommandError>;
}

/// A host that records every side effect in memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryHost {
    /// `(event, key)` in emission order
    #[serde(skip)]
    pub events: Vec<(String, String)>,
    /// `(channel, payload)` in publication order
    #[serde(skip)]
    pub messages: Vec<(String, Vec<u8>)>,
    /// `(command, argv)` in replication order
    #[serde(skip)]
    pub replicated: Vec<(String, Vec<Vec<u8>>)>,
    /// Current shadow record per key
    pub shadows: BTreeMap<String, ShadowRecord>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shadow(&self, key: &str) -> Option<&ShadowRecord> {
        self.shadows.get(key)
    }

    /// Remove and return the events and messages recorded so far.
    pub fn drain(&mut self) -> (Vec<(String, String)>, Vec<(String, Vec<u8>)>) {
        (
            std::mem::take(&mut self.events),
            std::mem::take(&mut self.messages),
        )
    }

    /// Remove and return the commands replicated so far.
    pub fn take_replicated(&mut self) -> Vec<(String, Vec<Vec<u8>>)> {
        std::mem::take(&mut self.replicated)
    }
}

impl Host for MemoryHost {
    fn notify_keyspace_event(&mut self, event: &str, key: &str) {
        self.events.push((event.to_string(), key.to_string()));
    }

    fn publish(&mut self, channel: &str, payload: &[u8]) {
        self.messages.push((channel.to_string(), payload.to_vec()));
    }

    fn replicate(&mut self, command: &str, argv: &[&[u8]]) {
        self.replicated.push((
            command.to_string(),
            argv.iter().map(|arg| arg.to_vec()).collect(),
        ));
    }

    fn write_shadow(&mut self, key: &str, record: &ShadowRecord) -> Result<(), CommandError> {
        self.shadows.insert(key.to_string(), record.clone());
        Ok(())
    }
}
