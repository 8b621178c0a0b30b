//! The JSON state file that carries a keyspace between runs.
//!
//! Documents are stored as base64 `SAVE` blobs, so reloading goes through the
//! same validated load path as the `LOAD` command.

use std::{collections::BTreeMap, fs, io::ErrorKind, path::Path};

use base64ct::{Base64, Encoding};
use kvdoc::{
    Document,
    commands::{Keyspace, MemoryHost},
    index::{IndexRegistry, ShadowRecord},
};
use serde::{Deserialize, Serialize};

type BoxError = Box<dyn std::error::Error>;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    documents: BTreeMap<String, String>,
    #[serde(default)]
    indexes: IndexRegistry,
    #[serde(default)]
    shadows: BTreeMap<String, ShadowRecord>,
}

/// Read the state file, or start empty when it does not exist yet.
pub fn load(path: &Path) -> Result<(Keyspace, MemoryHost), BoxError> {
    let state: StateFile = match fs::read_to_string(path) {
        Ok(text) => serde_json::from_str(&text)?,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no state file, starting empty");
            StateFile::default()
        }
        Err(e) => return Err(e.into()),
    };

    let mut keyspace = Keyspace::with_indexes(state.indexes);
    for (key, blob) in state.documents {
        let bytes = Base64::decode_vec(&blob).map_err(|e| format!("document '{key}': {e}"))?;
        let document = Document::load(&bytes).map_err(|e| format!("document '{key}': {e}"))?;
        keyspace.insert(key, document);
    }
    let host = MemoryHost {
        shadows: state.shadows,
        ..MemoryHost::default()
    };
    tracing::debug!(path = %path.display(), documents = keyspace.documents().count(), "loaded state");
    Ok((keyspace, host))
}

/// Write the keyspace and shadow records to the state file.
pub fn save(path: &Path, keyspace: &Keyspace, host: &MemoryHost) -> Result<(), BoxError> {
    let mut documents = BTreeMap::new();
    for (key, document) in keyspace.documents() {
        documents.insert(key.to_string(), Base64::encode_string(&document.save()?));
    }
    let state = StateFile {
        documents,
        indexes: keyspace.indexes().clone(),
        shadows: host.shadows.clone(),
    };
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, serde_json::to_string_pretty(&state)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
