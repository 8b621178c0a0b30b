//! Shadow indexing.
//!
//! An [`IndexRegistry`] maps key-name glob patterns to the document paths that
//! should be mirrored into a flat [`ShadowRecord`] for an external search
//! engine. The registry only decides *what* to project; writing the record
//! somewhere is the host's job (see [`crate::commands::Host`]).
//!
//! Field names are the configured paths with a leading `$.` removed and dots
//! replaced by underscores, so `$.author.name` becomes `author_name`. Only
//! leaves with a present value are projected.

mod errors;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use errors::IndexError;

use crate::{Document, NodeValue, Path, Result};

/// A flat field to value projection of one document.
pub type ShadowRecord = BTreeMap<String, String>;

/// The index configuration for one key pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Glob matched against key names, e.g. `article:*`
    pub pattern: String,
    /// Disabled configs are kept but never project
    pub enabled: bool,
    /// Paths to project, in configuration order
    pub paths: Vec<String>,
}

impl IndexConfig {
    /// Check if `key` matches this config's pattern.
    pub fn matches(&self, key: &str) -> bool {
        glob::Pattern::new(&self.pattern)
            .map(|pattern| pattern.matches(key))
            .unwrap_or(false)
    }

    /// Field names paired with the paths they are read from.
    pub fn fields(&self) -> impl Iterator<Item = (String, &str)> {
        self.paths
            .iter()
            .map(|path| (field_name(path), path.as_str()))
    }
}

/// All index configurations known to a host, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRegistry {
    configs: Vec<IndexConfig>,
}

impl IndexRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    pub fn configs(&self) -> &[IndexConfig] {
        &self.configs
    }

    /// Configure `pattern` to project `paths`.
    ///
    /// Replaces any existing config for the same pattern in place and leaves
    /// it enabled. Nothing changes if the pattern or any path is invalid.
    pub fn configure<I, S>(&mut self, pattern: &str, paths: I) -> Result<&IndexConfig>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        glob::Pattern::new(pattern).map_err(|e| IndexError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        let paths: Vec<String> = paths.into_iter().map(Into::into).collect();
        if paths.is_empty() {
            return Err(IndexError::NoPaths {
                pattern: pattern.to_string(),
            }
            .into());
        }
        for path in &paths {
            Path::parse(path).map_err(|e| IndexError::InvalidPath {
                pattern: pattern.to_string(),
                path: path.clone(),
                reason: e.to_string(),
            })?;
        }

        let config = IndexConfig {
            pattern: pattern.to_string(),
            enabled: true,
            paths,
        };
        let slot = match self.position(pattern) {
            Some(slot) => {
                self.configs[slot] = config;
                slot
            }
            None => {
                self.configs.push(config);
                self.configs.len() - 1
            }
        };
        tracing::debug!(pattern, paths = self.configs[slot].paths.len(), "configured index");
        Ok(&self.configs[slot])
    }

    /// Resume projection for `pattern`.
    pub fn enable(&mut self, pattern: &str) -> Result<()> {
        self.set_enabled(pattern, true)
    }

    /// Stop projecting for `pattern` without forgetting its paths.
    pub fn disable(&mut self, pattern: &str) -> Result<()> {
        self.set_enabled(pattern, false)
    }

    /// The config for exactly `pattern`, if any.
    pub fn status(&self, pattern: &str) -> Option<&IndexConfig> {
        self.configs.iter().find(|config| config.pattern == pattern)
    }

    /// The first enabled config whose pattern matches `key`.
    pub fn matching(&self, key: &str) -> Option<&IndexConfig> {
        self.configs
            .iter()
            .find(|config| config.enabled && config.matches(key))
    }

    fn position(&self, pattern: &str) -> Option<usize> {
        self.configs
            .iter()
            .position(|config| config.pattern == pattern)
    }

    fn set_enabled(&mut self, pattern: &str, enabled: bool) -> Result<()> {
        let slot = self
            .position(pattern)
            .ok_or_else(|| IndexError::NotConfigured {
                pattern: pattern.to_string(),
            })?;
        self.configs[slot].enabled = enabled;
        Ok(())
    }
}

/// The shadow field name for a configured path.
pub fn field_name(path: &str) -> String {
    path.strip_prefix("$.").unwrap_or(path).replace('.', "_")
}

/// Project the configured paths of `document`.
///
/// Absent paths and containers are omitted rather than written as empty values.
pub fn project(document: &Document, config: &IndexConfig) -> Result<ShadowRecord> {
    let mut record = ShadowRecord::new();
    for (field, path) in config.fields() {
        let value = match document.get(path)? {
            Some(NodeValue::Text(text)) => text,
            Some(NodeValue::Scalar(scalar)) => scalar.to_string(),
            Some(NodeValue::Map { .. } | NodeValue::List { .. }) | None => continue,
        };
        record.insert(field, value);
    }
    Ok(record)
}
