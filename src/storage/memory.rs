use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single version of a value: the payload plus the write timestamp in
/// nanoseconds since the Unix epoch, assigned by the coordinating node.
/// Versions with a larger timestamp win during read reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValueVersion {
    pub value: String,
    pub timestamp: i64,
}

/// In-memory key-value store holding the latest locally-known version per
/// key. Safe for concurrent access from multiple coordinator tasks.
pub struct MemoryStore {
    data: DashMap<String, ValueVersion>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
        }
    }

    /// Returns the stored version for `key`, if any.
    pub fn get(&self, key: &str) -> Option<ValueVersion> {
        self.data.get(key).map(|entry| entry.value().clone())
    }

    /// Unconditionally overwrites the version stored for `key`.
    pub fn put(&self, key: &str, version: ValueVersion) {
        self.data.insert(key.to_string(), version);
    }

    /// Snapshot of all entries, used by the administrative listing endpoint.
    pub fn all(&self) -> HashMap<String, ValueVersion> {
        self.data
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}
