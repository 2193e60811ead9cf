//! Key-value store port.
//!
//! The on-disk database is an external collaborator; the chain writer
//! persists through this trait. The in-memory adapter backs tests and
//! single-process runs.

use crate::StateError;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Multiple readers, single writer during chain commit.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError>;

    /// Write a value.
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StateError>;

    /// Delete a key; absent keys are a no-op.
    fn delete(&self, key: &[u8]) -> Result<(), StateError>;
}

/// In-memory KV adapter.
#[derive(Default)]
pub struct MemoryDb {
    map: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryDb {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys (test hook).
    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    /// True when no keys are stored.
    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }
}

impl KeyValueStore for MemoryDb {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        Ok(self.map.read().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StateError> {
        self.map.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StateError> {
        self.map.write().remove(key);
        Ok(())
    }
}
