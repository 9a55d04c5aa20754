//! In-memory registries of published values, keyed by opaque id.

use crate::domain::Snapshot;
use crate::engine::merkle::StoredTree;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("id already registered: {0}")]
pub struct Occupied(pub String);

/// Id -> immutable value map.
///
/// A value is fully built before [`Registry::insert`] publishes it under a
/// single write lock, so readers see either nothing or the complete value.
/// Published values are never replaced.
pub struct Registry<T> {
    entries: RwLock<HashMap<String, Arc<T>>>,
}

pub type SnapshotRegistry = Registry<Snapshot>;
pub type TreeRegistry = Registry<StoredTree>;

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `value` under `id`. Fails if the id is taken.
    pub fn insert(&self, id: impl Into<String>, value: T) -> Result<Arc<T>, Occupied> {
        let id = id.into();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.contains_key(&id) {
            return Err(Occupied(id));
        }
        let value = Arc::new(value);
        entries.insert(id, Arc::clone(&value));
        Ok(value)
    }

    pub fn get(&self, id: &str) -> Option<Arc<T>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Drop `id`. Outstanding `Arc`s stay valid.
    pub fn remove(&self, id: &str) -> Option<Arc<T>> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
