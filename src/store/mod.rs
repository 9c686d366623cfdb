//! Context Store
//!
//! A `Store` is a handle to one mutable key/value map. Nodes created in merge
//! mode hold a shared handle to their parent's map; all other nodes hold an
//! independent copy taken at creation time.

use crate::types::{ContextKey, ContextValue};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct Store {
    entries: Arc<Mutex<HashMap<ContextKey, ContextValue>>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Independent copy of the current contents.
    pub fn fork(&self) -> Self {
        let entries = self.entries.lock().clone();
        Store {
            entries: Arc::new(Mutex::new(entries)),
        }
    }

    /// Another handle to the same map; writes through either are visible to both.
    pub fn share(&self) -> Self {
        self.clone()
    }

    pub fn ptr_eq(&self, other: &Store) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }

    pub fn get(&self, key: &ContextKey) -> Option<ContextValue> {
        self.entries.lock().get(key).cloned()
    }

    pub fn contains(&self, key: &ContextKey) -> bool {
        self.entries.lock().contains_key(key)
    }

    pub fn insert(&self, key: ContextKey, value: ContextValue) -> Option<ContextValue> {
        self.entries.lock().insert(key, value)
    }

    /// Remove a local entry. Returns true if one existed.
    pub fn remove(&self, key: &ContextKey) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    pub fn keys(&self) -> Vec<ContextKey> {
        self.entries.lock().keys().cloned().collect()
    }

    pub fn entries(&self) -> HashMap<ContextKey, ContextValue> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.entries.lock().iter()).finish()
    }
}
