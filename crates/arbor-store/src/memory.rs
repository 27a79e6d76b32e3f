use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::key::StateKey;
use crate::traits::StateStore;

/// In-memory, HashMap-based state store.
///
/// Intended for tests and embedding. All slots are held in memory behind a
/// `RwLock` for safe concurrent access.
pub struct InMemoryStateStore {
    slots: RwLock<HashMap<StateKey, Vec<u8>>>,
}

impl InMemoryStateStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.read().expect("lock poisoned").len()
    }

    /// Returns `true` if no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.slots.read().expect("lock poisoned").is_empty()
    }

    /// Sorted list of all occupied keys.
    pub fn keys(&self) -> Vec<StateKey> {
        let map = self.slots.read().expect("lock poisoned");
        let mut keys: Vec<StateKey> = map.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Remove every slot.
    pub fn clear(&self) {
        self.slots.write().expect("lock poisoned").clear();
    }
}

impl Default for InMemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn read(&self, key: &StateKey) -> StoreResult<Option<Vec<u8>>> {
        let map = self.slots.read().expect("lock poisoned");
        Ok(map.get(key).cloned())
    }

    async fn write(&self, key: &StateKey, value: Vec<u8>) -> StoreResult<()> {
        let mut map = self.slots.write().expect("lock poisoned");
        map.insert(key.clone(), value);
        Ok(())
    }

    async fn delete(&self, key: &StateKey) -> StoreResult<bool> {
        let mut map = self.slots.write().expect("lock poisoned");
        Ok(map.remove(key).is_some())
    }

    async fn list(&self, kind: &str) -> StoreResult<Vec<StateKey>> {
        let map = self.slots.read().expect("lock poisoned");
        Ok(map.keys().filter(|key| key.kind == kind).cloned().collect())
    }

    async fn exists(&self, key: &StateKey) -> StoreResult<bool> {
        let map = self.slots.read().expect("lock poisoned");
        Ok(map.contains_key(key))
    }
}

impl std::fmt::Debug for InMemoryStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStateStore")
            .field("slot_count", &self.len())
            .finish()
    }
}
