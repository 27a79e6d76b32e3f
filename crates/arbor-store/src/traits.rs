use async_trait::async_trait;

use crate::error::StoreResult;
use crate::key::StateKey;

/// Durable key-value store for per-entity state.
///
/// All implementations must satisfy these invariants:
/// - Read-after-write consistency per key.
/// - `write` replaces the whole value stored under the key.
/// - The store never interprets slot contents.
/// - All I/O errors are propagated, never silently ignored.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the bytes stored under `key`.
    ///
    /// Returns `Ok(None)` if the slot is empty.
    async fn read(&self, key: &StateKey) -> StoreResult<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn write(&self, key: &StateKey, value: Vec<u8>) -> StoreResult<()>;

    /// Delete the slot. Returns `true` if it existed.
    async fn delete(&self, key: &StateKey) -> StoreResult<bool>;

    /// Every occupied key under `kind`, in no particular order.
    async fn list(&self, kind: &str) -> StoreResult<Vec<StateKey>>;

    /// Check whether the slot holds a value.
    async fn exists(&self, key: &StateKey) -> StoreResult<bool> {
        Ok(self.read(key).await?.is_some())
    }
}
