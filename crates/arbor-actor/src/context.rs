use std::time::Duration;

use arbor_store::{decode, encode, StateKey};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ActorResult;
use crate::id::ActorId;
use crate::runtime::ActorRuntime;

/// Per-activation handle passed to every [`Actor`](crate::Actor) callback.
///
/// State access is scoped to the entity's own `(kind, id)`: there is no way
/// to reach another entity's slots through a context. Other entities are
/// reached by calling them through [`runtime`](ActorContext::runtime).
pub struct ActorContext {
    runtime: ActorRuntime,
    kind: &'static str,
    id: ActorId,
}

impl ActorContext {
    pub(crate) fn new(runtime: ActorRuntime, kind: &'static str, id: ActorId) -> Self {
        Self { runtime, kind, id }
    }

    pub fn id(&self) -> &ActorId {
        &self.id
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn runtime(&self) -> &ActorRuntime {
        &self.runtime
    }

    fn key(&self, slot: &str) -> StateKey {
        StateKey::new(self.kind, self.id.as_str(), slot)
    }

    /// Load and decode a slot. `Ok(None)` means the slot is empty.
    pub async fn read_state<T: DeserializeOwned + Send>(&self, slot: &str) -> ActorResult<Option<T>> {
        let key = self.key(slot);
        match self.runtime.store().read(&key).await? {
            Some(bytes) => Ok(Some(decode(&key, &bytes)?)),
            None => Ok(None),
        }
    }

    /// Encode and persist a slot, replacing its previous value.
    pub async fn write_state<T: Serialize + Sync>(&self, slot: &str, value: &T) -> ActorResult<()> {
        let bytes = encode(value)?;
        self.runtime.store().write(&self.key(slot), bytes).await?;
        Ok(())
    }

    /// Delete a slot. Returns `true` if it held a value.
    pub async fn clear_state(&self, slot: &str) -> ActorResult<bool> {
        Ok(self.runtime.store().delete(&self.key(slot)).await?)
    }

    /// Arm (or re-arm) a named reminder for this entity.
    ///
    /// Any pending reminder with the same name is cancelled and replaced.
    pub async fn register_reminder(
        &self,
        name: &str,
        due: Duration,
        period: Option<Duration>,
    ) -> ActorResult<()> {
        self.runtime
            .register_reminder(self.kind, &self.id, name, due, period)
            .await
    }

    /// Cancel a named reminder. Returns `true` if one was pending.
    pub async fn unregister_reminder(&self, name: &str) -> ActorResult<bool> {
        self.runtime
            .unregister_reminder(self.kind, &self.id, name)
            .await
    }
}
