//! Slot value encoding.
//!
//! Slot values are bincode-encoded. Decoding failures are reported as
//! [`StoreError::CorruptSlot`] so the offending key shows up in logs.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{StoreError, StoreResult};
use crate::key::StateKey;

/// Encode a slot value.
pub fn encode<T: Serialize>(value: &T) -> StoreResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Decode the value read from `key`.
pub fn decode<T: DeserializeOwned>(key: &StateKey, bytes: &[u8]) -> StoreResult<T> {
    bincode::deserialize(bytes).map_err(|e| StoreError::CorruptSlot {
        key: key.clone(),
        reason: e.to_string(),
    })
}
