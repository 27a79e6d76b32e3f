use std::fmt;

use serde::{Deserialize, Serialize};

/// Address of one durable slot: `(entity-type, entity-id, slot-name)`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateKey {
    pub kind: String,
    pub id: String,
    pub slot: String,
}

impl StateKey {
    pub fn new(kind: impl Into<String>, id: impl Into<String>, slot: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
            slot: slot.into(),
        }
    }
}

impl fmt::Debug for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateKey({self})")
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.id, self.slot)
    }
}
