use arbor_store::StoreError;

use crate::id::ActorId;

/// Errors produced by the actor runtime.
#[derive(Debug, thiserror::Error)]
pub enum ActorError {
    /// No actor type has been registered under this kind.
    #[error("actor kind not registered: {0}")]
    UnregisteredKind(String),

    /// The activation went away before replying (activation failure or panic).
    #[error("{kind}/{id} dropped the call without replying")]
    CallAbandoned { kind: String, id: ActorId },

    /// The id cannot be mapped to the entity's natural key.
    #[error("invalid id {id} for {kind}: {reason}")]
    InvalidId {
        kind: String,
        id: ActorId,
        reason: String,
    },

    /// A reminder delay or period cannot be represented.
    #[error("invalid reminder {name}: {reason}")]
    InvalidReminder { name: String, reason: String },

    /// The runtime has been shut down.
    #[error("actor runtime is shut down")]
    Shutdown,

    /// Durable state access failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result alias for runtime operations.
pub type ActorResult<T> = Result<T, ActorError>;
