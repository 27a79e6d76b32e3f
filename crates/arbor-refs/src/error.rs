//! Error types for reference operations.

use arbor_actor::ActorError;
use arbor_store::StoreError;
use arbor_types::ReferenceId;
use thiserror::Error;

/// Errors that can occur during reference operations.
#[derive(Debug, Error)]
pub enum ReferenceError {
    /// No reference has been created under this id.
    #[error("reference not found: {0}")]
    NotFound(ReferenceId),

    /// Durable state access failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The runtime could not deliver the call.
    #[error("actor error: {0}")]
    Actor(ActorError),
}

impl From<ActorError> for ReferenceError {
    fn from(err: ActorError) -> Self {
        match err {
            ActorError::Store(e) => ReferenceError::Store(e),
            other => ReferenceError::Actor(other),
        }
    }
}

/// Convenience type alias for reference operations.
pub type ReferenceResult<T> = Result<T, ReferenceError>;
