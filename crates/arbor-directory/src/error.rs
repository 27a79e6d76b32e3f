use arbor_actor::ActorError;
use arbor_store::StoreError;
use arbor_types::DirectoryId;

/// Errors produced by directory-version operations.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// A snapshot has already been created under this id.
    #[error("directory version already exists: {0}")]
    AlreadyExists(DirectoryId),

    /// The declared size does not match the sum of the file sizes.
    /// `computed` is `None` when that sum overflows `u64`.
    #[error("invalid size: declared {declared}, files sum to {}", file_sum(.computed))]
    InvalidSize {
        declared: u64,
        computed: Option<u64>,
    },

    /// The snapshot names a different id than the entity it was sent to.
    #[error("snapshot id {actual} sent to directory version {expected}")]
    IdMismatch {
        expected: DirectoryId,
        actual: DirectoryId,
    },

    /// No snapshot has been created under this id.
    #[error("directory version not found: {0}")]
    NotFound(DirectoryId),

    /// Computing the flattened subtree failed somewhere below this node.
    #[error("recursive listing of {directory_id} failed: {source}")]
    AggregationFailed {
        directory_id: DirectoryId,
        #[source]
        source: Box<DirectoryError>,
    },

    /// The sizes below this node add up to more than `u64::MAX`.
    #[error("recursive size of {directory_id} overflows u64")]
    SizeOverflow { directory_id: DirectoryId },

    /// The request deadline elapsed before the subtree was aggregated.
    #[error("recursive operation on {directory_id} timed out")]
    Timeout { directory_id: DirectoryId },

    /// Durable state access failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The runtime could not deliver the call.
    #[error("actor error: {0}")]
    Actor(ActorError),
}

impl From<ActorError> for DirectoryError {
    fn from(err: ActorError) -> Self {
        match err {
            ActorError::Store(e) => DirectoryError::Store(e),
            other => DirectoryError::Actor(other),
        }
    }
}

fn file_sum(computed: &Option<u64>) -> String {
    match computed {
        Some(sum) => sum.to_string(),
        None => "more than u64::MAX".to_string(),
    }
}

/// Result alias for directory-version operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;
