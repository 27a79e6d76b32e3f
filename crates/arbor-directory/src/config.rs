use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What a failed recursive listing returns to its caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingFailureMode {
    /// Return [`DirectoryError::AggregationFailed`](crate::DirectoryError::AggregationFailed).
    #[default]
    Surface,
    /// Log a warning and return an empty listing. Kept for callers that
    /// depend on the historical behaviour; an empty answer is then
    /// indistinguishable from a failure.
    Empty,
}

/// Configuration shared by every directory-version activation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// How long a subtree listing stays cached before the eviction reminder
    /// deletes it.
    pub cache_ttl: Duration,
    /// Maximum outstanding child calls per recursive operation.
    pub max_concurrent_children: usize,
    /// Deadline applied to a recursive operation whose caller set none.
    pub aggregation_deadline: Duration,
    pub listing_failure_mode: ListingFailureMode,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(24 * 60 * 60),
            max_concurrent_children: 16,
            aggregation_deadline: Duration::from_secs(300),
            listing_failure_mode: ListingFailureMode::Surface,
        }
    }
}

impl DirectoryConfig {
    /// Fan-out bound, never below one.
    pub fn fan_out(&self) -> usize {
        self.max_concurrent_children.max(1)
    }
}
