//! Subtree-listing cache.
//!
//! The flattened subtree of a snapshot is expensive to assemble and never
//! changes, but it is proportional to the subtree size, so it is kept in its
//! own slot instead of the snapshot itself and expires. Every write arms the
//! one-shot [`CACHE_EVICTION_REMINDER`]; re-arming replaces the pending
//! reminder, so eviction always happens `cache_ttl` after the latest write.

use std::time::Duration;

use arbor_actor::{ActorContext, ActorResult};
use arbor_types::DirectoryVersion;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Slot holding the cached listing.
pub const CACHE_SLOT: &str = "DirectoryVersionCacheState";

/// Reminder that deletes [`CACHE_SLOT`].
pub const CACHE_EVICTION_REMINDER: &str = "cache eviction";

/// A cached flattened subtree: the owning snapshot first, then every
/// descendant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtreeListingCache {
    pub entries: Vec<DirectoryVersion>,
    pub cached_at: DateTime<Utc>,
}

impl SubtreeListingCache {
    pub fn new(entries: Vec<DirectoryVersion>) -> Self {
        Self {
            entries,
            cached_at: Utc::now(),
        }
    }
}

pub(crate) async fn load(ctx: &ActorContext) -> ActorResult<Option<SubtreeListingCache>> {
    ctx.read_state(CACHE_SLOT).await
}

/// Write the listing and (re-)arm its eviction.
pub(crate) async fn store(ctx: &ActorContext, cache: &SubtreeListingCache, ttl: Duration) -> ActorResult<()> {
    ctx.write_state(CACHE_SLOT, cache).await?;
    ctx.register_reminder(CACHE_EVICTION_REMINDER, ttl, None).await
}

/// Delete the listing. Returns `true` if one was cached.
pub(crate) async fn evict(ctx: &ActorContext) -> ActorResult<bool> {
    ctx.clear_state(CACHE_SLOT).await
}

/// Delete the listing and cancel its pending eviction.
pub(crate) async fn discard(ctx: &ActorContext) -> ActorResult<()> {
    evict(ctx).await?;
    ctx.unregister_reminder(CACHE_EVICTION_REMINDER).await?;
    Ok(())
}
