//! Recursive aggregation over the subdirectory graph.
//!
//! Both operations run inside the owning entity's handler and fan out to the
//! child entities through [`DirectoryVersionClient`], at most
//! [`DirectoryConfig::fan_out`](crate::DirectoryConfig::fan_out) calls in
//! flight. The whole fan-out runs under one deadline that is handed down to
//! every child, so a stalled or cyclic subtree surfaces as
//! [`DirectoryError::Timeout`] instead of hanging its ancestors.

use std::future::Future;

use arbor_actor::{ActorContext, ActorRuntime, CallContext};
use arbor_types::{DirectoryId, DirectoryVersion};
use futures::stream::{self, StreamExt, TryStreamExt};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::cache::{self, SubtreeListingCache};
use crate::client::DirectoryVersionClient;
use crate::config::ListingFailureMode;
use crate::entity::{DirectoryVersionActor, STATE_SLOT};
use crate::error::{DirectoryError, DirectoryResult};

/// Run `op` against every child with bounded concurrency and join on all of
/// them. The first failure cancels the calls still in flight.
async fn fan_out<T, F, Fut>(
    runtime: &ActorRuntime,
    parent: DirectoryId,
    children: &[DirectoryId],
    limit: usize,
    deadline: Instant,
    op: F,
) -> DirectoryResult<Vec<T>>
where
    F: Fn(DirectoryVersionClient) -> Fut,
    Fut: Future<Output = DirectoryResult<T>>,
{
    let pending: Vec<Fut> = children
        .iter()
        .map(|&child| op(DirectoryVersionClient::new(runtime, child)))
        .collect();
    let calls = stream::iter(pending)
        .buffer_unordered(limit)
        .try_collect::<Vec<T>>();

    match tokio::time::timeout_at(deadline, calls).await {
        Ok(result) => result,
        Err(_) => Err(DirectoryError::Timeout {
            directory_id: parent,
        }),
    }
}

impl DirectoryVersionActor {
    /// Deadline for this call's fan-out, or `Timeout` if it already passed.
    fn fan_out_deadline(&self, call: &CallContext) -> DirectoryResult<Instant> {
        if call.is_expired() {
            return Err(DirectoryError::Timeout {
                directory_id: self.directory_id,
            });
        }
        Ok(call.deadline_or(self.config.aggregation_deadline))
    }

    pub(crate) async fn get_size_recursive(
        &mut self,
        call: &CallContext,
        ctx: &ActorContext,
    ) -> DirectoryResult<u64> {
        let snapshot = self.snapshot()?;
        if let Some(total) = snapshot.recursive_size {
            return Ok(total);
        }
        let own = snapshot.size;
        let children = snapshot.directories.clone();

        let deadline = self.fan_out_deadline(call)?;
        let child_call = call.child(deadline);
        let sizes = fan_out(
            ctx.runtime(),
            self.directory_id,
            &children,
            self.config.fan_out(),
            deadline,
            |client| {
                let child_call = child_call.clone();
                async move { client.get_size_recursive(&child_call).await }
            },
        )
        .await?;

        let total = sizes
            .into_iter()
            .try_fold(own, u64::checked_add)
            .ok_or(DirectoryError::SizeOverflow {
                directory_id: self.directory_id,
            })?;
        if let Some(state) = self.state.as_mut() {
            state.recursive_size = Some(total);
            ctx.write_state(STATE_SLOT, &*state).await?;
        }
        debug!(
            directory_id = %self.directory_id,
            correlation_id = %call.correlation_id,
            children = children.len(),
            total,
            "recursive size computed"
        );
        Ok(total)
    }

    pub(crate) async fn get_directory_versions_recursive(
        &mut self,
        force_regenerate: bool,
        call: &CallContext,
        ctx: &ActorContext,
    ) -> DirectoryResult<Vec<DirectoryVersion>> {
        match self.list_subtree(force_regenerate, call, ctx).await {
            Ok(entries) => Ok(entries),
            Err(e @ DirectoryError::Timeout { .. }) => Err(e),
            Err(e) => match self.config.listing_failure_mode {
                ListingFailureMode::Surface => Err(e),
                ListingFailureMode::Empty => {
                    warn!(
                        directory_id = %self.directory_id,
                        correlation_id = %call.correlation_id,
                        error = %e,
                        "recursive listing failed, returning empty listing"
                    );
                    Ok(Vec::new())
                }
            },
        }
    }

    async fn list_subtree(
        &mut self,
        force_regenerate: bool,
        call: &CallContext,
        ctx: &ActorContext,
    ) -> DirectoryResult<Vec<DirectoryVersion>> {
        let snapshot = self.snapshot()?.clone();

        if !force_regenerate {
            if let Some(cached) = cache::load(ctx).await? {
                debug!(
                    directory_id = %self.directory_id,
                    correlation_id = %call.correlation_id,
                    entries = cached.entries.len(),
                    "subtree listing cache hit"
                );
                return Ok(cached.entries);
            }
        }

        let deadline = self.fan_out_deadline(call)?;
        let child_call = call.child(deadline);
        let directory_id = self.directory_id;
        let listings = fan_out(
            ctx.runtime(),
            directory_id,
            &snapshot.directories,
            self.config.fan_out(),
            deadline,
            |client| {
                let child_call = child_call.clone();
                async move {
                    client
                        .get_directory_versions_recursive(force_regenerate, &child_call)
                        .await
                }
            },
        )
        .await
        .map_err(|e| match e {
            DirectoryError::Timeout { .. } => e,
            other => DirectoryError::AggregationFailed {
                directory_id,
                source: Box::new(other),
            },
        })?;

        let mut entries = Vec::with_capacity(1 + listings.iter().map(Vec::len).sum::<usize>());
        entries.push(snapshot);
        entries.extend(listings.into_iter().flatten());

        let cached = SubtreeListingCache::new(entries);
        if let Err(e) = cache::store(ctx, &cached, self.config.cache_ttl).await {
            warn!(directory_id = %directory_id, error = %e, "failed to cache subtree listing");
        }
        debug!(
            directory_id = %directory_id,
            correlation_id = %call.correlation_id,
            entries = cached.entries.len(),
            force_regenerate,
            "subtree listing computed"
        );
        Ok(cached.entries)
    }
}
