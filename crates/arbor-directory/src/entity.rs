use std::sync::Arc;

use arbor_actor::{Actor, ActorContext, ActorError, ActorId, ActorResult, ActorRuntime, CallContext, Reply};
use arbor_types::{DirectoryId, DirectoryVersion, FileVersion, Sha256Hash};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::cache::{self, CACHE_EVICTION_REMINDER};
use crate::config::DirectoryConfig;
use crate::error::{DirectoryError, DirectoryResult};

/// Slot holding the created snapshot.
pub const STATE_SLOT: &str = "DirectoryVersionState";

/// Register the directory-version entity type on a runtime.
pub fn register(runtime: &ActorRuntime, config: DirectoryConfig) {
    runtime.register::<DirectoryVersionActor>(config);
}

/// Requests accepted by a directory-version entity.
pub enum DirectoryVersionMessage {
    Exists {
        call: CallContext,
        reply: Reply<bool>,
    },
    Get {
        call: CallContext,
        reply: Reply<DirectoryResult<DirectoryVersion>>,
    },
    GetSha256Hash {
        call: CallContext,
        reply: Reply<DirectoryResult<Sha256Hash>>,
    },
    GetSize {
        call: CallContext,
        reply: Reply<DirectoryResult<u64>>,
    },
    GetFiles {
        call: CallContext,
        reply: Reply<DirectoryResult<Vec<FileVersion>>>,
    },
    GetDirectories {
        call: CallContext,
        reply: Reply<DirectoryResult<Vec<DirectoryId>>>,
    },
    GetCreatedAt {
        call: CallContext,
        reply: Reply<DirectoryResult<DateTime<Utc>>>,
    },
    GetSizeRecursive {
        call: CallContext,
        reply: Reply<DirectoryResult<u64>>,
    },
    GetDirectoryVersionsRecursive {
        force_regenerate: bool,
        call: CallContext,
        reply: Reply<DirectoryResult<Vec<DirectoryVersion>>>,
    },
    Create {
        snapshot: DirectoryVersion,
        call: CallContext,
        reply: Reply<DirectoryResult<()>>,
    },
    Delete {
        call: CallContext,
        reply: Reply<DirectoryResult<()>>,
    },
}

impl DirectoryVersionMessage {
    fn name(&self) -> &'static str {
        match self {
            Self::Exists { .. } => "Exists",
            Self::Get { .. } => "Get",
            Self::GetSha256Hash { .. } => "GetSha256Hash",
            Self::GetSize { .. } => "GetSize",
            Self::GetFiles { .. } => "GetFiles",
            Self::GetDirectories { .. } => "GetDirectories",
            Self::GetCreatedAt { .. } => "GetCreatedAt",
            Self::GetSizeRecursive { .. } => "GetSizeRecursive",
            Self::GetDirectoryVersionsRecursive { .. } => "GetDirectoryVersionsRecursive",
            Self::Create { .. } => "Create",
            Self::Delete { .. } => "Delete",
        }
    }

    fn call(&self) -> &CallContext {
        match self {
            Self::Exists { call, .. }
            | Self::Get { call, .. }
            | Self::GetSha256Hash { call, .. }
            | Self::GetSize { call, .. }
            | Self::GetFiles { call, .. }
            | Self::GetDirectories { call, .. }
            | Self::GetCreatedAt { call, .. }
            | Self::GetSizeRecursive { call, .. }
            | Self::GetDirectoryVersionsRecursive { call, .. }
            | Self::Create { call, .. }
            | Self::Delete { call, .. } => call,
        }
    }
}

/// The single-writer owner of one [`DirectoryVersion`].
///
/// `state` is `None` until a snapshot is created (or after it is deleted).
pub struct DirectoryVersionActor {
    pub(crate) directory_id: DirectoryId,
    pub(crate) state: Option<DirectoryVersion>,
    pub(crate) config: Arc<DirectoryConfig>,
}

impl DirectoryVersionActor {
    /// The created snapshot, or `NotFound`.
    pub(crate) fn snapshot(&self) -> DirectoryResult<&DirectoryVersion> {
        self.state
            .as_ref()
            .filter(|dv| dv.is_created())
            .ok_or(DirectoryError::NotFound(self.directory_id))
    }

    fn exists(&self) -> bool {
        self.snapshot().is_ok()
    }

    async fn create(&mut self, mut snapshot: DirectoryVersion, ctx: &ActorContext) -> DirectoryResult<()> {
        if self.exists() {
            return Err(DirectoryError::AlreadyExists(self.directory_id));
        }
        if !snapshot.has_consistent_size() {
            return Err(DirectoryError::InvalidSize {
                declared: snapshot.size,
                computed: snapshot.files_size(),
            });
        }
        if snapshot.directory_id != self.directory_id {
            return Err(DirectoryError::IdMismatch {
                expected: self.directory_id,
                actual: snapshot.directory_id,
            });
        }

        snapshot.created_at = Some(Utc::now());
        snapshot.recursive_size = None;
        ctx.write_state(STATE_SLOT, &snapshot).await?;

        info!(
            directory_id = %self.directory_id,
            files = snapshot.files.len(),
            directories = snapshot.directories.len(),
            size = snapshot.size,
            "directory version created"
        );
        self.state = Some(snapshot);
        Ok(())
    }

    async fn delete(&mut self, ctx: &ActorContext) -> DirectoryResult<()> {
        ctx.clear_state(STATE_SLOT).await?;
        cache::discard(ctx).await?;
        self.state = None;
        info!(directory_id = %self.directory_id, "directory version deleted");
        Ok(())
    }
}

#[async_trait]
impl Actor for DirectoryVersionActor {
    const KIND: &'static str = "DirectoryVersion";
    type Message = DirectoryVersionMessage;
    type Config = DirectoryConfig;

    async fn activate(
        id: &ActorId,
        config: Arc<Self::Config>,
        ctx: &ActorContext,
    ) -> ActorResult<Self> {
        let directory_id: DirectoryId = id.as_str().parse().map_err(|e| ActorError::InvalidId {
            kind: Self::KIND.to_string(),
            id: id.clone(),
            reason: format!("{e}"),
        })?;
        let state: Option<DirectoryVersion> = ctx.read_state(STATE_SLOT).await?;
        debug!(%directory_id, created = state.is_some(), "directory version activated");
        Ok(Self {
            directory_id,
            state,
            config,
        })
    }

    async fn handle(&mut self, message: Self::Message, ctx: &ActorContext) {
        debug!(
            directory_id = %self.directory_id,
            correlation_id = %message.call().correlation_id,
            method = message.name(),
            "handling"
        );
        match message {
            DirectoryVersionMessage::Exists { reply, .. } => {
                let _ = reply.send(self.exists());
            }
            DirectoryVersionMessage::Get { reply, .. } => {
                let _ = reply.send(self.snapshot().cloned());
            }
            DirectoryVersionMessage::GetSha256Hash { reply, .. } => {
                let _ = reply.send(self.snapshot().map(|dv| dv.sha256_hash));
            }
            DirectoryVersionMessage::GetSize { reply, .. } => {
                let _ = reply.send(self.snapshot().map(|dv| dv.size));
            }
            DirectoryVersionMessage::GetFiles { reply, .. } => {
                let _ = reply.send(self.snapshot().map(|dv| dv.files.clone()));
            }
            DirectoryVersionMessage::GetDirectories { reply, .. } => {
                let _ = reply.send(self.snapshot().map(|dv| dv.directories.clone()));
            }
            DirectoryVersionMessage::GetCreatedAt { reply, .. } => {
                let created_at = self.snapshot().and_then(|dv| {
                    dv.created_at
                        .ok_or(DirectoryError::NotFound(self.directory_id))
                });
                let _ = reply.send(created_at);
            }
            DirectoryVersionMessage::GetSizeRecursive { call, reply } => {
                let _ = reply.send(self.get_size_recursive(&call, ctx).await);
            }
            DirectoryVersionMessage::GetDirectoryVersionsRecursive {
                force_regenerate,
                call,
                reply,
            } => {
                let result = self
                    .get_directory_versions_recursive(force_regenerate, &call, ctx)
                    .await;
                let _ = reply.send(result);
            }
            DirectoryVersionMessage::Create { snapshot, reply, .. } => {
                let _ = reply.send(self.create(snapshot, ctx).await);
            }
            DirectoryVersionMessage::Delete { reply, .. } => {
                let _ = reply.send(self.delete(ctx).await);
            }
        }
    }

    async fn receive_reminder(&mut self, name: &str, ctx: &ActorContext) -> ActorResult<()> {
        match name {
            CACHE_EVICTION_REMINDER => {
                let evicted = cache::evict(ctx).await?;
                info!(directory_id = %self.directory_id, evicted, "subtree listing cache expired");
            }
            other => {
                debug!(directory_id = %self.directory_id, reminder = other, "unknown reminder ignored");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::cache::CACHE_SLOT;
    use crate::fixtures::*;

    // -----------------------------------------------------------------------
    // Creation guard
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn create_succeeds_once() {
        let h = harness(DirectoryConfig::default());
        let dv = leaf(&[3, 4]);
        let id = dv.directory_id;
        let client = h.client(id);

        client.create(dv.clone(), &call()).await.unwrap();
        let err = client.create(dv, &call()).await.unwrap_err();
        assert!(matches!(err, DirectoryError::AlreadyExists(existing) if existing == id));
    }

    #[tokio::test]
    async fn create_with_different_content_still_fails_after_success() {
        let h = harness(DirectoryConfig::default());
        let first = leaf(&[1]);
        let id = first.directory_id;
        h.client(id).create(first, &call()).await.unwrap();

        let mut second = leaf(&[9, 9]);
        second.directory_id = id;
        let err = h.client(id).create(second, &call()).await.unwrap_err();
        assert!(matches!(err, DirectoryError::AlreadyExists(_)));
        assert_eq!(h.client(id).get_size(&call()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn create_rejects_inconsistent_size_and_persists_nothing() {
        let h = harness(DirectoryConfig::default());
        let mut dv = leaf(&[3, 4]);
        dv.size = 5;
        let id = dv.directory_id;

        let err = h.client(id).create(dv, &call()).await.unwrap_err();
        assert!(matches!(
            err,
            DirectoryError::InvalidSize {
                declared: 5,
                computed: Some(7)
            }
        ));
        assert!(!h.slot_exists(id, STATE_SLOT).await);
        assert!(!h.client(id).exists(&call()).await.unwrap());
    }

    #[tokio::test]
    async fn create_rejects_file_sizes_that_overflow() {
        let h = harness(DirectoryConfig::default());
        let mut dv = leaf(&[u64::MAX, 1]);
        dv.size = 0;
        let id = dv.directory_id;

        let err = h.client(id).create(dv, &call()).await.unwrap_err();
        assert!(matches!(
            err,
            DirectoryError::InvalidSize {
                declared: 0,
                computed: None
            }
        ));
        assert!(err.to_string().contains("more than u64::MAX"));
        assert!(!h.slot_exists(id, STATE_SLOT).await);
    }

    #[tokio::test]
    async fn existence_is_checked_before_size() {
        let h = harness(DirectoryConfig::default());
        let dv = leaf(&[2]);
        let id = dv.directory_id;
        h.client(id).create(dv.clone(), &call()).await.unwrap();

        let mut bad = dv;
        bad.size = 100;
        let err = h.client(id).create(bad, &call()).await.unwrap_err();
        assert!(matches!(err, DirectoryError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn create_rejects_snapshot_for_another_id() {
        let h = harness(DirectoryConfig::default());
        let dv = leaf(&[1]);
        let other = DirectoryId::new();
        let err = h.client(other).create(dv.clone(), &call()).await.unwrap_err();
        assert!(matches!(
            err,
            DirectoryError::IdMismatch { expected, actual } if expected == other && actual == dv.directory_id
        ));
    }

    #[tokio::test]
    async fn create_stamps_time_and_clears_client_recursive_size() {
        let h = harness(DirectoryConfig::default());
        let mut dv = leaf(&[1, 1]);
        dv.recursive_size = Some(999);
        let id = dv.directory_id;
        let before = Utc::now();
        h.client(id).create(dv, &call()).await.unwrap();

        let stored = h.client(id).get(&call()).await.unwrap();
        assert!(stored.recursive_size.is_none());
        let created_at = h.client(id).get_created_at(&call()).await.unwrap();
        assert!(created_at >= before);
        assert_eq!(stored.created_at, Some(created_at));
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn accessors_return_created_content() {
        let h = harness(DirectoryConfig::default());
        let child = DirectoryId::new();
        let dv = node(vec![child], &[5, 6]);
        let id = dv.directory_id;
        h.client(id).create(dv.clone(), &call()).await.unwrap();
        let client = h.client(id);

        assert!(client.exists(&call()).await.unwrap());
        assert_eq!(client.get_size(&call()).await.unwrap(), 11);
        assert_eq!(client.get_sha256_hash(&call()).await.unwrap(), dv.sha256_hash);
        assert_eq!(client.get_files(&call()).await.unwrap(), dv.files);
        assert_eq!(client.get_directories(&call()).await.unwrap(), vec![child]);
    }

    #[tokio::test]
    async fn accessors_on_missing_entity_are_not_found() {
        let h = harness(DirectoryConfig::default());
        let id = DirectoryId::new();
        let client = h.client(id);

        assert!(!client.exists(&call()).await.unwrap());
        assert!(matches!(client.get(&call()).await, Err(DirectoryError::NotFound(missing)) if missing == id));
        assert!(matches!(client.get_size(&call()).await, Err(DirectoryError::NotFound(_))));
        assert!(matches!(client.get_files(&call()).await, Err(DirectoryError::NotFound(_))));
        assert!(matches!(client.get_created_at(&call()).await, Err(DirectoryError::NotFound(_))));
        assert!(matches!(
            client.get_size_recursive(&call()).await,
            Err(DirectoryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn state_survives_deactivation() {
        let h = harness_with_idle(DirectoryConfig::default(), Duration::from_millis(20));
        let dv = leaf(&[8]);
        let id = h.create(dv.clone()).await;

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!h.is_active(id));

        let stored = h.client(id).get(&call()).await.unwrap();
        assert_eq!(stored.files, dv.files);
        assert!(h.is_active(id));
    }

    #[tokio::test]
    async fn malformed_actor_id_fails_activation() {
        let h = harness(DirectoryConfig::default());
        let err = h
            .runtime
            .actor::<DirectoryVersionActor>("not-a-uuid")
            .call(|reply| DirectoryVersionMessage::Exists {
                call: call(),
                reply,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ActorError::CallAbandoned { .. }));
    }

    // -----------------------------------------------------------------------
    // Delete
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn delete_then_exists_is_false() {
        let h = harness(DirectoryConfig::default());
        let id = h.create(leaf(&[1])).await;
        let client = h.client(id);

        client.delete(&call()).await.unwrap();
        assert!(!client.exists(&call()).await.unwrap());
        assert!(!h.slot_exists(id, STATE_SLOT).await);
    }

    #[tokio::test]
    async fn delete_discards_cache_and_eviction() {
        let h = harness(DirectoryConfig::default());
        let id = h.create(leaf(&[1])).await;
        let client = h.client(id);
        client.get_directory_versions_recursive(false, &call()).await.unwrap();
        assert!(h.slot_exists(id, CACHE_SLOT).await);

        client.delete(&call()).await.unwrap();
        assert!(!h.slot_exists(id, CACHE_SLOT).await);
        assert!(h.runtime.pending_reminders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_of_missing_entity_is_ok() {
        let h = harness(DirectoryConfig::default());
        h.client(DirectoryId::new()).delete(&call()).await.unwrap();
    }

    #[tokio::test]
    async fn deleted_id_can_be_created_again() {
        let h = harness(DirectoryConfig::default());
        let dv = leaf(&[1]);
        let id = h.create(dv.clone()).await;
        h.client(id).delete(&call()).await.unwrap();
        h.client(id).create(dv, &call()).await.unwrap();
        assert!(h.client(id).exists(&call()).await.unwrap());
    }
}
