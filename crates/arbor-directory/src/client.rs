use arbor_actor::{ActorRef, ActorRuntime, CallContext};
use arbor_types::{DirectoryId, DirectoryVersion, FileVersion, Sha256Hash};
use chrono::{DateTime, Utc};

use crate::entity::{DirectoryVersionActor, DirectoryVersionMessage};
use crate::error::DirectoryResult;

/// Typed handle for calling one directory-version entity.
///
/// Cloning is cheap. Delivery failures of the runtime are reported as
/// [`DirectoryError::Actor`](crate::DirectoryError::Actor).
#[derive(Clone, Debug)]
pub struct DirectoryVersionClient {
    actor: ActorRef<DirectoryVersionActor>,
    directory_id: DirectoryId,
}

impl DirectoryVersionClient {
    pub fn new(runtime: &ActorRuntime, directory_id: DirectoryId) -> Self {
        Self {
            actor: runtime.actor::<DirectoryVersionActor>(directory_id.to_string()),
            directory_id,
        }
    }

    pub fn directory_id(&self) -> DirectoryId {
        self.directory_id
    }

    pub async fn exists(&self, call: &CallContext) -> DirectoryResult<bool> {
        let call = call.clone();
        Ok(self
            .actor
            .call(|reply| DirectoryVersionMessage::Exists { call, reply })
            .await?)
    }

    pub async fn get(&self, call: &CallContext) -> DirectoryResult<DirectoryVersion> {
        let call = call.clone();
        self.actor
            .call(|reply| DirectoryVersionMessage::Get { call, reply })
            .await?
    }

    pub async fn get_sha256_hash(&self, call: &CallContext) -> DirectoryResult<Sha256Hash> {
        let call = call.clone();
        self.actor
            .call(|reply| DirectoryVersionMessage::GetSha256Hash { call, reply })
            .await?
    }

    pub async fn get_size(&self, call: &CallContext) -> DirectoryResult<u64> {
        let call = call.clone();
        self.actor
            .call(|reply| DirectoryVersionMessage::GetSize { call, reply })
            .await?
    }

    pub async fn get_files(&self, call: &CallContext) -> DirectoryResult<Vec<FileVersion>> {
        let call = call.clone();
        self.actor
            .call(|reply| DirectoryVersionMessage::GetFiles { call, reply })
            .await?
    }

    pub async fn get_directories(&self, call: &CallContext) -> DirectoryResult<Vec<DirectoryId>> {
        let call = call.clone();
        self.actor
            .call(|reply| DirectoryVersionMessage::GetDirectories { call, reply })
            .await?
    }

    pub async fn get_created_at(&self, call: &CallContext) -> DirectoryResult<DateTime<Utc>> {
        let call = call.clone();
        self.actor
            .call(|reply| DirectoryVersionMessage::GetCreatedAt { call, reply })
            .await?
    }

    /// Total size of the subtree rooted here. Computed once, then memoized.
    pub async fn get_size_recursive(&self, call: &CallContext) -> DirectoryResult<u64> {
        let call = call.clone();
        self.actor
            .call(|reply| DirectoryVersionMessage::GetSizeRecursive { call, reply })
            .await?
    }

    /// The flattened subtree, this snapshot first.
    ///
    /// Served from the listing cache unless `force_regenerate` is set; a
    /// forced call recomputes the whole subtree and refreshes every cache
    /// along the way.
    pub async fn get_directory_versions_recursive(
        &self,
        force_regenerate: bool,
        call: &CallContext,
    ) -> DirectoryResult<Vec<DirectoryVersion>> {
        let call = call.clone();
        self.actor
            .call(|reply| DirectoryVersionMessage::GetDirectoryVersionsRecursive {
                force_regenerate,
                call,
                reply,
            })
            .await?
    }

    pub async fn create(&self, snapshot: DirectoryVersion, call: &CallContext) -> DirectoryResult<()> {
        let call = call.clone();
        self.actor
            .call(|reply| DirectoryVersionMessage::Create {
                snapshot,
                call,
                reply,
            })
            .await?
    }

    pub async fn delete(&self, call: &CallContext) -> DirectoryResult<()> {
        let call = call.clone();
        self.actor
            .call(|reply| DirectoryVersionMessage::Delete { call, reply })
            .await?
    }
}
