//! Shared helpers for this crate's tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arbor_actor::{Actor, ActorId, ActorRuntime, CallContext, RuntimeConfig};
use arbor_store::{InMemoryStateStore, StateKey, StateStore, StoreResult};
use arbor_types::{DirectoryId, DirectoryVersion, FileVersion, RepositoryId, Sha256Hash};
use async_trait::async_trait;

use crate::client::DirectoryVersionClient;
use crate::config::DirectoryConfig;
use crate::entity::{register, DirectoryVersionActor};

pub(crate) struct Harness {
    pub runtime: ActorRuntime,
    pub store: Arc<dyn StateStore>,
}

pub(crate) fn harness(config: DirectoryConfig) -> Harness {
    harness_with_idle(config, Duration::from_secs(60))
}

pub(crate) fn harness_with_idle(config: DirectoryConfig, idle_timeout: Duration) -> Harness {
    harness_on(Arc::new(InMemoryStateStore::new()), config, idle_timeout)
}

pub(crate) fn harness_on(
    store: Arc<dyn StateStore>,
    config: DirectoryConfig,
    idle_timeout: Duration,
) -> Harness {
    let runtime = ActorRuntime::new(
        Arc::clone(&store),
        RuntimeConfig {
            idle_timeout,
            ..Default::default()
        },
    );
    register(&runtime, config);
    Harness { runtime, store }
}

/// In-memory store whose writes and deletes take `latency`. Records the
/// highest number of them in progress at once.
#[derive(Default)]
pub(crate) struct SlowStore {
    inner: InMemoryStateStore,
    latency: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl SlowStore {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            ..Default::default()
        }
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn reset_peak(&self) {
        self.peak.store(0, Ordering::SeqCst);
    }

    async fn stall(&self) {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
    }
}

#[async_trait]
impl StateStore for SlowStore {
    async fn read(&self, key: &StateKey) -> StoreResult<Option<Vec<u8>>> {
        self.inner.read(key).await
    }

    async fn write(&self, key: &StateKey, value: Vec<u8>) -> StoreResult<()> {
        self.stall().await;
        let result = self.inner.write(key, value).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn delete(&self, key: &StateKey) -> StoreResult<bool> {
        self.stall().await;
        let result = self.inner.delete(key).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn list(&self, kind: &str) -> StoreResult<Vec<StateKey>> {
        self.inner.list(kind).await
    }
}

impl Harness {
    pub fn client(&self, id: DirectoryId) -> DirectoryVersionClient {
        DirectoryVersionClient::new(&self.runtime, id)
    }

    /// Create `dv` under its own id and return that id.
    pub async fn create(&self, dv: DirectoryVersion) -> DirectoryId {
        let id = dv.directory_id;
        self.client(id).create(dv, &call()).await.unwrap();
        id
    }

    pub async fn slot_exists(&self, id: DirectoryId, slot: &str) -> bool {
        let key = StateKey::new(DirectoryVersionActor::KIND, id.to_string(), slot);
        self.store.exists(&key).await.unwrap()
    }

    pub fn is_active(&self, id: DirectoryId) -> bool {
        self.runtime
            .is_active::<DirectoryVersionActor>(&ActorId::from(id.to_string()))
    }

    pub fn deliver_reminder(&self, id: DirectoryId, name: &str) {
        self.runtime
            .remind::<DirectoryVersionActor>(&ActorId::from(id.to_string()), name)
            .unwrap();
    }
}

pub(crate) fn call() -> CallContext {
    CallContext::generate()
}

/// An uncreated snapshot with no subdirectories and one file per size.
pub(crate) fn leaf(sizes: &[u64]) -> DirectoryVersion {
    node(Vec::new(), sizes)
}

pub(crate) fn node(directories: Vec<DirectoryId>, sizes: &[u64]) -> DirectoryVersion {
    let files = sizes
        .iter()
        .enumerate()
        .map(|(i, &size)| {
            let path = format!("f{i}.txt");
            let hash = Sha256Hash::digest(path.as_bytes());
            FileVersion::new(path, hash, size)
        })
        .collect();
    DirectoryVersion::new(
        DirectoryId::new(),
        RepositoryId::new(),
        ".",
        Sha256Hash::zero(),
        directories,
        files,
    )
}
