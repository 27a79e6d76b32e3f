//! Durable reminders.
//!
//! Each entity's reminders live in one slot under the entity's own key, so
//! registering or firing a reminder only ever rewrites that entity's table
//! and only locks that entity's in-memory state. Every registration is
//! written through before its timer is armed, so a reminder survives both the
//! deactivation of its entity and a restart of the process: a new runtime
//! picks the tables up again in [`ActorRuntime::resume_reminders`].
//!
//! Each registration gets a fresh generation number. Re-registering the same
//! `(kind, id, name)` aborts the pending timer and bumps the generation, and a
//! timer only fires if its generation is still the current one.
//!
//! Delivery is at least once. A one-shot reminder leaves the table only after
//! the entity acknowledged it; a delivery that fails, or is cut short by
//! shutdown, keeps the record so it fires again later.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use arbor_store::{decode, encode, StateKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{ActorError, ActorResult};
use crate::id::ActorId;
use crate::runtime::ActorRuntime;

/// Slot holding an entity's reminder table.
pub const REMINDER_SLOT: &str = "__reminders";

/// A persisted reminder registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderRecord {
    pub kind: String,
    pub id: ActorId,
    pub name: String,
    /// Wall-clock time of the next firing.
    pub due_at: DateTime<Utc>,
    /// `None` for one-shot reminders.
    pub period: Option<Duration>,
    pub generation: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct EntityKey {
    kind: String,
    id: ActorId,
}

impl EntityKey {
    fn new(kind: &str, id: &ActorId) -> Self {
        Self {
            kind: kind.to_string(),
            id: id.clone(),
        }
    }

    fn slot(&self) -> StateKey {
        StateKey::new(self.kind.as_str(), self.id.as_str(), REMINDER_SLOT)
    }
}

/// In-memory view of one entity's reminder table, keyed by reminder name.
#[derive(Default)]
struct EntityReminders {
    loaded: bool,
    records: HashMap<String, ReminderRecord>,
    timers: HashMap<String, JoinHandle<()>>,
    next_generation: u64,
}

impl EntityReminders {
    fn is_idle(&self) -> bool {
        self.records.is_empty() && self.timers.is_empty()
    }

    /// Drop the timer handle for `name` unless a newer registration owns it.
    fn forget_timer(&mut self, name: &str, generation: u64) {
        let owned = self
            .records
            .get(name)
            .map_or(true, |record| record.generation == generation);
        if owned {
            self.timers.remove(name);
        }
    }
}

type EntitySlot = Arc<Mutex<EntityReminders>>;

pub(crate) struct ReminderService {
    entities: std::sync::Mutex<HashMap<EntityKey, EntitySlot>>,
}

impl ReminderService {
    pub(crate) fn new() -> Self {
        Self {
            entities: std::sync::Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, key: &EntityKey) -> EntitySlot {
        let mut entities = self.entities.lock().expect("reminder lock poisoned");
        Arc::clone(entities.entry(key.clone()).or_default())
    }

    /// Give back a slot obtained from [`slot`](Self::slot), dropping the
    /// entity's entry once nobody uses it and it tracks nothing.
    fn release(&self, key: &EntityKey, slot: EntitySlot) {
        drop(slot);
        let mut entities = self.entities.lock().expect("reminder lock poisoned");
        let idle = entities.get(key).is_some_and(|slot| {
            Arc::strong_count(slot) == 1 && slot.try_lock().is_ok_and(|state| state.is_idle())
        });
        if idle {
            entities.remove(key);
        }
    }

    /// Abort every armed timer. Returns how many were armed.
    pub(crate) async fn cancel_all(&self) -> usize {
        let slots: Vec<EntitySlot> = self
            .entities
            .lock()
            .expect("reminder lock poisoned")
            .values()
            .cloned()
            .collect();
        let mut count = 0;
        for slot in slots {
            let mut state = slot.lock().await;
            count += state.timers.len();
            for (_, timer) in state.timers.drain() {
                timer.abort();
            }
        }
        count
    }
}

/// What a timer does after one firing.
enum Fired {
    /// Periodic reminder delivered; fire again at the given time.
    Next(DateTime<Utc>),
    /// Delivered one-shot, or superseded by a newer registration.
    Done,
    /// The entity did not acknowledge the reminder.
    Undelivered,
}

fn due_after(name: &str, delay: Duration) -> ActorResult<DateTime<Utc>> {
    let invalid = |reason: &str| ActorError::InvalidReminder {
        name: name.to_string(),
        reason: reason.to_string(),
    };
    let delta = chrono::Duration::from_std(delay).map_err(|_| invalid("delay out of range"))?;
    Utc::now()
        .checked_add_signed(delta)
        .ok_or_else(|| invalid("due time out of range"))
}

impl ActorRuntime {
    async fn load_reminders(&self, key: &EntityKey, state: &mut EntityReminders) -> ActorResult<()> {
        if state.loaded {
            return Ok(());
        }
        let slot = key.slot();
        let records: Vec<ReminderRecord> = match self.store().read(&slot).await? {
            Some(bytes) => decode(&slot, &bytes)?,
            None => Vec::new(),
        };
        state.next_generation = records.iter().map(|r| r.generation).max().unwrap_or(0) + 1;
        state.records = records.into_iter().map(|r| (r.name.clone(), r)).collect();
        state.loaded = true;
        Ok(())
    }

    async fn save_reminders(&self, key: &EntityKey, state: &EntityReminders) -> ActorResult<()> {
        let slot = key.slot();
        if state.records.is_empty() {
            self.store().delete(&slot).await?;
            return Ok(());
        }
        let mut records: Vec<&ReminderRecord> = state.records.values().collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        self.store().write(&slot, encode(&records)?).await?;
        Ok(())
    }

    fn arm(&self, key: &EntityKey, state: &mut EntityReminders, record: &ReminderRecord) {
        if self.is_shut_down() {
            return;
        }
        let timer = tokio::spawn(run_timer(
            self.clone(),
            key.clone(),
            record.name.clone(),
            record.generation,
            record.due_at,
        ));
        if let Some(previous) = state.timers.insert(record.name.clone(), timer) {
            previous.abort();
        }
    }

    pub(crate) async fn register_reminder(
        &self,
        kind: &'static str,
        id: &ActorId,
        name: &str,
        due: Duration,
        period: Option<Duration>,
    ) -> ActorResult<()> {
        let due_at = due_after(name, due)?;
        let key = EntityKey::new(kind, id);
        let slot = self.inner().reminders.slot(&key);
        let result = async {
            let mut state = slot.lock().await;
            self.load_reminders(&key, &mut state).await?;

            let generation = state.next_generation;
            state.next_generation += 1;
            let record = ReminderRecord {
                kind: kind.to_string(),
                id: id.clone(),
                name: name.to_string(),
                due_at,
                period,
                generation,
            };
            state.records.insert(record.name.clone(), record.clone());
            self.save_reminders(&key, &state).await?;
            self.arm(&key, &mut state, &record);
            debug!(kind, %id, reminder = name, generation, due_at = %due_at, "reminder registered");
            Ok(())
        }
        .await;
        self.inner().reminders.release(&key, slot);
        result
    }

    pub(crate) async fn unregister_reminder(
        &self,
        kind: &'static str,
        id: &ActorId,
        name: &str,
    ) -> ActorResult<bool> {
        let key = EntityKey::new(kind, id);
        let slot = self.inner().reminders.slot(&key);
        let result = async {
            let mut state = slot.lock().await;
            self.load_reminders(&key, &mut state).await?;
            if let Some(timer) = state.timers.remove(name) {
                timer.abort();
            }
            if state.records.remove(name).is_none() {
                return Ok(false);
            }
            self.save_reminders(&key, &state).await?;
            debug!(kind, %id, reminder = name, "reminder unregistered");
            Ok(true)
        }
        .await;
        self.inner().reminders.release(&key, slot);
        result
    }

    /// Persisted reminder-table keys of every registered kind.
    async fn reminder_tables(&self) -> ActorResult<Vec<EntityKey>> {
        let mut tables = Vec::new();
        for kind in self.registered_kinds() {
            for key in self.store().list(kind).await? {
                if key.slot == REMINDER_SLOT {
                    tables.push(EntityKey::new(kind, &ActorId::from(key.id)));
                }
            }
        }
        Ok(tables)
    }

    /// Arm timers for every persisted reminder whose kind is registered.
    ///
    /// Call once after registering actor kinds on a fresh runtime. Overdue
    /// reminders fire immediately. Returns the number of timers armed.
    pub async fn resume_reminders(&self) -> ActorResult<usize> {
        let mut armed = 0;
        for key in self.reminder_tables().await? {
            let slot = self.inner().reminders.slot(&key);
            let result = async {
                let mut state = slot.lock().await;
                self.load_reminders(&key, &mut state).await?;
                let records: Vec<ReminderRecord> = state.records.values().cloned().collect();
                for record in &records {
                    self.arm(&key, &mut state, record);
                }
                Ok::<_, ActorError>(records.len())
            }
            .await;
            self.inner().reminders.release(&key, slot);
            armed += result?;
        }
        info!(armed, "reminders resumed");
        Ok(armed)
    }

    /// Every persisted reminder of the registered kinds, ordered by due time.
    pub async fn pending_reminders(&self) -> ActorResult<Vec<ReminderRecord>> {
        let mut records = Vec::new();
        for key in self.reminder_tables().await? {
            let slot = key.slot();
            if let Some(bytes) = self.store().read(&slot).await? {
                records.extend(decode::<Vec<ReminderRecord>>(&slot, &bytes)?);
            }
        }
        records.sort_by(|a, b| a.due_at.cmp(&b.due_at));
        Ok(records)
    }

    /// Deliver a due reminder and wait for the entity to handle it.
    ///
    /// No lock is held while the entity runs, so its handler may re-register
    /// the same reminder; the record is only updated afterwards if it still
    /// belongs to this timer's generation.
    async fn fire_reminder(&self, key: &EntityKey, name: &str, generation: u64) -> ActorResult<Fired> {
        let slot = self.inner().reminders.slot(key);
        let result = self.fire_with(key, &slot, name, generation).await;
        self.inner().reminders.release(key, slot);
        result
    }

    async fn fire_with(
        &self,
        key: &EntityKey,
        slot: &EntitySlot,
        name: &str,
        generation: u64,
    ) -> ActorResult<Fired> {
        let current = {
            let mut state = slot.lock().await;
            self.load_reminders(key, &mut state).await?;
            state
                .records
                .get(name)
                .is_some_and(|record| record.generation == generation)
        };
        if !current {
            debug!(kind = %key.kind, id = %key.id, reminder = name, "superseded reminder skipped");
            return Ok(Fired::Done);
        }
        let Some(deliver) = self.reminder_delivery(&key.kind) else {
            warn!(kind = %key.kind, id = %key.id, reminder = name, "reminder for unregistered kind");
            return Ok(Fired::Undelivered);
        };

        let (ack, acked) = oneshot::channel();
        let handled = match deliver(self, &key.id, name.to_string(), Some(ack)) {
            Ok(()) => acked.await.unwrap_or(false),
            Err(e) => {
                debug!(kind = %key.kind, id = %key.id, reminder = name, error = %e, "reminder not dispatched");
                false
            }
        };
        if !handled {
            return Ok(Fired::Undelivered);
        }

        let mut state = slot.lock().await;
        let period = match state.records.get(name) {
            Some(record) if record.generation == generation => record.period,
            _ => return Ok(Fired::Done),
        };
        let fired = match period {
            Some(period) => {
                let next = due_after(name, period)?;
                if let Some(record) = state.records.get_mut(name) {
                    record.due_at = next;
                }
                Fired::Next(next)
            }
            None => {
                state.records.remove(name);
                state.timers.remove(name);
                Fired::Done
            }
        };
        self.save_reminders(key, &state).await?;
        Ok(fired)
    }

    /// Stop tracking a timer that gave up; its record stays persisted.
    async fn abandon_timer(&self, key: &EntityKey, name: &str, generation: u64) {
        let slot = self.inner().reminders.slot(key);
        slot.lock().await.forget_timer(name, generation);
        self.inner().reminders.release(key, slot);
    }
}

async fn run_timer(
    runtime: ActorRuntime,
    key: EntityKey,
    name: String,
    generation: u64,
    mut due_at: DateTime<Utc>,
) {
    let max_attempts = runtime.config().reminder_max_attempts.max(1);
    let retry_delay = runtime.config().reminder_retry_delay;
    let mut failures = 0;
    loop {
        let wait = (due_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        tokio::time::sleep(wait).await;
        let error = match runtime.fire_reminder(&key, &name, generation).await {
            Ok(Fired::Next(next)) => {
                failures = 0;
                due_at = next;
                continue;
            }
            Ok(Fired::Done) => break,
            Ok(Fired::Undelivered) => None,
            Err(e) => Some(e),
        };

        failures += 1;
        if runtime.is_shut_down() || failures >= max_attempts {
            warn!(
                kind = %key.kind,
                id = %key.id,
                reminder = %name,
                attempts = failures,
                error = ?error,
                "reminder left pending until resumed"
            );
            runtime.abandon_timer(&key, &name, generation).await;
            break;
        }
        debug!(kind = %key.kind, id = %key.id, reminder = %name, attempt = failures, "reminder will be retried");
        due_at = due_after(&name, retry_delay).unwrap_or_else(|_| Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use arbor_store::{FsStateStore, InMemoryStateStore, StateStore};
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use crate::actor::Actor;
    use crate::config::RuntimeConfig;
    use crate::context::ActorContext;

    type Firings = mpsc::UnboundedReceiver<(ActorId, String)>;

    /// Shared behaviour of every `Alarm` activation.
    struct Bell {
        fired: mpsc::UnboundedSender<(ActorId, String)>,
        /// Reminders to reject before accepting one.
        rejections: AtomicU32,
        /// Time spent handling each reminder.
        latency: Duration,
    }

    /// Forwards every reminder it accepts to a test channel.
    struct Alarm {
        id: ActorId,
        bell: Arc<Bell>,
    }

    enum AlarmMessage {
        Arm {
            name: String,
            due: Duration,
            period: Option<Duration>,
            reply: crate::Reply<ActorResult<()>>,
        },
        Disarm {
            name: String,
            reply: crate::Reply<ActorResult<bool>>,
        },
    }

    #[async_trait]
    impl Actor for Alarm {
        const KIND: &'static str = "Alarm";
        type Message = AlarmMessage;
        type Config = Bell;

        async fn activate(
            id: &ActorId,
            config: Arc<Self::Config>,
            _ctx: &ActorContext,
        ) -> ActorResult<Self> {
            Ok(Self {
                id: id.clone(),
                bell: config,
            })
        }

        async fn handle(&mut self, message: Self::Message, ctx: &ActorContext) {
            match message {
                AlarmMessage::Arm {
                    name,
                    due,
                    period,
                    reply,
                } => {
                    let _ = reply.send(ctx.register_reminder(&name, due, period).await);
                }
                AlarmMessage::Disarm { name, reply } => {
                    let _ = reply.send(ctx.unregister_reminder(&name).await);
                }
            }
        }

        async fn receive_reminder(&mut self, name: &str, _ctx: &ActorContext) -> ActorResult<()> {
            tokio::time::sleep(self.bell.latency).await;
            let rejected = self
                .bell
                .rejections
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if rejected {
                return Err(ActorError::InvalidReminder {
                    name: name.to_string(),
                    reason: "not ready".into(),
                });
            }
            let _ = self.bell.fired.send((self.id.clone(), name.to_string()));
            Ok(())
        }
    }

    fn runtime_with(
        store: Arc<dyn StateStore>,
        config: RuntimeConfig,
        rejections: u32,
        latency: Duration,
    ) -> (ActorRuntime, Firings) {
        let runtime = ActorRuntime::new(store, config);
        let (fired, rx) = mpsc::unbounded_channel();
        runtime.register::<Alarm>(Bell {
            fired,
            rejections: AtomicU32::new(rejections),
            latency,
        });
        (runtime, rx)
    }

    fn runtime_on(store: Arc<dyn StateStore>) -> (ActorRuntime, Firings) {
        runtime_with(store, RuntimeConfig::default(), 0, Duration::ZERO)
    }

    fn quick_retries(max_attempts: u32) -> RuntimeConfig {
        RuntimeConfig {
            reminder_retry_delay: Duration::from_millis(20),
            reminder_max_attempts: max_attempts,
            ..Default::default()
        }
    }

    async fn arm(runtime: &ActorRuntime, id: &str, name: &str, due: Duration, period: Option<Duration>) {
        runtime
            .actor::<Alarm>(id)
            .call(|reply| AlarmMessage::Arm {
                name: name.to_string(),
                due,
                period,
                reply,
            })
            .await
            .unwrap()
            .unwrap();
    }

    async fn disarm(runtime: &ActorRuntime, id: &str, name: &str) -> bool {
        runtime
            .actor::<Alarm>(id)
            .call(|reply| AlarmMessage::Disarm {
                name: name.to_string(),
                reply,
            })
            .await
            .unwrap()
            .unwrap()
    }

    async fn next_firing(rx: &mut Firings) -> (ActorId, String) {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("reminder should fire")
            .expect("channel open")
    }

    // -----------------------------------------------------------------------
    // One-shot and periodic delivery
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn one_shot_fires_once_and_leaves_the_table() {
        let (runtime, mut rx) = runtime_on(Arc::new(InMemoryStateStore::new()));
        arm(&runtime, "a1", "wake", Duration::from_millis(20), None).await;
        assert_eq!(runtime.pending_reminders().await.unwrap().len(), 1);

        let (id, name) = next_firing(&mut rx).await;
        assert_eq!(id, ActorId::from("a1"));
        assert_eq!(name, "wake");

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(rx.try_recv().is_err());
        assert!(runtime.pending_reminders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn periodic_reminder_keeps_firing() {
        let (runtime, mut rx) = runtime_on(Arc::new(InMemoryStateStore::new()));
        arm(
            &runtime,
            "a1",
            "tick",
            Duration::from_millis(10),
            Some(Duration::from_millis(10)),
        )
        .await;

        for _ in 0..3 {
            assert_eq!(next_firing(&mut rx).await.1, "tick");
        }
        assert_eq!(runtime.pending_reminders().await.unwrap().len(), 1);
    }

    // -----------------------------------------------------------------------
    // Cancel-and-replace
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn re_registering_replaces_the_pending_timer() {
        let (runtime, mut rx) = runtime_on(Arc::new(InMemoryStateStore::new()));
        arm(&runtime, "a1", "wake", Duration::from_millis(30), None).await;
        arm(&runtime, "a1", "wake", Duration::from_millis(200), None).await;

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err(), "superseded timer must not fire");

        assert_eq!(next_firing(&mut rx).await.1, "wake");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err(), "only one firing expected");
    }

    #[tokio::test]
    async fn unregistered_reminder_never_fires() {
        let (runtime, mut rx) = runtime_on(Arc::new(InMemoryStateStore::new()));
        arm(&runtime, "a1", "wake", Duration::from_millis(30), None).await;
        assert!(disarm(&runtime, "a1", "wake").await);
        assert!(!disarm(&runtime, "a1", "wake").await);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn reminders_for_distinct_names_are_independent() {
        let (runtime, mut rx) = runtime_on(Arc::new(InMemoryStateStore::new()));
        arm(&runtime, "a1", "first", Duration::from_millis(10), None).await;
        arm(&runtime, "a1", "second", Duration::from_millis(20), None).await;

        let mut names = vec![next_firing(&mut rx).await.1, next_firing(&mut rx).await.1];
        names.sort();
        assert_eq!(names, vec!["first", "second"]);
    }

    // -----------------------------------------------------------------------
    // Storage layout
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn reminders_are_stored_under_the_owning_entity() {
        let store = Arc::new(InMemoryStateStore::new());
        let (runtime, _rx) = runtime_on(store.clone());
        arm(&runtime, "a1", "wake", Duration::from_secs(60), None).await;
        arm(&runtime, "a1", "nap", Duration::from_secs(60), None).await;
        arm(&runtime, "a2", "wake", Duration::from_secs(60), None).await;

        let a1 = StateKey::new("Alarm", "a1", REMINDER_SLOT);
        let a2 = StateKey::new("Alarm", "a2", REMINDER_SLOT);
        let bytes = store.read(&a1).await.unwrap().unwrap();
        let records: Vec<ReminderRecord> = decode(&a1, &bytes).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.id.as_str() == "a1"));

        disarm(&runtime, "a1", "wake").await;
        disarm(&runtime, "a1", "nap").await;
        assert!(!store.exists(&a1).await.unwrap());
        assert!(store.exists(&a2).await.unwrap());
        runtime.shutdown().await;
    }

    // -----------------------------------------------------------------------
    // Failed delivery
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn rejected_reminder_stays_pending_and_is_retried() {
        let store = Arc::new(InMemoryStateStore::new());
        let (runtime, mut rx) = runtime_with(store, quick_retries(5), 2, Duration::ZERO);
        arm(&runtime, "a1", "wake", Duration::from_millis(10), None).await;

        assert_eq!(next_firing(&mut rx).await.1, "wake");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
        assert!(runtime.pending_reminders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn exhausted_retries_keep_the_record_for_the_next_resume() {
        let store: Arc<dyn StateStore> = Arc::new(InMemoryStateStore::new());
        let (first, mut first_rx) =
            runtime_with(Arc::clone(&store), quick_retries(2), u32::MAX, Duration::ZERO);
        arm(&first, "a1", "wake", Duration::from_millis(10), None).await;

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(first_rx.try_recv().is_err());
        assert_eq!(first.pending_reminders().await.unwrap().len(), 1);
        first.shutdown().await;

        let (second, mut second_rx) = runtime_on(Arc::clone(&store));
        assert_eq!(second.resume_reminders().await.unwrap(), 1);
        assert_eq!(next_firing(&mut second_rx).await.1, "wake");
    }

    #[tokio::test]
    async fn reminder_cut_short_by_shutdown_fires_after_restart() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn StateStore> = Arc::new(FsStateStore::open(dir.path()).unwrap());
        let (first, mut first_rx) = runtime_with(
            Arc::clone(&store),
            RuntimeConfig::default(),
            0,
            Duration::from_millis(100),
        );
        arm(&first, "a1", "wake", Duration::from_millis(10), None).await;

        // Shut down while the entity is still handling the reminder.
        tokio::time::sleep(Duration::from_millis(40)).await;
        first.shutdown().await;
        assert!(first_rx.try_recv().is_ok(), "shutdown waits for the handler");

        let (second, mut second_rx) = runtime_on(Arc::clone(&store));
        assert_eq!(second.resume_reminders().await.unwrap(), 1);
        assert_eq!(next_firing(&mut second_rx).await.1, "wake");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(second.pending_reminders().await.unwrap().is_empty());
    }

    // -----------------------------------------------------------------------
    // Durability
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn reminders_survive_a_runtime_restart() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn StateStore> = Arc::new(FsStateStore::open(dir.path()).unwrap());
        let (first, mut first_rx) = runtime_on(Arc::clone(&store));
        arm(&first, "a1", "wake", Duration::from_millis(80), None).await;
        first.shutdown().await;

        let (second, mut second_rx) = runtime_on(Arc::clone(&store));
        assert_eq!(second.resume_reminders().await.unwrap(), 1);

        let (id, name) = next_firing(&mut second_rx).await;
        assert_eq!((id.as_str(), name.as_str()), ("a1", "wake"));
        assert!(first_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn overdue_reminder_fires_on_resume() {
        let store: Arc<dyn StateStore> = Arc::new(InMemoryStateStore::new());
        let (first, _first_rx) = runtime_on(Arc::clone(&store));
        arm(&first, "a1", "wake", Duration::from_millis(10), None).await;
        first.shutdown().await;
        tokio::time::sleep(Duration::from_millis(40)).await;

        let (second, mut second_rx) = runtime_on(Arc::clone(&store));
        second.resume_reminders().await.unwrap();
        assert_eq!(next_firing(&mut second_rx).await.1, "wake");
    }

    #[tokio::test]
    async fn generations_continue_after_reload() {
        let store: Arc<dyn StateStore> = Arc::new(InMemoryStateStore::new());
        let (first, _rx) = runtime_on(Arc::clone(&store));
        arm(&first, "a1", "wake", Duration::from_secs(60), None).await;
        let before = first.pending_reminders().await.unwrap()[0].generation;
        first.shutdown().await;

        let (second, _rx) = runtime_on(Arc::clone(&store));
        arm(&second, "a1", "wake", Duration::from_secs(60), None).await;
        let records = second.pending_reminders().await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].generation > before);
        second.shutdown().await;
    }
}
