use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use arbor_store::StateStore;
use tokio::sync::mpsc::{self, error::SendError, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::actor::{Actor, Envelope, Reply};
use crate::config::RuntimeConfig;
use crate::context::ActorContext;
use crate::error::{ActorError, ActorResult};
use crate::id::ActorId;
use crate::reminder::ReminderService;

type Mailbox<A> = UnboundedSender<Envelope<<A as Actor>::Message>>;

/// Delivers a reminder to an entity of a statically unknown type.
pub(crate) type ReminderDelivery =
    fn(&ActorRuntime, &ActorId, String, Option<Reply<bool>>) -> ActorResult<()>;

/// Per-kind registration: shared config plus a typed reminder entry point.
struct KindEntry {
    config: Arc<dyn Any + Send + Sync>,
    deliver_reminder: ReminderDelivery,
}

/// One live activation. The mailbox is an `UnboundedSender<Envelope<M>>` for
/// the kind's message type.
struct Activation {
    generation: u64,
    mailbox: Box<dyn Any + Send>,
}

type ActivationKey = (&'static str, ActorId);

pub(crate) struct RuntimeInner {
    store: Arc<dyn StateStore>,
    config: RuntimeConfig,
    kinds: RwLock<HashMap<&'static str, KindEntry>>,
    activations: Mutex<HashMap<ActivationKey, Activation>>,
    next_generation: AtomicU64,
    shut_down: AtomicBool,
    mailboxes: Mutex<Vec<JoinHandle<()>>>,
    pub(crate) reminders: ReminderService,
}

/// Hosts entity activations over a shared [`StateStore`].
///
/// Cloning is cheap; all clones drive the same registry. Every message send
/// and every retirement decision happens under the activation lock, which is
/// what guarantees a single activation per identifier: a mailbox only retires
/// when it is empty at the moment it is removed from the registry, and a new
/// activation can only be created once the old one is gone.
#[derive(Clone)]
pub struct ActorRuntime {
    inner: Arc<RuntimeInner>,
}

impl ActorRuntime {
    pub fn new(store: Arc<dyn StateStore>, config: RuntimeConfig) -> Self {
        Self {
            inner: Arc::new(RuntimeInner {
                store,
                config,
                kinds: RwLock::new(HashMap::new()),
                activations: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(1),
                shut_down: AtomicBool::new(false),
                mailboxes: Mutex::new(Vec::new()),
                reminders: ReminderService::new(),
            }),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    pub(crate) fn store(&self) -> &dyn StateStore {
        self.inner.store.as_ref()
    }

    pub(crate) fn inner(&self) -> &RuntimeInner {
        &self.inner
    }

    /// Register an entity type together with the config its activations get.
    pub fn register<A: Actor>(&self, config: A::Config) {
        let entry = KindEntry {
            config: Arc::new(config),
            deliver_reminder: deliver_reminder::<A>,
        };
        let previous = self
            .inner
            .kinds
            .write()
            .expect("kinds lock poisoned")
            .insert(A::KIND, entry);
        if previous.is_some() {
            warn!(kind = A::KIND, "actor kind re-registered; live activations keep their config");
        } else {
            debug!(kind = A::KIND, "actor kind registered");
        }
    }

    pub fn is_registered(&self, kind: &str) -> bool {
        self.inner
            .kinds
            .read()
            .expect("kinds lock poisoned")
            .contains_key(kind)
    }

    pub(crate) fn registered_kinds(&self) -> Vec<&'static str> {
        self.inner
            .kinds
            .read()
            .expect("kinds lock poisoned")
            .keys()
            .copied()
            .collect()
    }

    pub(crate) fn reminder_delivery(&self, kind: &str) -> Option<ReminderDelivery> {
        self.inner
            .kinds
            .read()
            .expect("kinds lock poisoned")
            .get(kind)
            .map(|entry| entry.deliver_reminder)
    }

    fn config_for<A: Actor>(&self) -> ActorResult<Arc<A::Config>> {
        let kinds = self.inner.kinds.read().expect("kinds lock poisoned");
        let entry = kinds
            .get(A::KIND)
            .ok_or_else(|| ActorError::UnregisteredKind(A::KIND.to_string()))?;
        Arc::clone(&entry.config)
            .downcast::<A::Config>()
            .map_err(|_| ActorError::UnregisteredKind(A::KIND.to_string()))
    }

    /// Address an entity. No activation happens until the first call.
    pub fn actor<A: Actor>(&self, id: impl Into<ActorId>) -> ActorRef<A> {
        ActorRef {
            runtime: self.clone(),
            id: id.into(),
            _kind: PhantomData,
        }
    }

    /// Number of live activations across all kinds.
    pub fn active_count(&self) -> usize {
        self.inner
            .activations
            .lock()
            .expect("activation lock poisoned")
            .len()
    }

    /// Returns `true` if `(A::KIND, id)` currently has a live activation.
    pub fn is_active<A: Actor>(&self, id: &ActorId) -> bool {
        self.inner
            .activations
            .lock()
            .expect("activation lock poisoned")
            .contains_key(&(A::KIND, id.clone()))
    }

    /// Enqueue an envelope, activating the entity if needed.
    pub(crate) fn dispatch<A: Actor>(
        &self,
        id: &ActorId,
        envelope: Envelope<A::Message>,
    ) -> ActorResult<()> {
        let config = self.config_for::<A>()?;

        let mut activations = self
            .inner
            .activations
            .lock()
            .expect("activation lock poisoned");
        // Checked under the lock so nothing is enqueued after shutdown clears
        // the registry.
        if self.inner.shut_down.load(Ordering::Acquire) {
            return Err(ActorError::Shutdown);
        }
        let key = (A::KIND, id.clone());

        let live = activations
            .get(&key)
            .and_then(|activation| activation.mailbox.downcast_ref::<Mailbox<A>>());
        let envelope = match live {
            Some(mailbox) => match mailbox.send(envelope) {
                Ok(()) => return Ok(()),
                // The mailbox task died without retiring (panicked handler).
                Err(SendError(envelope)) => {
                    warn!(kind = A::KIND, %id, "replacing dead activation");
                    envelope
                }
            },
            None => envelope,
        };

        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(envelope).map_err(|_| ActorError::Shutdown)?;
        activations.insert(
            key,
            Activation {
                generation,
                mailbox: Box::new(tx),
            },
        );

        let task = tokio::spawn(run_mailbox::<A>(self.clone(), id.clone(), generation, config, rx));
        let mut mailboxes = self.inner.mailboxes.lock().expect("mailbox lock poisoned");
        mailboxes.retain(|task| !task.is_finished());
        mailboxes.push(task);
        Ok(())
    }

    /// Remove the activation if it is still the given generation.
    fn retire(&self, kind: &'static str, id: &ActorId, generation: u64) {
        let mut activations = self
            .inner
            .activations
            .lock()
            .expect("activation lock poisoned");
        remove_generation(&mut activations, kind, id, generation);
    }

    /// Retire an idle activation unless a message slipped in meanwhile.
    fn try_retire<M>(
        &self,
        kind: &'static str,
        id: &ActorId,
        generation: u64,
        rx: &mut UnboundedReceiver<Envelope<M>>,
    ) -> Option<Envelope<M>> {
        let mut activations = self
            .inner
            .activations
            .lock()
            .expect("activation lock poisoned");
        if let Ok(envelope) = rx.try_recv() {
            return Some(envelope);
        }
        remove_generation(&mut activations, kind, id, generation);
        None
    }

    /// Deliver a reminder to an entity right away, activating it if needed.
    ///
    /// Timers use the same path when they fire; this entry point exists for
    /// operators and tests that need to trigger a reminder by hand.
    pub fn remind<A: Actor>(&self, id: &ActorId, name: impl Into<String>) -> ActorResult<()> {
        self.dispatch::<A>(
            id,
            Envelope::Reminder {
                name: name.into(),
                ack: None,
            },
        )
    }

    /// Stop accepting calls, cancel reminder timers, and drain every mailbox.
    ///
    /// Activations handle the messages already queued, then deactivate; this
    /// returns once all of them have. A reminder whose delivery was cut short
    /// stays in the store and fires again on the next runtime via
    /// [`resume_reminders`](ActorRuntime::resume_reminders).
    ///
    /// Must not be awaited from inside an actor callback, which would wait on
    /// its own mailbox.
    pub async fn shutdown(&self) {
        self.inner.shut_down.store(true, Ordering::Release);
        let cancelled = self.inner.reminders.cancel_all().await;
        let retired = {
            let mut activations = self
                .inner
                .activations
                .lock()
                .expect("activation lock poisoned");
            let count = activations.len();
            activations.clear();
            count
        };
        let tasks = std::mem::take(&mut *self.inner.mailboxes.lock().expect("mailbox lock poisoned"));
        for task in tasks {
            if let Err(e) = task.await {
                if e.is_panic() {
                    warn!(error = %e, "mailbox task panicked");
                }
            }
        }
        info!(activations = retired, timers = cancelled, "actor runtime shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for ActorRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorRuntime")
            .field("active", &self.active_count())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

fn remove_generation(
    activations: &mut HashMap<ActivationKey, Activation>,
    kind: &'static str,
    id: &ActorId,
    generation: u64,
) {
    let key = (kind, id.clone());
    if activations
        .get(&key)
        .is_some_and(|activation| activation.generation == generation)
    {
        activations.remove(&key);
    }
}

fn deliver_reminder<A: Actor>(
    runtime: &ActorRuntime,
    id: &ActorId,
    name: String,
    ack: Option<Reply<bool>>,
) -> ActorResult<()> {
    runtime.dispatch::<A>(id, Envelope::Reminder { name, ack })
}

async fn run_mailbox<A: Actor>(
    runtime: ActorRuntime,
    id: ActorId,
    generation: u64,
    config: Arc<A::Config>,
    mut rx: UnboundedReceiver<Envelope<A::Message>>,
) {
    let ctx = ActorContext::new(runtime.clone(), A::KIND, id.clone());
    let mut actor = match A::activate(&id, config, &ctx).await {
        Ok(actor) => actor,
        Err(e) => {
            error!(kind = A::KIND, %id, error = %e, "activation failed");
            runtime.retire(A::KIND, &id, generation);
            return;
        }
    };
    debug!(kind = A::KIND, %id, generation, "activated");

    let idle_timeout = runtime.config().idle_timeout;
    loop {
        let envelope = match tokio::time::timeout(idle_timeout, rx.recv()).await {
            Ok(Some(envelope)) => envelope,
            // Registry dropped the sender: runtime shutdown.
            Ok(None) => break,
            Err(_) => match runtime.try_retire(A::KIND, &id, generation, &mut rx) {
                Some(envelope) => envelope,
                None => break,
            },
        };
        match envelope {
            Envelope::Call(message) => actor.handle(message, &ctx).await,
            Envelope::Reminder { name, ack } => {
                debug!(kind = A::KIND, %id, reminder = %name, "reminder delivered");
                let handled = match actor.receive_reminder(&name, &ctx).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(kind = A::KIND, %id, reminder = %name, error = %e, "reminder handler failed");
                        false
                    }
                };
                if let Some(ack) = ack {
                    let _ = ack.send(handled);
                }
            }
        }
    }

    actor.deactivate(&ctx).await;
    debug!(kind = A::KIND, %id, generation, "deactivated");
}

/// Typed address of one entity.
pub struct ActorRef<A: Actor> {
    runtime: ActorRuntime,
    id: ActorId,
    _kind: PhantomData<fn() -> A>,
}

impl<A: Actor> Clone for ActorRef<A> {
    fn clone(&self) -> Self {
        Self {
            runtime: self.runtime.clone(),
            id: self.id.clone(),
            _kind: PhantomData,
        }
    }
}

impl<A: Actor> std::fmt::Debug for ActorRef<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ActorRef({}/{})", A::KIND, self.id)
    }
}

impl<A: Actor> ActorRef<A> {
    pub fn id(&self) -> &ActorId {
        &self.id
    }

    pub fn runtime(&self) -> &ActorRuntime {
        &self.runtime
    }

    /// Send a request built around a fresh reply channel and await the answer.
    pub async fn call<R: Send + 'static>(
        &self,
        build: impl FnOnce(Reply<R>) -> A::Message,
    ) -> ActorResult<R> {
        let (tx, rx) = oneshot::channel();
        self.runtime
            .dispatch::<A>(&self.id, Envelope::Call(build(tx)))?;
        rx.await.map_err(|_| ActorError::CallAbandoned {
            kind: A::KIND.to_string(),
            id: self.id.clone(),
        })
    }

    /// Send a message without waiting for it to be handled.
    pub fn tell(&self, message: A::Message) -> ActorResult<()> {
        self.runtime.dispatch::<A>(&self.id, Envelope::Call(message))
    }
}
