//! Virtual actor runtime for Arbor.
//!
//! Entities are addressed by `(kind, id)`. The runtime activates an entity on
//! first reference, feeds it messages one at a time from a mailbox, retires it
//! after a period of idleness, and delivers durable reminders to it even
//! across deactivation and process restarts.
//!
//! # Guarantees
//!
//! - At most one activation per `(kind, id)` exists at any time.
//! - Messages to one activation are handled strictly one after another.
//! - Distinct entities run concurrently on the tokio runtime.
//! - An entity can only read and write its own state slots
//!   (see [`ActorContext`]).
//! - Re-registering a reminder replaces the pending one; a superseded timer
//!   never fires.
//! - Reminders are delivered at least once: a reminder stays persisted until
//!   the entity has handled it.
//!
//! # Modules
//!
//! - [`actor`]: the [`Actor`] trait implemented by entity types
//! - [`runtime`]: [`ActorRuntime`] and [`ActorRef`]
//! - [`context`]: [`ActorContext`] handed to every handler
//! - [`call`]: [`CallContext`] carried by every request
//! - [`reminder`]: durable per-entity reminders and their timers
//! - [`config`]: [`RuntimeConfig`]

pub mod actor;
pub mod call;
pub mod config;
pub mod context;
pub mod error;
pub mod id;
pub mod reminder;
pub mod runtime;

pub use actor::{Actor, Reply};
pub use call::CallContext;
pub use config::RuntimeConfig;
pub use context::ActorContext;
pub use error::{ActorError, ActorResult};
pub use id::ActorId;
pub use reminder::ReminderRecord;
pub use runtime::{ActorRef, ActorRuntime};
