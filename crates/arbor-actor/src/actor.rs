use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::context::ActorContext;
use crate::error::ActorResult;
use crate::id::ActorId;

/// Reply channel carried inside request messages.
pub type Reply<T> = oneshot::Sender<T>;

/// An entity type hosted by the [`ActorRuntime`](crate::ActorRuntime).
///
/// The runtime calls [`activate`](Actor::activate) once per activation, then
/// [`handle`](Actor::handle) for each message in mailbox order. No two calls
/// on the same activation ever overlap.
#[async_trait]
pub trait Actor: Sized + Send + 'static {
    /// Entity type name; also the first component of every state key.
    const KIND: &'static str;

    /// Requests accepted by this entity. Requests that expect an answer carry
    /// a [`Reply`] sender.
    type Message: Send + 'static;

    /// Shared configuration handed to every activation.
    type Config: Send + Sync + 'static;

    /// Load the entity's durable state and build the in-memory instance.
    async fn activate(
        id: &ActorId,
        config: Arc<Self::Config>,
        ctx: &ActorContext,
    ) -> ActorResult<Self>;

    /// Handle one message.
    async fn handle(&mut self, message: Self::Message, ctx: &ActorContext);

    /// Handle a reminder. Unknown names must be ignored.
    async fn receive_reminder(&mut self, name: &str, ctx: &ActorContext) -> ActorResult<()> {
        let _ = (name, ctx);
        Ok(())
    }

    /// Called when the activation retires.
    async fn deactivate(&mut self, ctx: &ActorContext) {
        let _ = ctx;
    }
}

/// What travels through a mailbox.
pub(crate) enum Envelope<M> {
    Call(M),
    /// `ack` learns whether the entity handled the reminder without error.
    Reminder {
        name: String,
        ack: Option<Reply<bool>>,
    },
}
