use std::sync::Arc;

use arbor_actor::{Actor, ActorContext, ActorError, ActorId, ActorResult, ActorRuntime, CallContext, Reply};
use arbor_types::{Reference, ReferenceId, ReferenceType};
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use crate::error::{ReferenceError, ReferenceResult};

/// Slot holding the reference value.
pub const STATE_SLOT: &str = "ReferenceDtoState";

/// Register the reference entity type on a runtime.
pub fn register(runtime: &ActorRuntime) {
    runtime.register::<ReferenceActor>(());
}

/// Requests accepted by a reference entity.
pub enum ReferenceMessage {
    Exists {
        call: CallContext,
        reply: Reply<bool>,
    },
    Get {
        call: CallContext,
        reply: Reply<ReferenceResult<Reference>>,
    },
    GetReferenceType {
        call: CallContext,
        reply: Reply<ReferenceResult<ReferenceType>>,
    },
    /// Persist `reference`, replacing whatever was stored before.
    Create {
        reference: Reference,
        call: CallContext,
        reply: Reply<ReferenceResult<()>>,
    },
    Delete {
        call: CallContext,
        reply: Reply<ReferenceResult<()>>,
    },
}

impl ReferenceMessage {
    fn name(&self) -> &'static str {
        match self {
            Self::Exists { .. } => "Exists",
            Self::Get { .. } => "Get",
            Self::GetReferenceType { .. } => "GetReferenceType",
            Self::Create { .. } => "Create",
            Self::Delete { .. } => "Delete",
        }
    }

    fn call(&self) -> &CallContext {
        match self {
            Self::Exists { call, .. }
            | Self::Get { call, .. }
            | Self::GetReferenceType { call, .. }
            | Self::Create { call, .. }
            | Self::Delete { call, .. } => call,
        }
    }
}

/// The single-writer owner of one [`Reference`].
pub struct ReferenceActor {
    reference_id: ReferenceId,
    state: Option<Reference>,
}

impl ReferenceActor {
    fn reference(&self) -> ReferenceResult<&Reference> {
        self.state
            .as_ref()
            .filter(|r| r.created_at.is_some())
            .ok_or(ReferenceError::NotFound(self.reference_id))
    }

    async fn create(&mut self, mut reference: Reference, ctx: &ActorContext) -> ReferenceResult<()> {
        reference.reference_id = self.reference_id;
        reference.created_at = Some(Utc::now());
        ctx.write_state(STATE_SLOT, &reference).await?;
        info!(
            reference_id = %self.reference_id,
            reference_type = %reference.reference_type,
            directory_id = %reference.directory_id,
            "reference created"
        );
        self.state = Some(reference);
        Ok(())
    }

    async fn delete(&mut self, ctx: &ActorContext) -> ReferenceResult<()> {
        ctx.clear_state(STATE_SLOT).await?;
        self.state = None;
        info!(reference_id = %self.reference_id, "reference deleted");
        Ok(())
    }
}

#[async_trait]
impl Actor for ReferenceActor {
    const KIND: &'static str = "Reference";
    type Message = ReferenceMessage;
    type Config = ();

    async fn activate(id: &ActorId, _config: Arc<()>, ctx: &ActorContext) -> ActorResult<Self> {
        let reference_id: ReferenceId = id.as_str().parse().map_err(|e| ActorError::InvalidId {
            kind: Self::KIND.to_string(),
            id: id.clone(),
            reason: format!("{e}"),
        })?;
        let state = ctx.read_state(STATE_SLOT).await?;
        Ok(Self { reference_id, state })
    }

    async fn handle(&mut self, message: Self::Message, ctx: &ActorContext) {
        debug!(
            reference_id = %self.reference_id,
            correlation_id = %message.call().correlation_id,
            method = message.name(),
            "handling"
        );
        match message {
            ReferenceMessage::Exists { reply, .. } => {
                let _ = reply.send(self.reference().is_ok());
            }
            ReferenceMessage::Get { reply, .. } => {
                let _ = reply.send(self.reference().cloned());
            }
            ReferenceMessage::GetReferenceType { reply, .. } => {
                let _ = reply.send(self.reference().map(|r| r.reference_type));
            }
            ReferenceMessage::Create { reference, reply, .. } => {
                let _ = reply.send(self.create(reference, ctx).await);
            }
            ReferenceMessage::Delete { reply, .. } => {
                let _ = reply.send(self.delete(ctx).await);
            }
        }
    }
}
