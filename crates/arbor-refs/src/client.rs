use arbor_actor::{ActorRef, ActorRuntime, CallContext};
use arbor_types::{Reference, ReferenceId, ReferenceType};

use crate::entity::{ReferenceActor, ReferenceMessage};
use crate::error::ReferenceResult;

/// Typed handle for calling one reference entity.
#[derive(Clone, Debug)]
pub struct ReferenceClient {
    actor: ActorRef<ReferenceActor>,
    reference_id: ReferenceId,
}

impl ReferenceClient {
    pub fn new(runtime: &ActorRuntime, reference_id: ReferenceId) -> Self {
        Self {
            actor: runtime.actor::<ReferenceActor>(reference_id.to_string()),
            reference_id,
        }
    }

    pub fn reference_id(&self) -> ReferenceId {
        self.reference_id
    }

    pub async fn exists(&self, call: &CallContext) -> ReferenceResult<bool> {
        let call = call.clone();
        Ok(self
            .actor
            .call(|reply| ReferenceMessage::Exists { call, reply })
            .await?)
    }

    pub async fn get(&self, call: &CallContext) -> ReferenceResult<Reference> {
        let call = call.clone();
        self.actor
            .call(|reply| ReferenceMessage::Get { call, reply })
            .await?
    }

    pub async fn get_reference_type(&self, call: &CallContext) -> ReferenceResult<ReferenceType> {
        let call = call.clone();
        self.actor
            .call(|reply| ReferenceMessage::GetReferenceType { call, reply })
            .await?
    }

    /// Store `reference` under this client's id, overwriting any previous
    /// value.
    pub async fn create(&self, reference: Reference, call: &CallContext) -> ReferenceResult<()> {
        let call = call.clone();
        self.actor
            .call(|reply| ReferenceMessage::Create {
                reference,
                call,
                reply,
            })
            .await?
    }

    pub async fn delete(&self, call: &CallContext) -> ReferenceResult<()> {
        let call = call.clone();
        self.actor
            .call(|reply| ReferenceMessage::Delete { call, reply })
            .await?
    }
}
