//! Dispatch coordination: turn a resolved target into send instructions.
//!
//! Everyone sees everything, but only the target is nudged to act: the
//! target gets a visible send and every other participant except the sender
//! gets a silent copy.

use std::sync::Arc;

use maestro_core::transport::{RoomMessage, SendKind, Transport};
use tracing::{debug, warn};

use crate::registry::ParticipantRegistry;
use crate::resolver::ResolvedTarget;

/// One outbound send, attributed to the original speaker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendInstruction {
    pub kind: SendKind,
    pub display_name: String,
    pub content: String,
    pub recipients: Vec<String>,
}

/// Compute the sends for a message: visible to the target first, then one
/// silent send per remaining participant in registry order.
pub fn plan(
    message: &RoomMessage,
    target: &ResolvedTarget,
    registry: &ParticipantRegistry,
) -> Vec<SendInstruction> {
    let instruction = |kind, recipient: &str| SendInstruction {
        kind,
        display_name: message.display_name.clone(),
        content: message.content.clone(),
        recipients: vec![recipient.to_string()],
    };

    let mut sends = vec![instruction(SendKind::Visible, &target.participant_id)];
    sends.extend(
        registry
            .all()
            .iter()
            .filter(|p| p.id != target.participant_id && p.id != message.sender_id)
            .map(|p| instruction(SendKind::Silent, &p.id)),
    );
    sends
}

/// Executes dispatch plans against the transport.
#[derive(Clone)]
pub struct DispatchCoordinator {
    transport: Arc<dyn Transport>,
}

impl DispatchCoordinator {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Send every instruction. Delivery failures are the transport's
    /// concern and are only logged here.
    pub async fn dispatch(&self, instructions: &[SendInstruction]) {
        for send in instructions {
            debug!(kind = ?send.kind, recipients = ?send.recipients, "Dispatching");
            if let Err(e) = self
                .transport
                .send(send.kind, &send.display_name, &send.content, &send.recipients)
                .await
            {
                warn!(
                    transport = self.transport.name(),
                    kind = ?send.kind,
                    recipients = ?send.recipients,
                    error = %e,
                    "Send failed"
                );
            }
        }
    }
}
