//! Target resolution: who should receive a message next.
//!
//! The oracle's answer is untrusted free text. It is accepted only if it
//! names a known participant other than the sender; otherwise the fallback
//! ladder runs (random draws, then the sender itself). Resolution never
//! fails while at least one participant is known.

use std::sync::Arc;

use maestro_core::provider::Provider;
use maestro_core::transport::RoomMessage;
use tracing::{debug, info, warn};

use crate::backlog::SharedBacklog;
use crate::draw::{RandomDraw, TargetDraw};
use crate::prompt::{self, OracleParams};
use crate::registry::{ParticipantRegistry, SharedRegistry};

/// Upper bound on random draws before falling back to the sender.
pub const MAX_FALLBACK_DRAWS: u32 = 5;

/// How a target was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSource {
    /// The oracle named a valid participant
    OracleMatch,
    /// A random participant, found on draw number `draws`
    FallbackRandom { draws: u32 },
    /// Every draw hit the sender; the message goes back to them
    FallbackSelf,
}

/// A deliverable participant id plus how it was derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub participant_id: String,
    pub source: TargetSource,
}

/// Queries the oracle and applies validation and the fallback ladder.
#[derive(Clone)]
pub struct TargetResolver {
    provider: Arc<dyn Provider>,
    registry: SharedRegistry,
    backlog: SharedBacklog,
    draw: Arc<dyn TargetDraw>,
    params: OracleParams,
}

impl TargetResolver {
    pub fn new(
        provider: Arc<dyn Provider>,
        registry: SharedRegistry,
        backlog: SharedBacklog,
        params: OracleParams,
    ) -> Self {
        Self {
            provider,
            registry,
            backlog,
            draw: Arc::new(RandomDraw),
            params,
        }
    }

    /// Replace the random source used by the fallback ladder.
    pub fn with_draw(mut self, draw: Arc<dyn TargetDraw>) -> Self {
        self.draw = draw;
        self
    }

    /// Resolve the target for a newly arrived message.
    ///
    /// The message is appended to the backlog before anything else, even if
    /// resolution later falls back. Returns `None` only when the registry is
    /// empty.
    pub async fn resolve(&self, message: &RoomMessage) -> Option<ResolvedTarget> {
        let request = {
            let mut backlog = self.backlog.write().await;
            backlog.append(message.clone());
            let registry = self.registry.read().await;
            prompt::build_request(&registry, &backlog, &self.params)
        };

        // No locks are held across the oracle round-trip
        let answer = match self.provider.complete(request).await {
            Ok(response) => response.message.content,
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "Oracle call failed");
                String::new()
            }
        };

        let registry = self.registry.read().await;
        self.validate_or_fallback(&registry, &message.sender_id, &answer)
    }

    /// Accept the oracle's answer if valid, else run the fallback ladder.
    pub fn validate_or_fallback(
        &self,
        registry: &ParticipantRegistry,
        sender_id: &str,
        answer: &str,
    ) -> Option<ResolvedTarget> {
        let token = answer.trim();

        match registry.resolve_by_identifier_or_name(token) {
            Some(p) if p.id != sender_id => {
                debug!(answer = %token, target = %p.id, "Oracle named a valid target");
                return Some(ResolvedTarget {
                    participant_id: p.id.clone(),
                    source: TargetSource::OracleMatch,
                });
            }
            Some(_) => info!(answer = %token, "Oracle named the sender, picking another target"),
            None => info!(
                answer = %token,
                "Oracle answer is not a known participant, picking random target"
            ),
        }

        self.fallback(registry, sender_id)
    }

    fn fallback(&self, registry: &ParticipantRegistry, sender_id: &str) -> Option<ResolvedTarget> {
        let participants = registry.all();
        if participants.is_empty() {
            return None;
        }

        for draws in 1..=MAX_FALLBACK_DRAWS {
            let pick = &participants[self.draw.draw(participants.len()) % participants.len()];
            if pick.id != sender_id {
                return Some(ResolvedTarget {
                    participant_id: pick.id.clone(),
                    source: TargetSource::FallbackRandom { draws },
                });
            }
        }

        info!(
            sender = %sender_id,
            draws = MAX_FALLBACK_DRAWS,
            "No other participant drawn, returning message to sender"
        );
        Some(ResolvedTarget {
            participant_id: sender_id.to_string(),
            source: TargetSource::FallbackSelf,
        })
    }
}
