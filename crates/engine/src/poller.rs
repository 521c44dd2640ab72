//! Presence poller: periodically learns who is in the room.

use std::sync::Arc;
use std::time::Duration;

use maestro_core::presence::PresenceSource;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::registry::SharedRegistry;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Feeds presence results into the registry on a fixed interval. Only ever
/// adds participants; the engine's own account is skipped.
pub struct PresencePoller {
    source: Arc<dyn PresenceSource>,
    registry: SharedRegistry,
    self_id: String,
    interval: Duration,
}

impl PresencePoller {
    pub fn new(
        source: Arc<dyn PresenceSource>,
        registry: SharedRegistry,
        self_id: impl Into<String>,
    ) -> Self {
        Self {
            source,
            registry,
            self_id: self_id.into(),
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Fetch once and register newcomers. Fetch failures count as an empty
    /// result. Returns the number of participants added.
    pub async fn poll_once(&self) -> usize {
        let ids = match self.source.fetch_participants().await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "Presence fetch failed");
                Vec::new()
            }
        };

        let mut registry = self.registry.write().await;
        let added = registry.upsert_from_presence(ids.iter().filter(|id| **id != self.self_id));

        if added > 0 {
            info!(added, total = registry.len(), "New participants present");
        }
        debug!(participants = ?registry.all(), "Known participants");
        added
    }

    /// Poll forever: immediately, then once per interval.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                self.poll_once().await;
            }
        })
    }
}
