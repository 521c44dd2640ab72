//! PresenceSource trait: who is currently connected to the room.

use async_trait::async_trait;

use crate::error::PresenceError;

/// Lists the participant identifiers currently present in a room.
///
/// Implementations must not filter out the engine's own account; the
/// presence poller does that.
#[async_trait]
pub trait PresenceSource: Send + Sync {
    async fn fetch_participants(&self) -> Result<Vec<String>, PresenceError>;
}
