//! Transport trait: the abstraction over the chat room connection.
//!
//! A Transport authenticates to a room, yields inbound text messages, and
//! accepts two kinds of outbound sends: *visible* (the recipient is prompted
//! to respond) and *silent* (the recipient only records the message).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::TransportError;

/// An inbound text message as delivered by the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomMessage {
    /// Participant id of the sender
    pub sender_id: String,

    /// Name the message is attributed to
    pub display_name: String,

    /// Raw text
    pub content: String,
}

impl RoomMessage {
    pub fn new(
        sender_id: impl Into<String>,
        display_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            sender_id: sender_id.into(),
            display_name: display_name.into(),
            content: content.into(),
        }
    }
}

/// How an outbound message is presented to its recipients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendKind {
    /// Displayed; the recipient is expected to respond
    Visible,
    /// Background notification; keeps the recipient's context current
    Silent,
}

/// Credentials and addressing for joining a room.
#[derive(Clone, PartialEq, Eq)]
pub struct RoomCredentials {
    pub endpoint: String,
    pub room: String,
    pub user: String,
    pub pass: String,
}

impl std::fmt::Debug for RoomCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomCredentials")
            .field("endpoint", &self.endpoint)
            .field("room", &self.room)
            .field("user", &self.user)
            .field("pass", &"[REDACTED]")
            .finish()
    }
}

/// The core Transport trait.
///
/// Sends are fire-and-forget from the caller's perspective: an `Ok` means the
/// instruction was accepted, not that it was delivered.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Human-readable transport name (e.g., "websocket").
    fn name(&self) -> &str;

    /// Connect and authenticate. Returns the stream of inbound messages,
    /// which closes when the connection ends.
    async fn connect(
        &self,
        credentials: &RoomCredentials,
    ) -> Result<mpsc::Receiver<RoomMessage>, TransportError>;

    /// Send a message that the recipients should display and act on.
    async fn send_visible(
        &self,
        display_name: &str,
        content: &str,
        recipients: &[String],
    ) -> Result<(), TransportError>;

    /// Send a message that the recipients should record without alerting.
    async fn send_silent(
        &self,
        display_name: &str,
        content: &str,
        recipients: &[String],
    ) -> Result<(), TransportError>;

    /// Dispatch by kind.
    async fn send(
        &self,
        kind: SendKind,
        display_name: &str,
        content: &str,
        recipients: &[String],
    ) -> Result<(), TransportError> {
        match kind {
            SendKind::Visible => self.send_visible(display_name, content, recipients).await,
            SendKind::Silent => self.send_silent(display_name, content, recipients).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_debug_redacts_password() {
        let creds = RoomCredentials {
            endpoint: "wss://rooms.example".into(),
            room: "collab".into(),
            user: "maestro".into(),
            pass: "hunter2".into(),
        };
        let debug = format!("{creds:?}");
        assert!(debug.contains("maestro"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn send_kind_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&SendKind::Silent).unwrap(), "\"silent\"");
    }
}
