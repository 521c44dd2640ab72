//! Chat-completion message types.
//!
//! These are the turns sent to the oracle: one system prompt followed by the
//! backlog, each backlog turn attributed to the participant who spoke it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role of a message author in an oracle conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A room participant (human or agent)
    User,
    /// The oracle's own reply
    Assistant,
    /// System instructions
    System,
}

/// A single message in an oracle conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// Speaker attribution for multi-party turns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The text content
    pub content: String,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn with_role(role: Role, name: Option<String>, content: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            name,
            content,
            timestamp: Utc::now(),
        }
    }

    /// Create a user message attributed to a named speaker.
    pub fn named_user(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::with_role(Role::User, Some(name.into()), content.into())
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, None, content.into())
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, None, content.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assistant_message_is_anonymous() {
        let msg = Message::assistant("Bob");
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.content, "Bob");
        assert!(msg.name.is_none());
    }

    #[test]
    fn named_user_carries_speaker() {
        let msg = Message::named_user("Alice", "Alice: hi");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.name.as_deref(), Some("Alice"));
    }

    #[test]
    fn anonymous_message_omits_name_field() {
        let json = serde_json::to_string(&Message::system("rules")).unwrap();
        assert!(json.contains("\"system\""));
        assert!(!json.contains("\"name\""));
    }
}
