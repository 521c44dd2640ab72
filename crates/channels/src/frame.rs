//! Room wire protocol.
//!
//! Every WebSocket text frame is one JSON object tagged by `type`:
//!
//! ```text
//! → {"type":"auth","room":"collab","user":"maestro","pass":"..."}
//! ← {"type":"auth_ok"} | {"type":"auth_error","reason":"..."}
//! ← {"type":"text","from":"u1","payload":{"name":"Alice","content":"hi"}}
//! → {"type":"text","from":"maestro","to":["u2"],"payload":{...}}
//! → {"type":"data","from":"maestro","to":["u3"],"payload":{...}}
//! ```
//!
//! `text` frames are displayed by the recipient; `data` frames are recorded
//! silently.

use maestro_core::error::TransportError;
use maestro_core::transport::{RoomMessage, SendKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    Auth {
        room: String,
        user: String,
        pass: String,
    },
    AuthOk,
    AuthError {
        #[serde(default)]
        reason: String,
    },
    Text {
        from: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        to: Vec<String>,
        payload: Payload,
    },
    Data {
        from: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        to: Vec<String>,
        payload: Payload,
    },
}

impl Frame {
    pub fn decode(text: &str) -> Result<Self, TransportError> {
        serde_json::from_str(text).map_err(|e| TransportError::InvalidFrame(e.to_string()))
    }

    pub fn encode(&self) -> Result<String, TransportError> {
        serde_json::to_string(self).map_err(|e| TransportError::InvalidFrame(e.to_string()))
    }

    /// Build an outbound frame of the given kind.
    pub fn outbound(
        kind: SendKind,
        from: &str,
        display_name: &str,
        content: &str,
        recipients: &[String],
    ) -> Self {
        let payload = Payload {
            name: display_name.to_string(),
            content: content.to_string(),
        };
        let from = from.to_string();
        let to = recipients.to_vec();
        match kind {
            SendKind::Visible => Frame::Text { from, to, payload },
            SendKind::Silent => Frame::Data { from, to, payload },
        }
    }

    /// The inbound room message carried by a `text` frame, if any.
    ///
    /// `data` frames are other clients' silent traffic and never trigger routing.
    pub fn into_room_message(self) -> Option<RoomMessage> {
        match self {
            Frame::Text { from, payload, .. } => {
                Some(RoomMessage::new(from, payload.name, payload.content))
            }
            _ => None,
        }
    }
}
