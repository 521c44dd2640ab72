//! Room transport and presence bindings for Maestro.
//!
//! - **WebSocket**: JSON-framed room connection implementing `Transport`
//! - **Presence**: HTTP endpoint listing connected participant ids

pub mod frame;
pub mod presence;
pub mod websocket;

pub use frame::{Frame, Payload};
pub use presence::{HttpPresenceSource, parse_presence_body, presence_url};
pub use websocket::WsRoomTransport;
