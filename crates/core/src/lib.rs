//! # Maestro Core
//!
//! Domain types, collaborator traits, and error definitions for the Maestro
//! dialogue router. This crate has **no I/O**: it defines the seams that the
//! engine is written against:
//!
//! - [`Provider`]: the language-model oracle that proposes who speaks next
//! - [`Transport`]: the chat room connection (inbound events, outbound sends)
//! - [`PresenceSource`]: the endpoint listing who is currently in the room
//!
//! Implementations live in `maestro-providers` and `maestro-channels`; tests
//! substitute scripted mocks.

pub mod error;
pub mod message;
pub mod presence;
pub mod provider;
pub mod transport;

// Re-export key types at crate root for ergonomics
pub use error::{Error, PresenceError, ProviderError, Result, TransportError};
pub use message::{Message, Role};
pub use presence::PresenceSource;
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use transport::{RoomCredentials, RoomMessage, SendKind, Transport};
