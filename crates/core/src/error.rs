//! Error types for the Maestro domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each collaborator has its own error enum; none of them is allowed to
//! terminate the routing engine.

use thiserror::Error;

/// The top-level error type for Maestro operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Presence error: {0}")]
    Presence(#[from] PresenceError),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl Error {
    /// Wrap a configuration failure reported by the config loader.
    pub fn config(message: impl std::fmt::Display) -> Self {
        Self::Config {
            message: message.to_string(),
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to connect to {endpoint}: {reason}")]
    ConnectFailed { endpoint: String, reason: String },

    #[error("Room rejected credentials: {0}")]
    AuthRejected(String),

    #[error("Room connection lost: {0}")]
    ConnectionLost(String),

    #[error("Message delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
}

#[derive(Debug, Error)]
pub enum PresenceError {
    #[error("Could not reach presence endpoint: {0}")]
    Network(String),

    #[error("Presence endpoint returned an unusable body: {0}")]
    InvalidBody(String),
}
