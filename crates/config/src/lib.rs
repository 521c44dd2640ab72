//! Configuration loading and validation for Maestro.
//!
//! Loads a local dotenv-style file (`./.env` by default) once at startup.
//! `MAESTRO_<KEY>` environment variables override values from the file.
//! Validates all settings before the engine is built.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use maestro_core::transport::RoomCredentials;
use serde::Deserialize;

/// Prefix for environment variable overrides (`MAESTRO_ROOM=...`).
pub const ENV_PREFIX: &str = "MAESTRO";

/// The root configuration structure.
///
/// Keys are matched case-insensitively, so `OPENAI_KEY` in the file fills
/// `openai_key`.
#[derive(Clone, Deserialize)]
pub struct AppConfig {
    /// Room WebSocket endpoint
    #[serde(default)]
    pub url: String,

    /// Engine account name in the room
    #[serde(default)]
    pub user: String,

    /// Engine account password
    #[serde(default)]
    pub pass: String,

    /// Room identifier
    #[serde(default)]
    pub room: String,

    /// Oracle API key
    #[serde(default)]
    pub openai_key: String,

    /// Oracle base URL (OpenAI-compatible)
    #[serde(default = "default_openai_url")]
    pub openai_url: String,

    /// Oracle model
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature for the oracle
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per oracle response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Conversation backlog capacity
    #[serde(default = "default_max_backlog")]
    pub max_backlog: usize,

    /// Presence polling interval in seconds
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Explicit presence endpoint; derived from `url` when absent
    #[serde(default)]
    pub presence_url: Option<String>,

    /// Serialize target resolution per room instead of allowing interleaving
    #[serde(default)]
    pub serialize_resolution: bool,
}

fn default_openai_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    1.0
}
fn default_max_tokens() -> u32 {
    100
}
fn default_max_backlog() -> usize {
    10
}
fn default_poll_interval_secs() -> u64 {
    15
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("pass", &"[REDACTED]")
            .field("room", &self.room)
            .field("openai_key", &"[REDACTED]")
            .field("openai_url", &self.openai_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_backlog", &self.max_backlog)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("presence_url", &self.presence_url)
            .field("serialize_resolution", &self.serialize_resolution)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from `./.env` with environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path())
    }

    /// Load configuration from a specific dotenv file, applying
    /// `MAESTRO_<KEY>` overrides from the process environment.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let entries = read_env_file(path)?;
        tracing::debug!(path = %path.display(), keys = entries.len(), "Loaded config file");

        Self::from_sources(entries, std::env::vars().collect())
    }

    /// The default config file location.
    pub fn default_path() -> PathBuf {
        PathBuf::from(".env")
    }

    /// Build a validated config from file entries and environment variables.
    /// Only variables carrying the `MAESTRO_` prefix are considered, and they
    /// win over the file.
    pub fn from_sources(
        file: HashMap<String, String>,
        env: HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let config: Self = config::Config::builder()
            .add_source(config::Environment::default().source(Some(file)))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).source(Some(env)))
            .build()
            .and_then(|merged| merged.try_deserialize())
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("URL", &self.url),
            ("USER", &self.user),
            ("PASS", &self.pass),
            ("ROOM", &self.room),
            ("OPENAI_KEY", &self.openai_key),
        ];
        if let Some((key, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ConfigError::MissingKey((*key).into()));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "TEMPERATURE must be between 0.0 and 2.0".into(),
            ));
        }

        if self.max_backlog == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_BACKLOG must be at least 1".into(),
            ));
        }

        if self.poll_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "POLL_INTERVAL_SECS must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Room credentials for the transport.
    pub fn credentials(&self) -> RoomCredentials {
        RoomCredentials {
            endpoint: self.url.clone(),
            room: self.room.clone(),
            user: self.user.clone(),
            pass: self.pass.clone(),
        }
    }

    /// Presence polling interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Read a dotenv file into key/value entries without touching the process
/// environment.
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let lines = dotenvy::from_path_iter(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    collect_entries(lines)
}

/// Parse dotenv content held in memory.
pub fn parse_env_str(content: &str) -> Result<HashMap<String, String>, ConfigError> {
    collect_entries(dotenvy::from_read_iter(content.as_bytes()))
}

fn collect_entries<R: std::io::Read>(
    lines: dotenvy::Iter<R>,
) -> Result<HashMap<String, String>, ConfigError> {
    lines
        .map(|line| line.map_err(|e| ConfigError::ParseError(e.to_string())))
        .collect()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    ParseError(String),

    #[error("Missing required config key: {0}")]
    MissingKey(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
