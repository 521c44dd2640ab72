//! HTTP presence source.
//!
//! The room server publishes the ids of connected clients as a JSON array at
//! `http://<host>:5000/Websocket?roomId=<room>`.

use async_trait::async_trait;
use maestro_config::AppConfig;
use maestro_core::error::PresenceError;
use maestro_core::presence::PresenceSource;
use tracing::debug;

const PRESENCE_PORT: u16 = 5000;
const PRESENCE_PATH: &str = "/Websocket";

/// Derive the presence URL from the room endpoint.
///
/// Keeps the host, forces `http`, port 5000 and the `/Websocket` path, and
/// carries the room as the `roomId` query parameter.
pub fn presence_url(endpoint: &str, room: &str) -> Result<String, PresenceError> {
    let mut url = reqwest::Url::parse(endpoint)
        .map_err(|e| PresenceError::Network(format!("Invalid room endpoint {endpoint}: {e}")))?;

    url.set_scheme("http")
        .map_err(|_| PresenceError::Network(format!("Cannot derive http URL from {endpoint}")))?;
    url.set_port(Some(PRESENCE_PORT))
        .map_err(|_| PresenceError::Network(format!("Endpoint {endpoint} has no host")))?;
    url.set_path(PRESENCE_PATH);
    url.query_pairs_mut().clear().append_pair("roomId", room);

    Ok(url.to_string())
}

/// Parse a presence response body. Anything but a JSON array is rejected;
/// non-string elements are skipped.
pub fn parse_presence_body(body: &str) -> Result<Vec<String>, PresenceError> {
    let json: serde_json::Value =
        serde_json::from_str(body).map_err(|e| PresenceError::InvalidBody(e.to_string()))?;

    let items = json
        .as_array()
        .ok_or_else(|| PresenceError::InvalidBody("expected a JSON array".into()))?;

    Ok(items
        .iter()
        .filter_map(|v| v.as_str().map(String::from))
        .collect())
}

/// Polls the room server's presence endpoint over HTTP.
pub struct HttpPresenceSource {
    url: String,
    client: reqwest::Client,
}

impl HttpPresenceSource {
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            url: url.into(),
            client,
        }
    }

    /// Build from config: explicit `PRESENCE_URL`, else derived from `URL`.
    pub fn from_config(config: &AppConfig) -> Result<Self, PresenceError> {
        let url = match &config.presence_url {
            Some(url) => url.clone(),
            None => presence_url(&config.url, &config.room)?,
        };
        Ok(Self::new(url))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PresenceSource for HttpPresenceSource {
    async fn fetch_participants(&self) -> Result<Vec<String>, PresenceError> {
        debug!(url = %self.url, "Fetching participants");

        let response = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| PresenceError::Network(e.to_string()))?;

        let body = response
            .text()
            .await
            .map_err(|e| PresenceError::Network(e.to_string()))?;

        parse_presence_body(&body)
    }
}
