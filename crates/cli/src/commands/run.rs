//! `maestro run`: join the room and route messages.

use std::path::Path;
use std::sync::Arc;

use maestro_channels::{HttpPresenceSource, WsRoomTransport};
use maestro_config::AppConfig;
use maestro_core::Error;
use maestro_core::transport::Transport;
use maestro_engine::{Maestro, MaestroSettings};
use maestro_providers::OpenAiCompatProvider;
use tracing::{error, info};

pub async fn run(env_file: &Path) -> maestro_core::Result<()> {
    let config = AppConfig::load_from(env_file).map_err(Error::config)?;

    let provider = Arc::new(OpenAiCompatProvider::from_config(&config));
    let presence = Arc::new(HttpPresenceSource::from_config(&config)?);
    let transport = Arc::new(WsRoomTransport::new());

    let inbound = match transport.connect(&config.credentials()).await {
        Ok(rx) => rx,
        Err(e) => {
            error!(endpoint = %config.url, error = %e, "Failed to connect to room");
            return Err(e.into());
        }
    };

    info!(
        room = %config.room,
        model = %config.model,
        presence = %presence.url(),
        serialized = config.serialize_resolution,
        "Maestro running"
    );

    let engine = Maestro::new(
        MaestroSettings::from_config(&config),
        provider,
        transport,
        presence,
    );

    let poller = engine.spawn_presence_poller();
    engine.run(inbound).await;
    poller.abort();

    info!("Room connection ended, shutting down");
    Ok(())
}
