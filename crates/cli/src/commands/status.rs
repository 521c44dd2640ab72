//! `maestro status`: show the effective configuration.

use std::path::Path;

use maestro_channels::presence_url;
use maestro_config::AppConfig;
use maestro_core::Error;

pub async fn run(env_file: &Path) -> maestro_core::Result<()> {
    let config = AppConfig::load_from(env_file).map_err(Error::config)?;

    let presence = match &config.presence_url {
        Some(url) => url.clone(),
        None => presence_url(&config.url, &config.room).unwrap_or_else(|e| format!("<{e}>")),
    };

    println!("Maestro Status");
    println!("==============");
    println!("  Config file:   {}", env_file.display());
    println!("  Room:          {}", config.room);
    println!("  Endpoint:      {}", config.url);
    println!("  Account:       {}", config.user);
    println!("  Presence:      {presence}");
    println!("  Poll interval: {}s", config.poll_interval_secs);
    println!("  Oracle:        {} ({})", config.model, config.openai_url);
    println!("  Temperature:   {}", config.temperature);
    println!("  Max tokens:    {}", config.max_tokens);
    println!("  Backlog:       {} messages", config.max_backlog);
    let resolution = if config.serialize_resolution {
        "serialized"
    } else {
        "interleaved"
    };
    println!("  Resolution:    {resolution}");

    Ok(())
}
