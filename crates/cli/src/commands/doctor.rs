//! `maestro doctor`: diagnose configuration and connectivity.

use std::path::Path;

use maestro_channels::HttpPresenceSource;
use maestro_config::AppConfig;
use maestro_core::presence::PresenceSource;
use maestro_core::provider::Provider;
use maestro_providers::OpenAiCompatProvider;

pub async fn run(env_file: &Path) -> maestro_core::Result<()> {
    println!("Maestro Doctor: System Diagnostics");
    println!("===================================\n");

    let mut issues = 0;

    let config = match AppConfig::load_from(env_file) {
        Ok(config) => {
            println!("  ✅ Config file valid ({})", env_file.display());
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  1 issue found. Fix the config file and run again.");
            return Ok(());
        }
    };

    let provider = OpenAiCompatProvider::from_config(&config);
    match provider.health_check().await {
        Ok(true) => println!("  ✅ Oracle reachable ({})", config.openai_url),
        Ok(false) => {
            println!("  ⚠️  Oracle rejected the request: check OPENAI_KEY");
            issues += 1;
        }
        Err(e) => {
            println!("  ❌ Oracle unreachable: {e}");
            issues += 1;
        }
    }

    match HttpPresenceSource::from_config(&config) {
        Ok(source) => match source.fetch_participants().await {
            Ok(ids) => println!("  ✅ Presence endpoint answered ({} participants)", ids.len()),
            Err(e) => {
                println!("  ❌ Presence endpoint {}: {e}", source.url());
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ❌ Presence endpoint: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
