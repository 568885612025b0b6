use std::path::PathBuf;

use anyhow::Result;
use tracing::{info, warn};

use limbus_gacha::bot::commands::GachaPlugin;
use limbus_gacha::bot::session;
use limbus_gacha::config::GachaConfig;
use limbus_gacha::DEFAULT_CONFIG_PATH;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let found = config_path.is_file();
    let config = if found {
        GachaConfig::load(&config_path)?
    } else {
        GachaConfig::default()
    };

    // Logs go to stderr so stdout carries replies only.
    tracing_subscriber::fmt()
        .with_max_level(config.log_level())
        .with_writer(std::io::stderr)
        .init();

    if found {
        info!("Loaded config from {}", config_path.display());
    } else {
        warn!("Config {} not found, using defaults", config_path.display());
    }
    for warning in config.warnings() {
        warn!("{}", warning);
    }

    let mut plugin = GachaPlugin::new(config)?;
    session::run_console(&mut plugin).await?;
    Ok(())
}
