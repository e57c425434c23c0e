mod archive;
mod bot;
mod config;
mod extract;
#[cfg(feature = "ocr")]
mod ocr;
mod platform;
mod resolver;
mod sink;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::archive::Archiver;
use crate::bot::Bot;
use crate::config::{Config, SinkMode};
use crate::platform::twitter::TwitterClient;
use crate::platform::Platform;
use crate::sink::Sink;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,bookmarkbot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Bots: {}", config.bots.len());
    info!("  OCR enabled: {}", config.enable_ocr);
    if config.enable_ocr && !cfg!(feature = "ocr") {
        warn!("enable_ocr is set but this build carries no ocr feature; OCR text will be empty");
    }

    let poll_interval = Duration::from_secs(config.poll_interval_secs);
    let cooldown = Duration::from_secs(config.backoff_secs);

    // Authenticate and wire up every configured bot; any failure here is fatal.
    let mut bots = JoinSet::new();
    for bot_config in &config.bots {
        let client = TwitterClient::new(bot_config.twitter.clone());
        let account = client
            .verify_credentials()
            .await
            .with_context(|| format!("Could not log in to Twitter for bot {}", bot_config.name))?;
        info!("Bot {} authenticated as @{}", bot_config.name, account);

        let sink = Sink::from_config(bot_config)
            .with_context(|| format!("Could not configure sink for bot {}", bot_config.name))?;
        info!(
            "Configured {} bot object for {}",
            bot_config.mode, bot_config.name
        );

        let platform: Arc<dyn Platform> = Arc::new(client);
        let ocr_enabled = config.enable_ocr && bot_config.mode == SinkMode::Tabular;
        let bot = Bot::new(
            bot_config.name.clone(),
            platform,
            Box::new(sink),
            Archiver::new(),
            ocr_enabled,
        );
        bots.spawn(bot.run(poll_interval, cooldown));
    }

    info!("bookmarkbot is running");

    // Bots only return on a fatal error; the first one tears the process down.
    while let Some(joined) = bots.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!("Bot terminated: {:#}", e);
                return Err(e);
            }
            Err(e) => {
                error!("Bot task panicked: {}", e);
                anyhow::bail!("bot task panicked");
            }
        }
    }

    Ok(())
}
