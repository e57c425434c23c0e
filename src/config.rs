use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SinkMode {
    Tabular,
    Webhook,
}

impl std::fmt::Display for SinkMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkMode::Tabular => write!(f, "tabular"),
            SinkMode::Webhook => write!(f, "webhook"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TwitterCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BotConfig {
    pub name: String,
    pub mode: SinkMode,
    pub endpoint: String,
    pub twitter: TwitterCredentials,
    /// Sink API key, required for tabular mode.
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub bots: Vec<BotConfig>,
    #[serde(default)]
    pub enable_ocr: bool,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_backoff_secs() -> u64 {
    900
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.bots.is_empty() {
            bail!("No bots configured");
        }
        for bot in &self.bots {
            if bot.mode == SinkMode::Tabular && bot.api_key.is_none() {
                bail!("Bot {} uses tabular mode but has no api_key", bot.name);
            }
            if bot.endpoint.is_empty() {
                bail!("Bot {} has an empty endpoint", bot.name);
            }
        }
        Ok(())
    }
}
