use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::config::{BotConfig, SinkMode};
use crate::resolver::ResolvedRecord;

/// Terminal delivery step. Submission is fire-and-forget: a failure is
/// reported to the caller for logging, but the record is never retried.
#[async_trait]
pub trait SinkDispatch: Send + Sync {
    async fn submit(&self, record: &ResolvedRecord) -> Result<()>;
}

/// The two delivery targets, fixed per bot at construction time.
pub enum Sink {
    Tabular(TabularSink),
    Webhook(WebhookSink),
}

impl Sink {
    pub fn from_config(config: &BotConfig) -> Result<Self> {
        match config.mode {
            SinkMode::Tabular => {
                let api_key = config
                    .api_key
                    .clone()
                    .context("tabular mode requires an api_key")?;
                Ok(Sink::Tabular(TabularSink {
                    client: reqwest::Client::new(),
                    endpoint: config.endpoint.clone(),
                    api_key,
                }))
            }
            SinkMode::Webhook => Ok(Sink::Webhook(WebhookSink {
                client: reqwest::Client::new(),
                endpoint: config.endpoint.clone(),
            })),
        }
    }
}

#[async_trait]
impl SinkDispatch for Sink {
    async fn submit(&self, record: &ResolvedRecord) -> Result<()> {
        match self {
            Sink::Tabular(sink) => sink.submit(record).await,
            Sink::Webhook(sink) => sink.submit(record).await,
        }
    }
}

/// Airtable-style single-row insert with bearer auth.
pub struct TabularSink {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Serialize)]
struct TabularRow<'a> {
    fields: TabularFields<'a>,
}

#[derive(Serialize)]
struct TabularFields<'a> {
    #[serde(rename = "Tweet URL")]
    url: &'a str,
    #[serde(rename = "Tweet author")]
    author: &'a str,
    #[serde(rename = "Tweet content")]
    content: &'a str,
    #[serde(rename = "Archive URL")]
    archive_url: &'a str,
    #[serde(rename = "Message")]
    message: &'a str,
    #[serde(rename = "Image OCR")]
    ocr: &'a str,
}

fn tabular_row(record: &ResolvedRecord) -> TabularRow<'_> {
    TabularRow {
        fields: TabularFields {
            url: &record.source_url,
            author: &record.author,
            content: &record.content,
            archive_url: &record.archive_url,
            message: &record.message,
            ocr: &record.ocr,
        },
    }
}

impl TabularSink {
    async fn submit(&self, record: &ResolvedRecord) -> Result<()> {
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&tabular_row(record))
            .send()
            .await
            .context("Tabular request failed")?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if status.as_u16() != 200 {
            bail!("Tabular response error: {} {}", status, body);
        }
        let parsed: serde_json::Value =
            serde_json::from_str(&body).context("Tabular response is not JSON")?;
        if parsed.get("id").is_none() {
            bail!("Tabular response carried no record id: {}", body);
        }

        info!("Sent one Tweet to the table: {}", record.source_url);
        Ok(())
    }
}

/// Plain webhook POST, no authentication.
pub struct WebhookSink {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Serialize)]
struct WebhookPayload {
    text: String,
}

fn webhook_text(record: &ResolvedRecord) -> String {
    format!(
        "```\n{}\n```\n```{}\n```\n{}\n> *Archived at <{}>*",
        record.content, record.message, record.source_url, record.archive_url
    )
}

impl WebhookSink {
    async fn submit(&self, record: &ResolvedRecord) -> Result<()> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&WebhookPayload {
                text: webhook_text(record),
            })
            .send()
            .await
            .context("Webhook request failed")?;

        let status = resp.status().as_u16();
        if status != 200 && status != 201 {
            let body = resp.text().await.unwrap_or_default();
            bail!("Webhook response error: {} {}", status, body);
        }

        info!("Sent one Tweet to the webhook: {}", record.source_url);
        Ok(())
    }
}
