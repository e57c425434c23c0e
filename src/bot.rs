use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::archive::Archiver;
use crate::extract;
use crate::platform::{DirectMessage, Platform, PlatformError};
use crate::resolver::{self, Resolution, ResolvedRecord, Resolver};
use crate::sink::SinkDispatch;

/// Maximum number of pending DMs fetched per poll.
const DM_BATCH_SIZE: u32 = 50;

/// What a single poll cycle did, deciding the next delay.
#[derive(Debug, PartialEq, Eq)]
enum CycleOutcome {
    /// Nothing pending; take the short delay.
    Idle,
    /// A batch was consumed and dispatched; take the short delay.
    Processed,
    /// The platform rate-limited us; take the long cooldown.
    Backoff,
}

/// One configured bot: inbox, resolver, archiver and sink, driven by
/// its own poll -> process -> sleep loop.
pub struct Bot {
    name: String,
    platform: Arc<dyn Platform>,
    resolver: Resolver,
    archiver: Archiver,
    sink: Box<dyn SinkDispatch>,
    ocr_enabled: bool,
    #[cfg(feature = "ocr")]
    http: reqwest::Client,
    empty_streak: bool,
}

impl Bot {
    pub fn new(
        name: String,
        platform: Arc<dyn Platform>,
        sink: Box<dyn SinkDispatch>,
        archiver: Archiver,
        ocr_enabled: bool,
    ) -> Self {
        Self {
            resolver: Resolver::new(Arc::clone(&platform)),
            name,
            platform,
            archiver,
            sink,
            ocr_enabled,
            #[cfg(feature = "ocr")]
            http: reqwest::Client::new(),
            empty_streak: false,
        }
    }

    /// Drive the loop forever. Returns only on a fatal authentication
    /// failure; every other error is absorbed by the cycle.
    pub async fn run(mut self, poll_interval: Duration, cooldown: Duration) -> Result<()> {
        loop {
            match self.run_cycle().await? {
                CycleOutcome::Backoff => {
                    warn!(
                        "{} rate limited, stopping for {}s.",
                        self.name,
                        cooldown.as_secs()
                    );
                    sleep(cooldown).await;
                }
                CycleOutcome::Idle | CycleOutcome::Processed => sleep(poll_interval).await,
            }
        }
    }

    async fn run_cycle(&mut self) -> Result<CycleOutcome> {
        let dms = match self.check_dms().await {
            Ok(dms) => dms,
            Err(PlatformError::RateLimited) => return Ok(CycleOutcome::Backoff),
            Err(PlatformError::Unauthorized) => {
                bail!("Twitter authentication failed for bot {}", self.name)
            }
            Err(e) => {
                error!("Could not list DMs for {}: {}", self.name, e);
                return Ok(CycleOutcome::Idle);
            }
        };

        if dms.is_empty() {
            return Ok(CycleOutcome::Idle);
        }

        for dm in &dms {
            let records = match self.resolve_dm(dm).await {
                Ok(records) => records,
                Err(PlatformError::RateLimited) => return Ok(CycleOutcome::Backoff),
                Err(PlatformError::Unauthorized) => {
                    bail!("Twitter authentication failed for bot {}", self.name)
                }
                Err(e) => {
                    error!("Could not process DM {}: {}", dm.id, e);
                    continue;
                }
            };

            for mut record in records {
                record.archive_url = self.archiver.archive(&record.source_url).await;
                if let Err(e) = self.sink.submit(&record).await {
                    error!(
                        "Delivery failed for {}, record lost: {:#}",
                        record.source_url, e
                    );
                }
            }
        }

        Ok(CycleOutcome::Processed)
    }

    async fn check_dms(&mut self) -> Result<Vec<DirectMessage>, PlatformError> {
        let dms = self.platform.list_direct_messages(DM_BATCH_SIZE).await?;
        if dms.is_empty() {
            // Only announce an empty inbox once per streak.
            if !self.empty_streak {
                info!("No new DMs found in the {} inbox.", self.name);
                self.empty_streak = true;
            }
        } else {
            self.empty_streak = false;
            info!("{} DMs found in the {} inbox.", dms.len(), self.name);
        }
        Ok(dms)
    }

    /// Turn one DM into records, then consume it. The DM is deleted once
    /// its links have been extracted, whether or not anything resolved;
    /// delivery failures later on do not bring it back.
    async fn resolve_dm(&self, dm: &DirectMessage) -> Result<Vec<ResolvedRecord>, PlatformError> {
        let candidates = extract::tweet_links(dm);
        // The trailing t.co self-link is not part of the sender's note.
        let message = resolver::message_without_shortlink(&dm.text).to_string();

        let mut records = Vec::new();
        for url in candidates {
            match self.resolver.resolve(&url).await {
                Ok(Resolution::Post(post)) => {
                    let ocr = self.ocr_text(&post.media).await;
                    records.push(ResolvedRecord {
                        source_url: url,
                        post_id: post.id,
                        author: post.author,
                        content: post.text,
                        message: message.clone(),
                        ocr,
                        archive_url: String::new(),
                    });
                }
                Ok(Resolution::Gone) => {
                    info!("Looks like that Tweet ({}) has already been deleted.", url);
                }
                Err(e @ (PlatformError::RateLimited | PlatformError::Unauthorized)) => {
                    return Err(e)
                }
                Err(e) => warn!("Could not resolve {}, skipping: {}", url, e),
            }
        }

        match self.platform.destroy_direct_message(&dm.id).await {
            Ok(()) => {}
            Err(e @ (PlatformError::RateLimited | PlatformError::Unauthorized)) => return Err(e),
            Err(e) => warn!("Could not delete DM {}: {}", dm.id, e),
        }

        Ok(records)
    }

    #[cfg(feature = "ocr")]
    async fn ocr_text(&self, media: &[crate::platform::Media]) -> String {
        if !self.ocr_enabled {
            return String::new();
        }
        crate::ocr::extract_media_text(&self.http, media).await
    }

    #[cfg(not(feature = "ocr"))]
    async fn ocr_text(&self, _media: &[crate::platform::Media]) -> String {
        if self.ocr_enabled {
            tracing::debug!("OCR enabled in config but this build carries no ocr feature");
        }
        String::new()
    }
}
