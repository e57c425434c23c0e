use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::{debug, warn};

/// Fixed marker stored in place of an archive URL when the Wayback
/// Machine could not be reached or refused the capture.
pub const ARCHIVE_FAILED_SENTINEL: &str = "<could not archive>";

const SAVE_TIMEOUT: Duration = Duration::from_secs(60);

/// Submits URLs to the Wayback Machine's save-now endpoint.
pub struct Archiver {
    client: reqwest::Client,
    base_url: String,
}

impl Archiver {
    pub fn new() -> Self {
        Self::with_base_url("https://web.archive.org")
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Archive a URL, best-effort. Never fails: any error is logged and
    /// collapsed into the sentinel so the record still gets delivered.
    pub async fn archive(&self, url: &str) -> String {
        match self.save(url).await {
            Ok(archive_url) => {
                debug!("Archived {} at {}", url, archive_url);
                archive_url
            }
            Err(e) => {
                warn!("Could not archive {}: {:#}", url, e);
                ARCHIVE_FAILED_SENTINEL.to_string()
            }
        }
    }

    async fn save(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(format!("{}/save/{}", self.base_url, url))
            .timeout(SAVE_TIMEOUT)
            .send()
            .await
            .context("Save request failed")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("Archive service returned status {}", status);
        }

        // The capture's location comes back in the Content-Location
        // header; older responses redirect straight to the /web/ URL.
        if let Some(location) = resp.headers().get("content-location") {
            let location = location
                .to_str()
                .context("Content-Location is not valid UTF-8")?;
            return Ok(format!("{}{}", self.base_url, location));
        }
        if resp.url().path().starts_with("/web/") {
            return Ok(resp.url().to_string());
        }
        bail!("Archive response carried no capture location");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_service_yields_sentinel() {
        // Port 1 is closed; the connection is refused immediately.
        let archiver = Archiver::with_base_url("http://127.0.0.1:1");
        let result = archiver.archive("https://twitter.com/acme/status/12345").await;
        assert_eq!(result, ARCHIVE_FAILED_SENTINEL);
    }
}
