use std::sync::Arc;

use crate::platform::{Media, Platform, PlatformError};

/// A Tweet resolved from a candidate link.
#[derive(Debug, Clone)]
pub struct ResolvedPost {
    pub id: String,
    pub author: String,
    pub text: String,
    pub media: Vec<Media>,
}

/// The fully assembled unit of output, ready for a sink.
#[derive(Debug, Clone)]
pub struct ResolvedRecord {
    pub source_url: String,
    pub post_id: String,
    pub author: String,
    pub content: String,
    /// Message text sent alongside the link, shortlink stripped.
    pub message: String,
    /// Recognized image text; empty unless OCR ran.
    pub ocr: String,
    /// Wayback Machine URL, or the failure sentinel.
    pub archive_url: String,
}

/// Outcome of resolving one candidate link.
pub enum Resolution {
    Post(ResolvedPost),
    /// The linked Tweet no longer exists; skip it and keep going.
    Gone,
}

/// Resolves candidate links into Tweets via the platform.
pub struct Resolver {
    platform: Arc<dyn Platform>,
}

impl Resolver {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self { platform }
    }

    pub async fn resolve(&self, url: &str) -> Result<Resolution, PlatformError> {
        let id = status_id(url)
            .ok_or_else(|| PlatformError::Parse(format!("no status id in {}", url)))?;

        match self.platform.get_status(&id).await {
            Ok(tweet) => Ok(Resolution::Post(ResolvedPost {
                id,
                author: tweet.author,
                text: tweet.text,
                media: tweet.media,
            })),
            Err(PlatformError::NotFound) => Ok(Resolution::Gone),
            Err(e) => Err(e),
        }
    }
}

/// The status id is the digit run following the final "status/" marker.
pub fn status_id(url: &str) -> Option<String> {
    let (_, tail) = url.rsplit_once("status/")?;
    let digits: String = tail.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

/// Strip the shortened self-link Twitter appends to a DM body: drop the
/// token after the last space.
pub fn message_without_shortlink(text: &str) -> &str {
    match text.rsplit_once(' ') {
        Some((head, _)) => head,
        None => text,
    }
}
