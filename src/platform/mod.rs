pub mod oauth;
pub mod twitter;

use async_trait::async_trait;
use thiserror::Error;

/// A direct message pending in the bot account's inbox.
#[derive(Debug, Clone)]
pub struct DirectMessage {
    pub id: String,
    /// Free-text body of the message.
    pub text: String,
    /// Expanded URLs of the message's url entities, in original order.
    pub links: Vec<String>,
}

/// A resolved Tweet.
#[derive(Debug, Clone)]
pub struct Tweet {
    pub author: String,
    pub text: String,
    pub media: Vec<Media>,
}

/// An attached media item.
#[derive(Debug, Clone)]
pub struct Media {
    /// Media kind as reported by the platform ("photo", "video", ...).
    pub kind: String,
    pub url: String,
}

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("resource no longer exists")]
    NotFound,

    #[error("rate limited")]
    RateLimited,

    #[error("authentication rejected")]
    Unauthorized,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for PlatformError {
    fn from(err: reqwest::Error) -> Self {
        PlatformError::Network(err.to_string())
    }
}

/// Seam over the messaging platform, so the orchestrator can be driven
/// against an in-memory inbox in tests.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Check that the configured credentials work; returns the account handle.
    async fn verify_credentials(&self) -> Result<String, PlatformError>;

    /// List up to `count` pending direct messages, oldest context preserved.
    async fn list_direct_messages(&self, count: u32) -> Result<Vec<DirectMessage>, PlatformError>;

    /// Irrevocably delete a direct message from the inbox.
    async fn destroy_direct_message(&self, id: &str) -> Result<(), PlatformError>;

    /// Fetch a single Tweet by status id.
    async fn get_status(&self, id: &str) -> Result<Tweet, PlatformError>;
}
