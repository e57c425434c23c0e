use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config::TwitterCredentials;
use crate::platform::{oauth, DirectMessage, Media, Platform, PlatformError, Tweet};

const API_BASE: &str = "https://api.twitter.com/1.1";

/// Twitter error code for "No status found with that ID".
const CODE_NOT_FOUND: i64 = 144;
/// Twitter error code for a deleted or withheld resource.
const CODE_GONE: i64 = 34;
/// Twitter error code for "Rate limit exceeded".
const CODE_RATE_LIMITED: i64 = 88;

pub struct TwitterClient {
    client: reqwest::Client,
    creds: TwitterCredentials,
}

impl TwitterClient {
    pub fn new(creds: TwitterCredentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            creds,
        }
    }

    fn signed(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
    ) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", API_BASE, path);
        let auth = oauth::authorization_header(&self.creds, method.as_str(), &url, params);
        let mut req = self.client.request(method, &url).header("Authorization", auth);
        if !params.is_empty() {
            req = req.query(params);
        }
        req
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, PlatformError> {
        let resp = self.signed(Method::GET, path, params).send().await?;
        let resp = check(resp).await?;
        resp.json::<T>()
            .await
            .map_err(|e| PlatformError::Parse(e.to_string()))
    }
}

async fn check(resp: reqwest::Response) -> Result<reqwest::Response, PlatformError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(map_api_error(status.as_u16(), &body))
}

/// Map a non-success Twitter response onto the error taxonomy. The body
/// is consulted for Twitter's numeric error codes since some failures
/// arrive with a generic HTTP status.
fn map_api_error(status: u16, body: &str) -> PlatformError {
    let code = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.errors.first().map(|e| e.code));

    match (status, code) {
        (401, _) => PlatformError::Unauthorized,
        (429, _) | (_, Some(CODE_RATE_LIMITED)) => PlatformError::RateLimited,
        (404, _) | (_, Some(CODE_NOT_FOUND)) | (_, Some(CODE_GONE)) => PlatformError::NotFound,
        _ => PlatformError::Api {
            status,
            message: body.to_string(),
        },
    }
}

#[async_trait]
impl Platform for TwitterClient {
    async fn verify_credentials(&self) -> Result<String, PlatformError> {
        let account: VerifyResponse = self
            .get_json("account/verify_credentials.json", &[])
            .await?;
        Ok(account.screen_name)
    }

    async fn list_direct_messages(&self, count: u32) -> Result<Vec<DirectMessage>, PlatformError> {
        let count = count.to_string();
        let listing: DmListResponse = self
            .get_json("direct_messages/events/list.json", &[("count", count.as_str())])
            .await?;
        Ok(listing.events.into_iter().map(DirectMessage::from).collect())
    }

    async fn destroy_direct_message(&self, id: &str) -> Result<(), PlatformError> {
        let resp = self
            .signed(
                Method::DELETE,
                "direct_messages/events/destroy.json",
                &[("id", id)],
            )
            .send()
            .await?;
        check(resp).await?;
        debug!("Deleted DM {}", id);
        Ok(())
    }

    async fn get_status(&self, id: &str) -> Result<Tweet, PlatformError> {
        let status: StatusResponse = self.get_json("statuses/show.json", &[("id", id)]).await?;
        Ok(Tweet::from(status))
    }
}

// Wire formats.

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    screen_name: String,
}

#[derive(Debug, Deserialize)]
struct DmListResponse {
    #[serde(default)]
    events: Vec<DmEvent>,
}

#[derive(Debug, Deserialize)]
struct DmEvent {
    id: String,
    message_create: MessageCreate,
}

#[derive(Debug, Deserialize)]
struct MessageCreate {
    message_data: MessageData,
}

#[derive(Debug, Deserialize)]
struct MessageData {
    text: String,
    #[serde(default)]
    entities: Entities,
}

#[derive(Debug, Deserialize, Default)]
struct Entities {
    #[serde(default)]
    urls: Vec<UrlEntity>,
}

#[derive(Debug, Deserialize)]
struct UrlEntity {
    expanded_url: String,
}

impl From<DmEvent> for DirectMessage {
    fn from(event: DmEvent) -> Self {
        let data = event.message_create.message_data;
        DirectMessage {
            id: event.id,
            text: data.text,
            links: data.entities.urls.into_iter().map(|u| u.expanded_url).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    user: StatusUser,
    text: String,
    extended_entities: Option<ExtendedEntities>,
}

#[derive(Debug, Deserialize)]
struct StatusUser {
    screen_name: String,
}

#[derive(Debug, Deserialize, Default)]
struct ExtendedEntities {
    #[serde(default)]
    media: Vec<MediaItem>,
}

#[derive(Debug, Deserialize)]
struct MediaItem {
    #[serde(rename = "type")]
    kind: String,
    media_url_https: String,
}

impl From<StatusResponse> for Tweet {
    fn from(status: StatusResponse) -> Self {
        Tweet {
            author: status.user.screen_name,
            text: status.text,
            media: status
                .extended_entities
                .unwrap_or_default()
                .media
                .into_iter()
                .map(|m| Media {
                    kind: m.kind,
                    url: m.media_url_https,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    errors: Vec<ApiErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorItem {
    code: i64,
}
