//! Twitter REST API client.

use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde::de::DeserializeOwned;

use crate::api::auth::{authorization_header, OAuth1Credentials};
use crate::api::types::{ApiErrors, Tweet, User};
use crate::error::{Error, Result};

/// Twitter REST API base URL.
const API_BASE: &str = "https://api.twitter.com/1.1";

/// Maximum tweets requested per timeline page.
pub const TIMELINE_PAGE_SIZE: u32 = 200;

/// Source platform operations the poller depends on.
#[async_trait]
pub trait TimelineSource: Send + Sync {
    /// Authenticate and return the account the credentials belong to.
    async fn verify_credentials(&self) -> Result<User>;

    /// The `count` most recent tweets of an account.
    async fn latest_tweets(&self, screen_name: &str, count: u32) -> Result<Vec<Tweet>>;

    /// Tweets newer than `since_id`, without replies and retweets.
    async fn tweets_since(&self, screen_name: &str, since_id: Option<u64>) -> Result<Vec<Tweet>>;
}

/// Twitter API client signing every request with OAuth 1.0a.
pub struct TwitterApi {
    client: Client,
    credentials: OAuth1Credentials,
    base_url: String,
}

impl TwitterApi {
    /// Create a new API client.
    pub fn new(credentials: OAuth1Credentials) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("twitter-media-backup/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Api(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            credentials,
            base_url: API_BASE.to_string(),
        })
    }

    /// Point the client at another API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Shared HTTP client, reused for media downloads.
    pub fn http_client(&self) -> Client {
        self.client.clone()
    }

    /// Make a signed GET request and decode the JSON body.
    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let auth = authorization_header("GET", &url, query, &self.credentials);

        tracing::debug!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(&url)
            .query(query)
            .header(header::AUTHORIZATION, auth)
            .send()
            .await?;

        let response = check_status(response).await?;
        let text = response.text().await?;

        serde_json::from_str(&text).map_err(|e| {
            Error::Api(format!(
                "Failed to parse {}: {} - Response: {}",
                path,
                e,
                text.chars().take(500).collect::<String>()
            ))
        })
    }
}

/// Map error statuses to errors, passing successful responses through.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    tracing::debug!("Response status: {}", status);

    if status.is_success() {
        return Ok(response);
    }

    if status == 429 {
        let retry_after = response
            .headers()
            .get("x-rate-limit-reset")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok())
            .map(|reset| (reset - chrono::Utc::now().timestamp()).max(0) as u64)
            .unwrap_or(60);
        return Err(Error::RateLimited(retry_after));
    }

    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ApiErrors>(&body)
        .ok()
        .and_then(|e| e.errors.into_iter().next())
        .map(|e| format!("{} (code {})", e.message, e.code))
        .unwrap_or(body);

    if status == 401 || status == 403 {
        return Err(Error::Authentication(format!("HTTP {}: {}", status, detail)));
    }

    Err(Error::Api(format!("HTTP {}: {}", status, detail)))
}

#[async_trait]
impl TimelineSource for TwitterApi {
    async fn verify_credentials(&self) -> Result<User> {
        self.get(
            "/account/verify_credentials.json",
            &[
                ("include_entities", "false".to_string()),
                ("skip_status", "true".to_string()),
            ],
        )
        .await
    }

    async fn latest_tweets(&self, screen_name: &str, count: u32) -> Result<Vec<Tweet>> {
        self.get(
            "/statuses/user_timeline.json",
            &[
                ("screen_name", screen_name.to_string()),
                ("count", count.to_string()),
            ],
        )
        .await
    }

    async fn tweets_since(&self, screen_name: &str, since_id: Option<u64>) -> Result<Vec<Tweet>> {
        let mut query = vec![
            ("screen_name", screen_name.to_string()),
            ("count", TIMELINE_PAGE_SIZE.to_string()),
            ("include_rts", "false".to_string()),
            ("exclude_replies", "true".to_string()),
            ("tweet_mode", "extended".to_string()),
        ];
        if let Some(since_id) = since_id.filter(|id| *id > 0) {
            query.push(("since_id", since_id.to_string()));
        }

        self.get("/statuses/user_timeline.json", &query).await
    }
}
