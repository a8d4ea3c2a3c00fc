//! Google Photos Library API client.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::gphotos::types::{
    Album, AlbumList, BatchCreateRequest, BatchCreateResponse, CreateAlbumRequest, NewAlbum,
    NewMediaItem, SimpleMediaItem,
};
use crate::oauth::{OAuthToken, TokenEndpoint};

/// Photos Library API root.
const PHOTOS_API_BASE: &str = "https://photoslibrary.googleapis.com/v1";

/// Albums fetched per listing page (API maximum).
const ALBUM_PAGE_SIZE: u32 = 50;

/// Album operations the cloud destination needs.
#[async_trait]
pub trait AlbumService: Send + Sync {
    /// Upload raw bytes of a file, returning the upload token.
    async fn upload_file(&self, path: &Path) -> Result<String>;

    /// Find an album by exact title, creating it when none matches.
    async fn get_or_create_album(&self, title: &str) -> Result<Album>;

    /// Turn an upload token into a media item inside `album_id`.
    async fn add_to_album(&self, album_id: &str, upload_token: &str, file_name: &str) -> Result<()>;
}

/// Bearer-authenticated client that refreshes its token as it expires.
pub struct GooglePhotosClient {
    http: Client,
    token: RwLock<OAuthToken>,
    endpoint: Arc<dyn TokenEndpoint>,
    base_url: String,
}

impl GooglePhotosClient {
    pub fn new(token: OAuthToken, endpoint: Arc<dyn TokenEndpoint>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("twitter-media-backup/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| Error::Api(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            token: RwLock::new(token),
            endpoint,
            base_url: PHOTOS_API_BASE.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Authorization header value, refreshing the token first if needed.
    async fn authorization(&self) -> Result<String> {
        {
            let token = self.token.read().await;
            if !token.is_expired() {
                return Ok(token.authorization());
            }
        }

        let mut token = self.token.write().await;
        // Another task may have refreshed while we waited for the lock.
        if token.is_expired() {
            tracing::info!("Refreshing expired Google Photos access token");
            *token = self.endpoint.refresh(&token).await?;
        }
        Ok(token.authorization())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let auth = self.authorization().await?;
        let response = request.header(header::AUTHORIZATION, auth).send().await?;
        check_status(response).await
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            Error::Api(format!(
                "Failed to parse Google Photos response: {} - Response: {}",
                e,
                text.chars().take(500).collect::<String>()
            ))
        })
    }

    async fn find_album(&self, title: &str) -> Result<Option<Album>> {
        let url = format!("{}/albums", self.base_url);
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", ALBUM_PAGE_SIZE.to_string())];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let page: AlbumList = self.send_json(self.http.get(&url).query(&query)).await?;
            if let Some(album) = page.albums.into_iter().find(|a| a.title == title) {
                return Ok(Some(album));
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => return Ok(None),
            }
        }
    }

    async fn create_album(&self, title: &str) -> Result<Album> {
        let url = format!("{}/albums", self.base_url);
        let body = CreateAlbumRequest {
            album: NewAlbum { title },
        };
        self.send_json(self.http.post(&url).json(&body)).await
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail: String = body.chars().take(500).collect();

    if status == 401 || status == 403 {
        return Err(Error::Authentication(format!("HTTP {}: {}", status, detail)));
    }
    Err(Error::Api(format!("HTTP {}: {}", status, detail)))
}

#[async_trait]
impl AlbumService for GooglePhotosClient {
    async fn upload_file(&self, path: &Path) -> Result<String> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::InvalidFilename(path.display().to_string()))?
            .to_string();
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        let bytes = tokio::fs::read(path).await?;

        tracing::debug!(file = %file_name, bytes = bytes.len(), "Uploading to Google Photos");

        let request = self
            .http
            .post(format!("{}/uploads", self.base_url))
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .header("X-Goog-Upload-Content-Type", mime.essence_str())
            .header("X-Goog-Upload-File-Name", file_name)
            .header("X-Goog-Upload-Protocol", "raw")
            .body(bytes);

        let upload_token = self.send(request).await?.text().await?;
        let upload_token = upload_token.trim();
        if upload_token.is_empty() {
            return Err(Error::Api("Upload returned an empty upload token".to_string()));
        }
        Ok(upload_token.to_string())
    }

    async fn get_or_create_album(&self, title: &str) -> Result<Album> {
        if let Some(album) = self.find_album(title).await? {
            tracing::debug!(album = %album.id, title, "Using existing album");
            return Ok(album);
        }

        let album = self.create_album(title).await?;
        tracing::info!(album = %album.id, title, "Created Google Photos album");
        Ok(album)
    }

    async fn add_to_album(&self, album_id: &str, upload_token: &str, file_name: &str) -> Result<()> {
        let body = BatchCreateRequest {
            album_id,
            new_media_items: vec![NewMediaItem {
                simple_media_item: SimpleMediaItem {
                    upload_token,
                    file_name,
                },
            }],
        };

        let response: BatchCreateResponse = self
            .send_json(
                self.http
                    .post(format!("{}/mediaItems:batchCreate", self.base_url))
                    .json(&body),
            )
            .await?;

        let result = response
            .new_media_item_results
            .into_iter()
            .next()
            .ok_or_else(|| Error::Api("batchCreate returned no results".to_string()))?;

        match result.status {
            Some(status) if !status.is_ok() => Err(Error::Api(format!(
                "Media item creation failed (code {}): {}",
                status.code, status.message
            ))),
            _ => Ok(()),
        }
    }
}
