//! Device content API client
//!
//! Talks JSON over HTTP to the audio device. One [`DeviceClient`] serves every
//! content service: [`DeviceClient::content`] hands out a [`DeviceContent`]
//! bound to a [`ServiceKey`], while the queue and event feed are implemented
//! on the client itself.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::ContentItem;
use crate::service::{ContentService, DeviceEvent, EventSource, Page, QueueService, ServiceKey};

/// Device API error types
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Resource not found (404)")]
    NotFound,

    #[error("Server error: {0}")]
    ServerError(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

#[derive(Deserialize)]
struct ItemsResponse {
    #[serde(default)]
    items: Vec<ContentItem>,
}

#[derive(Deserialize)]
struct CurrentResponse {
    #[serde(default)]
    index: Option<usize>,
}

#[derive(Deserialize)]
struct EventsResponse {
    #[serde(default)]
    events: Vec<DeviceEvent>,
}

#[derive(Serialize)]
struct AddRequest<'a> {
    items: &'a [ContentItem],
    play_if_empty: bool,
}

#[derive(Serialize)]
struct RemoveRequest<'a> {
    indices: &'a [usize],
}

#[derive(Serialize)]
struct MoveRequest {
    from: usize,
    to: usize,
}

#[derive(Serialize)]
struct PlayIndexRequest<'a> {
    index: usize,
    path: &'a str,
}

/// HTTP client for one device
#[derive(Debug, Clone)]
pub struct DeviceClient {
    base_url: String,
    client: reqwest::Client,
}

impl DeviceClient {
    /// Create a client for the device at `base_url` (e.g. `http://10.0.0.5:8090`)
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// A content service view of this device
    pub fn content(&self, key: ServiceKey) -> DeviceContent {
        DeviceContent {
            client: self.clone(),
            key,
        }
    }

    /// Media servers visible to the device; each item's path is its server id
    pub async fn media_servers(&self) -> Result<Vec<ContentItem>> {
        let response: ItemsResponse = self.get("/upnp/servers", &[]).await?;
        Ok(response.items)
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(url = %url, "device GET");

        let response = self
            .client
            .get(&url)
            .query(query)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(DeviceError::from)?;
        let response = check_status(response)?;

        let body = response.text().await.map_err(DeviceError::from)?;
        let parsed = serde_json::from_str(&body)
            .map_err(|e| DeviceError::InvalidResponse(format!("JSON parse error: {}", e)))?;
        Ok(parsed)
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<()> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(url = %url, method = %method, "device request");

        let mut request = self.client.request(method, &url).query(query);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(DeviceError::from)?;
        check_status(response)?;
        Ok(())
    }
}

fn check_status(response: reqwest::Response) -> std::result::Result<reqwest::Response, DeviceError> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::NOT_FOUND => Err(DeviceError::NotFound),
        status => Err(DeviceError::ServerError(status.as_u16())),
    }
}

// =============================================================================
// Content services
// =============================================================================

/// One content service (radio, podcast, a UPnP server) on a device
#[derive(Debug, Clone)]
pub struct DeviceContent {
    client: DeviceClient,
    key: ServiceKey,
}

impl DeviceContent {
    fn endpoint(&self, suffix: &str) -> String {
        format!("{}{}", self.key.api_prefix(), suffix)
    }
}

#[async_trait]
impl ContentService for DeviceContent {
    fn key(&self) -> &ServiceKey {
        &self.key
    }

    async fn browse(&self, path: &str) -> Result<Vec<ContentItem>> {
        let response: ItemsResponse = self
            .client
            .get(&self.endpoint("/browse"), &[("path", path.to_string())])
            .await?;
        Ok(response.items)
    }

    async fn search(&self, query: &str) -> Result<Vec<ContentItem>> {
        let response: ItemsResponse = self
            .client
            .get(&self.endpoint("/search"), &[("q", query.to_string())])
            .await?;
        Ok(response.items)
    }

    async fn category(&self, name: &str, page: u32) -> Result<Page> {
        let endpoint = self.endpoint(&format!("/category/{}", urlencoding::encode(name)));
        self.client
            .get(&endpoint, &[("page", page.to_string())])
            .await
    }

    async fn play(&self, item: &ContentItem) -> Result<()> {
        self.client
            .send(Method::POST, &self.endpoint("/play"), &[], Some(item))
            .await
    }

    async fn save_favorite(&self, item: &ContentItem) -> Result<()> {
        self.client
            .send(Method::POST, &self.endpoint("/favorites"), &[], Some(item))
            .await
    }

    async fn remove_favorite(&self, item: &ContentItem) -> Result<()> {
        self.client
            .send::<()>(
                Method::DELETE,
                &self.endpoint("/favorites"),
                &[("path", item.path.clone())],
                None,
            )
            .await
    }
}

// =============================================================================
// Queue and events
// =============================================================================

#[async_trait]
impl QueueService for DeviceClient {
    async fn get_queue(&self) -> Result<Vec<ContentItem>> {
        let response: ItemsResponse = self.get("/queue", &[]).await?;
        Ok(response.items)
    }

    async fn add_to_queue(&self, items: &[ContentItem], play_if_empty: bool) -> Result<()> {
        let body = AddRequest {
            items,
            play_if_empty,
        };
        self.send(Method::POST, "/queue", &[], Some(&body)).await
    }

    async fn remove_from_queue(&self, indices: &[usize]) -> Result<()> {
        let body = RemoveRequest { indices };
        self.send(Method::POST, "/queue/remove", &[], Some(&body)).await
    }

    async fn move_queue_item(&self, from: usize, to: usize) -> Result<()> {
        let body = MoveRequest { from, to };
        self.send(Method::POST, "/queue/move", &[], Some(&body)).await
    }

    async fn play_queue_index(&self, index: usize, item: &ContentItem) -> Result<()> {
        let body = PlayIndexRequest {
            index,
            path: &item.path,
        };
        self.send(Method::POST, "/queue/play", &[], Some(&body)).await
    }

    async fn current_queue_index(&self) -> Result<Option<usize>> {
        let response: CurrentResponse = self.get("/queue/current", &[]).await?;
        Ok(response.index)
    }

    async fn clear_queue(&self) -> Result<()> {
        self.send::<()>(Method::DELETE, "/queue", &[], None).await
    }
}

#[async_trait]
impl EventSource for DeviceClient {
    async fn poll_events(&self, since: u64) -> Result<Vec<DeviceEvent>> {
        let response: EventsResponse = self.get("/events", &[("since", since.to_string())]).await?;
        Ok(response.events)
    }
}
