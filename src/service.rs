//! Collaborator interfaces for the device's content API
//!
//! The browsing, queue and index code only ever talks to these traits; the
//! HTTP implementation lives in [`crate::api::device`]. No retries or
//! timeouts are layered on top here.

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::ContentItem;

/// Upper bound on pages fetched by [`ContentService::category_all`]
pub const MAX_CATEGORY_PAGES: u32 = 100;

// =============================================================================
// Service Identity
// =============================================================================

/// Which content service a tree belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ServiceKey {
    Radio,
    Podcast,
    /// A specific UPnP/DLNA media server, identified by its backend path
    Upnp { server: String },
    Queue,
}

impl ServiceKey {
    /// Cache key for the children of `parent` within this service
    ///
    /// UPnP keys embed the server and the parent so two servers exposing the
    /// same folder names never share entries.
    pub fn cache_key(&self, parent: &str) -> String {
        match self {
            ServiceKey::Radio => "radio".to_string(),
            ServiceKey::Podcast => "podcast".to_string(),
            ServiceKey::Upnp { server } => format!("upnp:{}:{}", server, parent),
            ServiceKey::Queue => "queue".to_string(),
        }
    }

    /// URL prefix of this service on the device API
    pub fn api_prefix(&self) -> String {
        match self {
            ServiceKey::Radio => "/radio".to_string(),
            ServiceKey::Podcast => "/podcast".to_string(),
            ServiceKey::Upnp { server } => format!("/upnp/{}", urlencoding::encode(server)),
            ServiceKey::Queue => "/queue".to_string(),
        }
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKey::Radio => write!(f, "radio"),
            ServiceKey::Podcast => write!(f, "podcast"),
            ServiceKey::Upnp { server } => write!(f, "upnp ({})", server),
            ServiceKey::Queue => write!(f, "queue"),
        }
    }
}

// =============================================================================
// Content Service
// =============================================================================

/// One page of a paginated category listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    pub items: Vec<ContentItem>,
    #[serde(default)]
    pub has_more: bool,
}

/// Browse/search/favorites surface of one content service
#[async_trait]
pub trait ContentService: Send + Sync {
    /// Which service this is
    fn key(&self) -> &ServiceKey;

    /// Children of a backend path; the empty path is the service root
    async fn browse(&self, path: &str) -> Result<Vec<ContentItem>>;

    /// Free-text search within the service
    async fn search(&self, query: &str) -> Result<Vec<ContentItem>> {
        let _ = query;
        anyhow::bail!("search is not supported by {}", self.key())
    }

    /// One page (0-based) of a named category such as "popular" or "trending"
    async fn category(&self, name: &str, page: u32) -> Result<Page> {
        let _ = page;
        anyhow::bail!("category '{}' is not supported by {}", name, self.key())
    }

    /// Every item of a category, following pagination to the end
    async fn category_all(&self, name: &str) -> Result<Vec<ContentItem>> {
        let mut items = Vec::new();
        for page in 0..MAX_CATEGORY_PAGES {
            let batch = self.category(name, page).await?;
            let done = !batch.has_more || batch.items.is_empty();
            items.extend(batch.items);
            if done {
                break;
            }
        }
        Ok(items)
    }

    /// Start playing an item immediately
    async fn play(&self, item: &ContentItem) -> Result<()>;

    async fn save_favorite(&self, item: &ContentItem) -> Result<()> {
        let _ = item;
        anyhow::bail!("favorites are not supported by {}", self.key())
    }

    async fn remove_favorite(&self, item: &ContentItem) -> Result<()> {
        let _ = item;
        anyhow::bail!("favorites are not supported by {}", self.key())
    }
}

// =============================================================================
// Queue Service
// =============================================================================

/// Mutators and accessors for the device's play queue
#[async_trait]
pub trait QueueService: Send + Sync {
    async fn get_queue(&self) -> Result<Vec<ContentItem>>;

    async fn add_to_queue(&self, items: &[ContentItem], play_if_empty: bool) -> Result<()>;

    /// Remove the given 0-based positions
    async fn remove_from_queue(&self, indices: &[usize]) -> Result<()>;

    /// Remove the item at `from` and reinsert it at `to` (0-based)
    async fn move_queue_item(&self, from: usize, to: usize) -> Result<()>;

    async fn play_queue_index(&self, index: usize, item: &ContentItem) -> Result<()>;

    /// Position currently playing, if any
    async fn current_queue_index(&self) -> Result<Option<usize>>;

    async fn clear_queue(&self) -> Result<()>;
}

// =============================================================================
// Event Feed
// =============================================================================

/// A live event reported by the device (track change, volume, source...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub seq: u64,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl fmt::Display for DeviceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.data.is_null() {
            write!(f, "[{}] {}", self.seq, self.kind)
        } else {
            write!(f, "[{}] {} {}", self.seq, self.kind, self.data)
        }
    }
}

/// Polled source of device events
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Events with a sequence number greater than `since`; may wait for new ones
    async fn poll_events(&self, since: u64) -> Result<Vec<DeviceEvent>>;
}
