//! Per-invocation session
//!
//! Everything one command needs (resolved config, the device client, the
//! browse cache) is built once here and passed down explicitly.

use std::sync::Arc;

use crate::api::{DeviceClient, DeviceContent};
use crate::config::Config;
use crate::content::browse::Browser;
use crate::content::cache::{BrowseCache, SharedBrowseCache};
use crate::error::{ContentError, Result};
use crate::models::ContentItem;
use crate::service::{QueueService, ServiceKey};

pub struct Session {
    config: Config,
    client: DeviceClient,
    cache: BrowseCache,
}

impl Session {
    pub fn new(config: Config, device_url: impl Into<String>) -> Self {
        let cache = BrowseCache::new(config.cache.clone());
        Self {
            client: DeviceClient::new(device_url),
            config,
            cache,
        }
    }

    /// Build a session, resolving the device from flag, environment or config
    pub fn from_config(config: Config, device_flag: Option<&str>) -> Result<Self> {
        let url = config.device_url(device_flag).ok_or_else(|| {
            ContentError::validation(
                "no device configured; pass --device, set TUNETUI_DEVICE or add device_url to the config file",
            )
        })?;
        Ok(Self::new(config, url))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn client(&self) -> &DeviceClient {
        &self.client
    }

    pub fn queue(&self) -> Arc<dyn QueueService> {
        Arc::new(self.client.clone())
    }

    pub fn content(&self, key: ServiceKey) -> DeviceContent {
        self.client.content(key)
    }

    /// A browser over `service` backed by this session's cache
    pub fn browser<'a>(&'a mut self, service: &'a DeviceContent) -> Browser<'a> {
        Browser::new(service, &mut self.cache)
    }

    /// Move the warmed cache into a shareable one (for the picker), dropping
    /// entries that have already expired
    pub fn share_cache(&mut self) -> Arc<SharedBrowseCache> {
        let mut cache =
            std::mem::replace(&mut self.cache, BrowseCache::new(self.config.cache.clone()));
        cache.purge_expired();
        Arc::new(SharedBrowseCache::from(cache))
    }

    /// Resolve a media server by id or by (case-insensitive) name
    pub async fn media_server(&self, name: &str) -> Result<ContentItem> {
        let servers = self.client.media_servers().await?;
        let lower = name.to_lowercase();

        servers
            .iter()
            .find(|s| s.path == name)
            .or_else(|| servers.iter().find(|s| s.title.to_lowercase() == lower))
            .cloned()
            .ok_or_else(|| ContentError::NotFound {
                what: "media server",
                name: name.to_string(),
                available: servers.iter().map(|s| s.title.clone()).collect(),
            })
    }

    /// Service key for a service name, looking up UPnP servers by name
    pub async fn service_key(&self, kind: ServiceKind, server: Option<&str>) -> Result<ServiceKey> {
        Ok(match kind {
            ServiceKind::Radio => ServiceKey::Radio,
            ServiceKind::Podcast => ServiceKey::Podcast,
            ServiceKind::Queue => ServiceKey::Queue,
            ServiceKind::Upnp => {
                let name = server.ok_or_else(|| {
                    ContentError::validation("--server is required for the upnp service")
                })?;
                ServiceKey::Upnp {
                    server: self.media_server(name).await?.path,
                }
            }
        })
    }
}

/// Content services selectable on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ServiceKind {
    Radio,
    Podcast,
    Upnp,
    Queue,
}
