//! Short-lived browse cache
//!
//! Maps `(parent display path, service key)` to the children last fetched for
//! that parent. The service key is needed because the same display path means
//! different things in different services ("radio", "podcast",
//! "upnp:<server>:<parent>"). Entries expire after a per-service TTL; an
//! expired entry reads exactly like a miss and is only ever replaced by a
//! fresh `set`, never refreshed in place.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Instant;

use tracing::trace;

use crate::config::CacheTtls;
use crate::models::CachedItem;

#[derive(Debug, Clone)]
struct CacheEntry {
    items: Vec<CachedItem>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Single-owner browse cache, used within one command or TUI session
#[derive(Debug, Clone, Default)]
pub struct BrowseCache {
    entries: HashMap<(String, String), CacheEntry>,
    ttls: CacheTtls,
}

impl BrowseCache {
    pub fn new(ttls: CacheTtls) -> Self {
        Self {
            entries: HashMap::new(),
            ttls,
        }
    }

    /// Children of `parent` if a live entry exists
    pub fn get(&self, parent: &str, service_key: &str) -> Option<&[CachedItem]> {
        self.get_at(parent, service_key, Instant::now())
    }

    /// [`get`](Self::get) evaluated at an explicit instant
    pub fn get_at(&self, parent: &str, service_key: &str, now: Instant) -> Option<&[CachedItem]> {
        let entry = self
            .entries
            .get(&(parent.to_string(), service_key.to_string()))?;
        if entry.is_live(now) {
            trace!(parent, service_key, "browse cache hit");
            Some(&entry.items)
        } else {
            trace!(parent, service_key, "browse cache entry expired");
            None
        }
    }

    /// Store children with the TTL configured for `service_key`
    pub fn set(&mut self, parent: &str, service_key: &str, items: Vec<CachedItem>) {
        self.set_at(parent, service_key, items, Instant::now());
    }

    /// [`set`](Self::set) evaluated at an explicit instant
    pub fn set_at(&mut self, parent: &str, service_key: &str, items: Vec<CachedItem>, now: Instant) {
        let expires_at = now + self.ttls.ttl_for(service_key);
        trace!(parent, service_key, count = items.len(), "browse cache store");
        self.entries.insert(
            (parent.to_string(), service_key.to_string()),
            CacheEntry { items, expires_at },
        );
    }


    /// Drop every expired entry
    pub fn purge_expired(&mut self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.is_live(now));
    }

    /// Number of stored entries, live or not
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Thread-safe variant for long-running hosts
///
/// Expiry is checked under the same lock that guards the map, so a `get`
/// never observes a half-replaced entry from a concurrent `set`.
#[derive(Debug, Default)]
pub struct SharedBrowseCache {
    inner: RwLock<BrowseCache>,
}

impl SharedBrowseCache {
    pub fn new(ttls: CacheTtls) -> Self {
        Self {
            inner: RwLock::new(BrowseCache::new(ttls)),
        }
    }

    pub fn get(&self, parent: &str, service_key: &str) -> Option<Vec<CachedItem>> {
        let cache = self.inner.read().unwrap_or_else(|e| e.into_inner());
        cache.get(parent, service_key).map(<[CachedItem]>::to_vec)
    }

    pub fn set(&self, parent: &str, service_key: &str, items: Vec<CachedItem>) {
        let mut cache = self.inner.write().unwrap_or_else(|e| e.into_inner());
        cache.set(parent, service_key, items);
    }
}

/// Hand a warmed single-owner cache over to background tasks
impl From<BrowseCache> for SharedBrowseCache {
    fn from(cache: BrowseCache) -> Self {
        Self {
            inner: RwLock::new(cache),
        }
    }
}
