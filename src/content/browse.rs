//! Display-path browsing on top of the browse cache
//!
//! Resolves a human path such as `by Genre/Jazz` to the children of its last
//! segment. Resolution starts from the deepest prefix already in the cache,
//! so only levels that are missing (or expired) cost a network round trip.

use tracing::debug;

use crate::content::cache::{BrowseCache, SharedBrowseCache};
use crate::content::path;
use crate::error::{ContentError, Result};
use crate::models::{CachedItem, ContentItem, ItemType};
use crate::service::ContentService;

/// Walks one content service's tree, reading and filling a [`BrowseCache`]
pub struct Browser<'a> {
    service: &'a dyn ContentService,
    cache: &'a mut BrowseCache,
}

impl<'a> Browser<'a> {
    pub fn new(service: &'a dyn ContentService, cache: &'a mut BrowseCache) -> Self {
        Self { service, cache }
    }

    /// Children of the node named by an escaped display path ("" is the root)
    pub async fn browse_path(&mut self, display_path: &str) -> Result<Vec<ContentItem>> {
        let segments = path::parse(display_path);

        let (mut depth, mut children) = match self.deepest_cached(&segments) {
            Some(hit) => hit,
            None => (0, self.fetch("", "").await?),
        };

        while depth < segments.len() {
            let child = find_browsable(&children, &segments[depth])?;
            let prefix = path::build(&segments[..=depth]);
            children = self.fetch(&prefix, &child.path).await?;
            depth += 1;
        }

        Ok(children)
    }

    /// The item a display path names (its last segment), of any type
    pub async fn find_item(&mut self, display_path: &str) -> Result<ContentItem> {
        let mut segments = path::parse(display_path);
        let name = segments
            .pop()
            .ok_or_else(|| ContentError::validation("empty path names no item"))?;
        let siblings = self.browse_path(&path::build(&segments)).await?;

        let lower = name.to_lowercase();
        siblings
            .iter()
            .find(|c| c.title == name)
            .or_else(|| siblings.iter().find(|c| c.title.to_lowercase() == lower))
            .cloned()
            .ok_or_else(|| ContentError::NotFound {
                what: "item",
                name,
                available: siblings.iter().map(|c| c.title.clone()).collect(),
            })
    }

    /// Deepest prefix of `segments` with a live cache entry
    fn deepest_cached(&self, segments: &[String]) -> Option<(usize, Vec<ContentItem>)> {
        (0..=segments.len()).rev().find_map(|depth| {
            let prefix = path::build(&segments[..depth]);
            let key = self.service.key().cache_key(&prefix);
            self.cache
                .get(&prefix, &key)
                .map(|items| (depth, items.iter().map(ContentItem::from).collect()))
        })
    }

    async fn fetch(&mut self, parent: &str, backend_path: &str) -> Result<Vec<ContentItem>> {
        debug!(service = %self.service.key(), parent, backend_path, "browse fetch");
        let mut items = self.service.browse(backend_path).await?;
        assign_display_paths(parent, &mut items);

        let key = self.service.key().cache_key(parent);
        self.cache
            .set(parent, &key, items.iter().map(CachedItem::from).collect());
        Ok(items)
    }
}

/// Children of `item` through a cache that background tasks can share
///
/// Used by the picker, whose navigation runs on spawned tasks that cannot
/// hold a `&mut BrowseCache`.
pub async fn browse_item_shared(
    service: &dyn ContentService,
    cache: &SharedBrowseCache,
    item: &ContentItem,
) -> Result<Vec<ContentItem>> {
    let parent = path::build(&path::parse(&item.display_path));
    let key = service.key().cache_key(&parent);
    if let Some(cached) = cache.get(&parent, &key) {
        debug!(parent = %parent, "picker cache hit");
        return Ok(cached.iter().map(ContentItem::from).collect());
    }

    let mut items = service.browse(&item.path).await?;
    assign_display_paths(&parent, &mut items);
    cache.set(&parent, &key, items.iter().map(CachedItem::from).collect());
    Ok(items)
}

fn assign_display_paths(parent: &str, items: &mut [ContentItem]) {
    for item in items {
        if item.display_path.is_empty() {
            item.display_path = path::join(parent, &item.title);
        }
    }
}

/// Pick the child a path segment refers to: exact title first, then
/// case-insensitive. Only non-audio items can be browsed into.
fn find_browsable(children: &[ContentItem], name: &str) -> Result<ContentItem> {
    let browsable = || children.iter().filter(|c| c.item_type != ItemType::Audio);

    browsable()
        .find(|c| c.title == name)
        .or_else(|| browsable().find(|c| c.title.eq_ignore_ascii_case(name)))
        .or_else(|| {
            let lower = name.to_lowercase();
            browsable().find(|c| c.title.to_lowercase() == lower)
        })
        .cloned()
        .ok_or_else(|| ContentError::NotFound {
            what: "folder",
            name: name.to_string(),
            available: browsable().map(|c| c.title.clone()).collect(),
        })
}
