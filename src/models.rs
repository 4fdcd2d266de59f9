//! Data structures for tunetui
//!
//! Contains the shared models used across the application organized by domain:
//! - **Content**: items returned by the device's content API
//! - **Cache**: the projection kept by the browse cache
//! - **Index**: flattened tracks persisted in the offline track index
//! - **Queue**: labels used to address queue tracks by name

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Content Models
// =============================================================================

/// Kind of node in a content tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    /// A playable track or stream
    #[default]
    Audio,
    /// A browsable node (folder, genre, show, album)
    Container,
    /// A saved search that expands into items when browsed
    Query,
    /// A podcast episode listing
    Episodes,
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::Audio => write!(f, "audio"),
            ItemType::Container => write!(f, "container"),
            ItemType::Query => write!(f, "query"),
            ItemType::Episodes => write!(f, "episodes"),
        }
    }
}

/// A stream location for an audio item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u32>,
}

/// Track metadata attached to audio items
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    /// Duration in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Resource>,
}

/// One node of a remote content tree (station, show, episode, folder, track,
/// queue entry)
///
/// Built fresh from every service response and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub title: String,
    /// Opaque backend identifier, unique within a service
    pub path: String,
    /// Escaped, human-facing hierarchical path
    #[serde(default)]
    pub display_path: String,
    #[serde(rename = "type", default)]
    pub item_type: ItemType,
    /// A container that can also be played directly (an album, a station group)
    #[serde(default)]
    pub container_playable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_data: Option<MediaData>,
}

impl ContentItem {
    /// Create a bare item with no metadata
    pub fn new(title: impl Into<String>, path: impl Into<String>, item_type: ItemType) -> Self {
        Self {
            title: title.into(),
            path: path.into(),
            display_path: String::new(),
            item_type,
            container_playable: false,
            description: None,
            icon: None,
            media_data: None,
        }
    }

    /// Builder: set the display path
    pub fn with_display_path(mut self, display_path: impl Into<String>) -> Self {
        self.display_path = display_path.into();
        self
    }

    /// Builder: set artist/album metadata
    pub fn with_media(mut self, artist: Option<&str>, album: Option<&str>) -> Self {
        let media = self.media_data.get_or_insert_with(MediaData::default);
        media.artist = artist.map(str::to_string);
        media.album = album.map(str::to_string);
        self
    }

    pub fn is_container(&self) -> bool {
        self.item_type == ItemType::Container
    }

    /// Default playability policy: anything that is not a container, or a
    /// container explicitly marked playable
    pub fn is_playable(&self) -> bool {
        !self.is_container() || self.container_playable
    }

    pub fn artist(&self) -> Option<&str> {
        self.media_data
            .as_ref()
            .and_then(|m| m.artist.as_deref())
            .filter(|a| !a.is_empty())
    }

    pub fn album(&self) -> Option<&str> {
        self.media_data
            .as_ref()
            .and_then(|m| m.album.as_deref())
            .filter(|a| !a.is_empty())
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.media_data.as_ref().and_then(|m| m.duration)
    }

    /// "Title - Artist" when an artist is known, otherwise just the title
    pub fn label(&self) -> String {
        match self.artist() {
            Some(artist) => format!("{} - {}", self.title, artist),
            None => self.title.clone(),
        }
    }
}

impl fmt::Display for ContentItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())?;
        if self.is_container() {
            write!(f, "/")?;
        }
        Ok(())
    }
}

// =============================================================================
// Cache Models
// =============================================================================

/// Projection of [`ContentItem`] stored by the browse cache
///
/// Keeps everything the picker and `play` read back: playability, the icon
/// and the media metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedItem {
    pub title: String,
    pub path: String,
    pub display_path: String,
    pub item_type: ItemType,
    pub container_playable: bool,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub media_data: Option<MediaData>,
}

impl From<&ContentItem> for CachedItem {
    fn from(item: &ContentItem) -> Self {
        Self {
            title: item.title.clone(),
            path: item.path.clone(),
            display_path: item.display_path.clone(),
            item_type: item.item_type,
            container_playable: item.container_playable,
            description: item.description.clone(),
            icon: item.icon.clone(),
            media_data: item.media_data.clone(),
        }
    }
}

impl From<&CachedItem> for ContentItem {
    fn from(cached: &CachedItem) -> Self {
        Self {
            title: cached.title.clone(),
            path: cached.path.clone(),
            display_path: cached.display_path.clone(),
            item_type: cached.item_type,
            container_playable: cached.container_playable,
            description: cached.description.clone(),
            icon: cached.icon.clone(),
            media_data: cached.media_data.clone(),
        }
    }
}

impl CachedItem {
    pub fn is_container(&self) -> bool {
        self.item_type == ItemType::Container
    }
}

// =============================================================================
// Index Models
// =============================================================================

/// A track in the offline index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedTrack {
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub album: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Duration in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    /// Lowercased "title artist album", computed once at build time
    pub search_field: String,
}

impl IndexedTrack {
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        let title = title.into();
        let artist = artist.into();
        let album = album.into();
        let search_field = format!("{} {} {}", title, artist, album).to_lowercase();
        Self {
            title,
            artist,
            album,
            path: path.into(),
            icon: None,
            duration: None,
            search_field,
        }
    }
}

impl From<&ContentItem> for IndexedTrack {
    fn from(item: &ContentItem) -> Self {
        let mut track = IndexedTrack::new(
            &item.title,
            item.artist().unwrap_or_default(),
            item.album().unwrap_or_default(),
            &item.path,
        );
        track.icon = item.icon.clone();
        track.duration = item.duration_ms();
        track
    }
}

impl fmt::Display for IndexedTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)?;
        if !self.artist.is_empty() {
            write!(f, " - {}", self.artist)?;
        }
        if !self.album.is_empty() {
            write!(f, " ({})", self.album)?;
        }
        Ok(())
    }
}

// =============================================================================
// Queue Models
// =============================================================================

/// A disambiguated, user-facing name for a queue position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueLabelEntry {
    pub label: String,
    /// 0-based queue position
    pub index: usize,
}
