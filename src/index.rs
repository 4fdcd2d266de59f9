//! Offline track index for UPnP libraries
//!
//! Walks a media server (or one sub-folder of it) once, flattens every track
//! into an [`IndexedTrack`] and persists the lot as a single JSON document in
//! the cache directory. Searching the index never touches the network.
//!
//! An index written by a different schema version is treated as missing, and
//! the module never rebuilds on its own: callers decide what to do with a
//! stale index using [`TrackIndex::is_fresh`].

use std::collections::HashSet;
use std::fs;
use std::io::{BufWriter, ErrorKind};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::content::fuzzy::fuzzy_match;
use crate::content::path;
use crate::error::{ContentError, Result};
use crate::models::{ContentItem, IndexedTrack, ItemType};
use crate::service::{ContentService, ServiceKey};

/// Schema version written into every index file
pub const INDEX_VERSION: u32 = 1;

/// File name of the index inside the cache directory
pub const INDEX_FILE: &str = "track_index.json";

/// A flattened, persisted snapshot of a UPnP library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackIndex {
    pub server_path: String,
    pub server_name: String,
    /// Backend path of the indexed folder ("" for the whole server)
    pub container_path: String,
    pub container_name: String,
    pub tracks: Vec<IndexedTrack>,
    pub indexed_at: DateTime<Utc>,
    pub track_count: usize,
    pub index_version: u32,
}

#[derive(Deserialize)]
struct VersionProbe {
    #[serde(default)]
    index_version: Option<u32>,
}

/// Summary printed by `index status`
#[derive(Debug, Clone, Serialize)]
pub struct IndexStatus {
    pub server_name: String,
    pub container_name: String,
    pub track_count: usize,
    pub indexed_at: DateTime<Utc>,
    pub age_hours: f64,
    pub fresh: bool,
}

impl TrackIndex {
    /// Default on-disk location (~/.cache/tunetui/track_index.json)
    pub fn default_path() -> Option<PathBuf> {
        Config::cache_dir().map(|dir| dir.join(INDEX_FILE))
    }

    /// Walk `service` from the folder named by the escaped display path
    /// `container` (empty = root) and collect every track below it
    pub async fn build(
        service: &dyn ContentService,
        server_name: &str,
        container: &str,
    ) -> Result<Self> {
        let server_path = match service.key() {
            ServiceKey::Upnp { server } => server.clone(),
            other => other.to_string(),
        };

        let components = path::parse(container);
        let (container_path, container_name) = resolve_container(service, &components).await?;
        info!(server = server_name, container = %container_name, "building track index");

        let tracks = collect_tracks(service, &container_path).await?;
        info!(tracks = tracks.len(), "track index built");

        Ok(Self {
            server_path,
            server_name: server_name.to_string(),
            container_path,
            container_name,
            track_count: tracks.len(),
            tracks,
            indexed_at: Utc::now(),
            index_version: INDEX_VERSION,
        })
    }

    /// Load an index; a missing, unreadable or other-version file is `None`
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<VersionProbe>(&raw) {
            Ok(VersionProbe {
                index_version: Some(INDEX_VERSION),
            }) => {}
            Ok(probe) => {
                warn!(
                    found = ?probe.index_version,
                    expected = INDEX_VERSION,
                    "ignoring track index with another schema version"
                );
                return Ok(None);
            }
            Err(e) => {
                warn!(error = %e, "ignoring unreadable track index");
                return Ok(None);
            }
        }

        match serde_json::from_str(&raw) {
            Ok(index) => Ok(Some(index)),
            Err(e) => {
                warn!(error = %e, "ignoring malformed track index");
                Ok(None)
            }
        }
    }

    /// Write the index, replacing any previous file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp = path.with_extension("json.tmp");
        {
            let file = fs::File::create(&tmp)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, self)?;
            std::io::Write::flush(&mut writer)?;
        }
        fs::rename(&tmp, path)?;
        debug!(path = %path.display(), "track index saved");
        Ok(())
    }

    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.indexed_at
    }

    /// True while the index is younger than `max_age`
    pub fn is_fresh(&self, max_age: chrono::Duration, now: DateTime<Utc>) -> bool {
        self.age(now) < max_age
    }

    pub fn status(&self, max_age: chrono::Duration, now: DateTime<Utc>) -> IndexStatus {
        IndexStatus {
            server_name: self.server_name.clone(),
            container_name: self.container_name.clone(),
            track_count: self.track_count,
            indexed_at: self.indexed_at,
            age_hours: self.age(now).num_minutes() as f64 / 60.0,
            fresh: self.is_fresh(max_age, now),
        }
    }

    /// Tracks matching every whitespace-separated token of `query`
    ///
    /// Each token must appear as a substring of the track's search field, or
    /// failing that as a subsequence of it. The fuzzy fallback runs against
    /// the whole field, so a token meant for the artist may match letters in
    /// the title. `max_results == 0` means no limit.
    pub fn search(&self, query: &str, max_results: usize) -> Vec<&IndexedTrack> {
        let tokens: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        let limit = if max_results == 0 {
            usize::MAX
        } else {
            max_results
        };

        self.tracks
            .iter()
            .filter(|track| {
                tokens.iter().all(|token| {
                    track.search_field.contains(token.as_str())
                        || fuzzy_match(&track.search_field, token)
                })
            })
            .take(limit)
            .collect()
    }
}

/// Walk named folders from the server root, each name matching exactly one
/// child folder (case-insensitive); a miss or a tie lists the sibling folders
async fn resolve_container(
    service: &dyn ContentService,
    components: &[String],
) -> Result<(String, String)> {
    let mut path = String::new();
    let mut name = String::from("/");

    for component in components {
        let children = service.browse(&path).await?;
        let folders: Vec<&ContentItem> = children
            .iter()
            .filter(|c| c.item_type == ItemType::Container)
            .collect();
        let wanted = component.to_lowercase();
        let matches: Vec<&&ContentItem> = folders
            .iter()
            .filter(|c| c.title.to_lowercase() == wanted)
            .collect();

        match matches.as_slice() {
            [only] => {
                path = only.path.clone();
                name = only.title.clone();
            }
            [] => {
                return Err(ContentError::NotFound {
                    what: "folder",
                    name: component.clone(),
                    available: folders.iter().map(|c| c.title.clone()).collect(),
                })
            }
            several => {
                return Err(ContentError::validation(format!(
                    "'{}' matches {} folders; rename one or index their parent (available: {})",
                    component,
                    several.len(),
                    folders.iter().map(|c| c.title.as_str()).collect::<Vec<_>>().join(", ")
                )))
            }
        }
    }

    Ok((path, name))
}

/// Depth-first walk collecting tracks in tree order
async fn collect_tracks(service: &dyn ContentService, root: &str) -> Result<Vec<IndexedTrack>> {
    let mut tracks = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![root.to_string()];

    while let Some(path) = stack.pop() {
        if !visited.insert(path.clone()) {
            continue;
        }

        let children = service.browse(&path).await?;
        debug!(path = %path, children = children.len(), "indexing folder");

        let mut folders = Vec::new();
        for child in &children {
            match child.item_type {
                ItemType::Audio => tracks.push(IndexedTrack::from(child)),
                ItemType::Container => folders.push(child.path.clone()),
                ItemType::Query | ItemType::Episodes => {}
            }
        }
        stack.extend(folders.into_iter().rev());
    }

    Ok(tracks)
}
