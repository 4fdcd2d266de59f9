//! Configuration management for tunetui
//!
//! Handles config file loading and per-service cache lifetimes.
//! Config is stored at ~/.config/tunetui/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable that overrides the configured device URL
pub const DEVICE_ENV: &str = "TUNETUI_DEVICE";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the speaker's content API (e.g. http://192.168.1.20:8090)
    pub device_url: Option<String>,
    /// Browse cache lifetimes
    pub cache: CacheTtls,
    /// Offline track index settings
    pub index: IndexConfig,
}

/// Per-service browse cache lifetimes, in seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheTtls {
    pub radio_ttl_secs: u64,
    pub podcast_ttl_secs: u64,
    /// UPnP views change as servers rescan, keep this short
    pub upnp_ttl_secs: u64,
    pub queue_ttl_secs: u64,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            radio_ttl_secs: 300,
            podcast_ttl_secs: 300,
            upnp_ttl_secs: 60,
            queue_ttl_secs: 5,
        }
    }
}

impl CacheTtls {
    /// TTL for a cache service key ("radio", "podcast", "queue", "upnp:...")
    pub fn ttl_for(&self, service_key: &str) -> Duration {
        let secs = match service_key.split(':').next().unwrap_or_default() {
            "radio" => self.radio_ttl_secs,
            "podcast" => self.podcast_ttl_secs,
            "upnp" => self.upnp_ttl_secs,
            "queue" => self.queue_ttl_secs,
            _ => self.upnp_ttl_secs.min(self.radio_ttl_secs),
        };
        Duration::from_secs(secs)
    }
}

/// Track index settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Index older than this is reported stale
    pub max_age_hours: u64,
    /// Default result cap for `index search` (0 = unbounded)
    pub max_results: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_age_hours: 24,
            max_results: 50,
        }
    }
}

impl IndexConfig {
    pub fn max_age(&self) -> chrono::Duration {
        chrono::Duration::hours(self.max_age_hours as i64)
    }
}

impl Config {
    /// Get config file path (~/.config/tunetui/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tunetui").join("config.toml"))
    }

    /// Directory for the track index and logs (~/.cache/tunetui)
    pub fn cache_dir() -> Option<PathBuf> {
        dirs::cache_dir().map(|p| p.join("tunetui"))
    }

    /// Load config from the default location, or return defaults if not found
    pub fn load() -> Self {
        Self::path().map(|p| Self::load_from(&p)).unwrap_or_default()
    }

    /// Load config from a specific file, or return defaults if unreadable
    pub fn load_from(path: &std::path::Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Resolve the device URL with fallback chain:
    /// 1. Explicit `--device` flag
    /// 2. Environment variable TUNETUI_DEVICE
    /// 3. `device_url` from the config file
    pub fn device_url(&self, flag: Option<&str>) -> Option<String> {
        if let Some(url) = flag {
            return Some(normalize_url(url));
        }
        if let Ok(url) = std::env::var(DEVICE_ENV) {
            if !url.is_empty() {
                return Some(normalize_url(&url));
            }
        }
        self.device_url.as_deref().map(normalize_url)
    }
}

/// Accept bare "host:port" and strip trailing slashes
fn normalize_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{}", url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.device_url.is_none());
        assert_eq!(config.cache.upnp_ttl_secs, 60);
        assert_eq!(config.index.max_age_hours, 24);
    }

    #[test]
    fn test_ttl_for_service_keys() {
        let ttls = CacheTtls::default();
        assert_eq!(ttls.ttl_for("radio"), Duration::from_secs(300));
        assert_eq!(ttls.ttl_for("upnp:srv-1:Music/Albums"), Duration::from_secs(60));
        assert_eq!(ttls.ttl_for("queue"), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            device_url = "10.0.0.5:8090"

            [cache]
            upnp_ttl_secs = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.cache.upnp_ttl_secs, 10);
        assert_eq!(config.cache.radio_ttl_secs, 300);
        assert_eq!(config.index, IndexConfig::default());
    }

    #[test]
    fn test_device_flag_wins() {
        let config = Config {
            device_url: Some("http://from-config:1".into()),
            ..Config::default()
        };
        assert_eq!(
            config.device_url(Some("speaker.local:8090/")).as_deref(),
            Some("http://speaker.local:8090")
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.device_url = Some("http://speaker:8090".into());
        config.index.max_results = 10;
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = Config::load_from(&path);
        assert_eq!(loaded.device_url.as_deref(), Some("http://speaker:8090"));
        assert_eq!(loaded.index.max_results, 10);
    }
}
