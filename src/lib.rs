//! tunetui - terminal client for networked audio
//!
//! Browse radio, podcasts and UPnP media servers on a networked speaker,
//! reorder its play queue and search an offline index of a music library.
//!
//! # Modules
//!
//! - `models` - Content items, queue labels and indexed tracks
//! - `service` - Content, queue and event service traits
//! - `api` - HTTP client for the device
//! - `content` - Display paths, fuzzy matching, browse cache and completion
//! - `queue` - Track resolution and queue reordering
//! - `index` - Offline track index
//! - `picker` - Interactive picker state machine
//! - `ui` - TUI rendering and event loop
//! - `watch` - Device event feed

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod index;
pub mod models;
pub mod picker;
pub mod queue;
pub mod service;
pub mod session;
pub mod ui;
pub mod watch;

// Re-export commonly used types
pub use models::{ContentItem, IndexedTrack, ItemType, QueueLabelEntry};

pub use api::{DeviceClient, DeviceContent, DeviceError};
pub use config::Config;
pub use content::{BrowseCache, Browser, SharedBrowseCache};
pub use error::{ContentError, Result};
pub use index::TrackIndex;
pub use picker::{Callbacks, Picker, PickerMode, PickerOutcome};
pub use service::{ContentService, EventSource, QueueService, ServiceKey};
pub use session::Session;
