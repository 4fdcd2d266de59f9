//! Interactive picker tests
//!
//! Drives the picker with scripted key presses through the callbacks the
//! `pick` command builds, against in-memory content and queue services.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio_test::{assert_err, assert_ok};
use tunetui::config::CacheTtls;
use tunetui::content::{BrowseCache, Browser, SharedBrowseCache};
use tunetui::models::{ContentItem, ItemType};
use tunetui::picker::{Callbacks, Message, Picker, PickerMode, PickerState};
use tunetui::service::{ContentService, QueueService, ServiceKey};

// =============================================================================
// Fakes
// =============================================================================

struct Library {
    key: ServiceKey,
    nodes: HashMap<String, Vec<ContentItem>>,
    browses: AtomicUsize,
    actions: Mutex<Vec<String>>,
}

impl Library {
    fn podcasts() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            "".to_string(),
            vec![
                ContentItem::new("History", "h", ItemType::Container),
                ContentItem::new("Daily News", "n:1", ItemType::Audio),
            ],
        );
        nodes.insert(
            "h".to_string(),
            vec![
                ContentItem::new("The History of Rome", "h:rome", ItemType::Episodes),
                ContentItem::new("Revolutions", "h:rev", ItemType::Episodes),
            ],
        );
        Self {
            key: ServiceKey::Podcast,
            nodes,
            browses: AtomicUsize::new(0),
            actions: Mutex::new(Vec::new()),
        }
    }

    fn albums() -> Self {
        let mut album = ContentItem::new("Kind of Blue", "a:kob", ItemType::Container)
            .with_media(Some("Miles Davis"), Some("Kind of Blue"));
        album.container_playable = true;

        let mut nodes = HashMap::new();
        nodes.insert(
            "".to_string(),
            vec![ContentItem::new("Albums", "albums", ItemType::Container)],
        );
        nodes.insert("albums".to_string(), vec![album]);
        nodes.insert(
            "a:kob".to_string(),
            vec![ContentItem::new("So What", "t:1", ItemType::Audio)],
        );
        Self {
            key: ServiceKey::Upnp {
                server: "nas1".to_string(),
            },
            nodes,
            browses: AtomicUsize::new(0),
            actions: Mutex::new(Vec::new()),
        }
    }

    fn actions(&self) -> Vec<String> {
        self.actions.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentService for Library {
    fn key(&self) -> &ServiceKey {
        &self.key
    }

    async fn browse(&self, path: &str) -> anyhow::Result<Vec<ContentItem>> {
        self.browses.fetch_add(1, Ordering::SeqCst);
        self.nodes
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("cannot browse {}", path))
    }

    async fn play(&self, item: &ContentItem) -> anyhow::Result<()> {
        self.actions.lock().unwrap().push(format!("play {}", item.title));
        Ok(())
    }

    async fn save_favorite(&self, item: &ContentItem) -> anyhow::Result<()> {
        self.actions.lock().unwrap().push(format!("save {}", item.title));
        Ok(())
    }
}

#[derive(Default)]
struct Queue {
    items: Mutex<Vec<ContentItem>>,
    calls: Mutex<Vec<String>>,
}

impl Queue {
    fn with(titles: &[&str]) -> Self {
        let items = titles
            .iter()
            .map(|t| ContentItem::new(*t, format!("q:{}", t), ItemType::Audio))
            .collect();
        Self {
            items: Mutex::new(items),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueueService for Queue {
    async fn get_queue(&self) -> anyhow::Result<Vec<ContentItem>> {
        Ok(self.items.lock().unwrap().clone())
    }

    async fn add_to_queue(&self, items: &[ContentItem], _play_if_empty: bool) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(format!("add {}", items[0].title));
        self.items.lock().unwrap().extend_from_slice(items);
        Ok(())
    }

    async fn remove_from_queue(&self, indices: &[usize]) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(format!("remove {:?}", indices));
        let mut items = self.items.lock().unwrap();
        for &index in indices.iter().rev() {
            items.remove(index);
        }
        Ok(())
    }

    async fn move_queue_item(&self, _from: usize, _to: usize) -> anyhow::Result<()> {
        anyhow::bail!("not used")
    }

    async fn play_queue_index(&self, index: usize, _item: &ContentItem) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(format!("play {}", index));
        Ok(())
    }

    async fn current_queue_index(&self) -> anyhow::Result<Option<usize>> {
        Ok(None)
    }

    async fn clear_queue(&self) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push("clear".to_string());
        self.items.lock().unwrap().clear();
        Ok(())
    }
}

fn key(code: KeyCode) -> Message {
    Message::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn ctrl(c: char) -> Message {
    Message::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
}

fn titles(picker: &Picker) -> Vec<&str> {
    picker.items().iter().map(|i| i.title.as_str()).collect()
}

/// Root listing fetched the way `pick` does, with the warmed cache shared
async fn content_picker(
    library: Arc<Library>,
    queue: Option<Arc<dyn QueueService>>,
    mode: PickerMode,
) -> Picker {
    let mut cache = BrowseCache::new(CacheTtls::default());
    let items = Browser::new(library.as_ref(), &mut cache)
        .browse_path("")
        .await
        .unwrap();
    let shared = Arc::new(SharedBrowseCache::from(cache));
    let callbacks = Callbacks::for_content(library, shared, queue);
    Picker::new("Podcasts", items, mode, callbacks)
}

// =============================================================================
// Content Picker
// =============================================================================

#[tokio::test]
async fn test_navigate_then_play() {
    let library = Arc::new(Library::podcasts());
    let mut picker = content_picker(library.clone(), None, PickerMode::Play).await;

    picker.dispatch(key(KeyCode::Enter)).await;
    assert_eq!(picker.title(), "History");
    assert_eq!(picker.breadcrumbs(), vec!["Podcasts"]);
    assert_eq!(titles(&picker), vec!["The History of Rome", "Revolutions"]);

    picker.dispatch(key(KeyCode::Down)).await;
    picker.dispatch(key(KeyCode::Enter)).await;

    assert!(picker.is_done());
    let outcome = picker.into_outcome();
    assert!(outcome.played);
    assert!(!outcome.cancelled);
    assert_eq!(outcome.selected.unwrap().title, "Revolutions");
    assert_eq!(library.actions(), vec!["play Revolutions"]);
}

#[tokio::test]
async fn test_back_restores_cursor_and_reuses_cache() {
    let library = Arc::new(Library::podcasts());
    let mut picker = content_picker(library.clone(), None, PickerMode::Play).await;
    assert_eq!(library.browses.load(Ordering::SeqCst), 1);

    picker.dispatch(key(KeyCode::Enter)).await;
    picker.dispatch(key(KeyCode::Left)).await;
    assert_eq!(picker.title(), "Podcasts");
    assert_eq!(picker.list().selected, 0);

    // second visit comes from the shared cache
    picker.dispatch(key(KeyCode::Enter)).await;
    assert_eq!(picker.title(), "History");
    assert_eq!(library.browses.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_cached_revisit_keeps_playable_album() {
    let library = Arc::new(Library::albums());
    let mut picker = content_picker(library.clone(), None, PickerMode::Play).await;

    picker.dispatch(key(KeyCode::Enter)).await;
    picker.dispatch(key(KeyCode::Left)).await;
    picker.dispatch(key(KeyCode::Enter)).await;
    assert_eq!(picker.title(), "Albums");
    // root plus the first visit; the second visit came from the cache
    assert_eq!(library.browses.load(Ordering::SeqCst), 2);

    let album = picker.current().cloned().unwrap();
    assert!(album.is_playable());
    assert_eq!(album.label(), "Kind of Blue - Miles Davis");

    picker.dispatch(key(KeyCode::Enter)).await;
    assert!(picker.is_done());
    assert!(picker.outcome().played);
    assert_eq!(library.actions(), vec!["play Kind of Blue"]);
}

#[tokio::test]
async fn test_filter_then_select() {
    let library = Arc::new(Library::podcasts());
    let mut picker = content_picker(library.clone(), None, PickerMode::SaveFavorite).await;

    for c in "dnw".chars() {
        picker.dispatch(key(KeyCode::Char(c))).await;
    }
    assert_eq!(titles(&picker), vec!["Daily News"]);

    picker.dispatch(key(KeyCode::Enter)).await;
    assert!(picker.outcome().saved);
    assert_eq!(library.actions(), vec!["save Daily News"]);
}

#[tokio::test]
async fn test_unsupported_action_reports_error() {
    let library = Arc::new(Library::podcasts());
    let mut picker = content_picker(library, None, PickerMode::RemoveFavorite).await;

    picker.dispatch(key(KeyCode::Down)).await;
    picker.dispatch(key(KeyCode::Enter)).await;

    // the service's default rejects favorites removal; the picker still exits
    assert!(picker.is_done());
    let outcome = picker.outcome();
    assert!(!outcome.removed);
    assert!(outcome.error.as_deref().unwrap_or_default().contains("not supported"));
}

#[tokio::test]
async fn test_ctrl_a_queues_and_stays_open() {
    let library = Arc::new(Library::podcasts());
    let queue = Arc::new(Queue::with(&[]));
    let mut picker = content_picker(library, Some(queue.clone()), PickerMode::Play).await;

    // containers cannot be queued
    picker.dispatch(ctrl('a')).await;
    assert!(picker.status().unwrap_or_default().contains("cannot be queued"));

    picker.dispatch(key(KeyCode::Down)).await;
    picker.dispatch(ctrl('a')).await;
    assert!(!picker.is_done());
    assert_eq!(queue.calls(), vec!["add Daily News"]);
    assert_eq!(picker.status(), Some("Added 'Daily News' to the queue"));
}

#[tokio::test]
async fn test_navigation_error_keeps_picker_usable() {
    let mut library = Library::podcasts();
    library.nodes.remove("h");
    let mut picker = content_picker(Arc::new(library), None, PickerMode::Play).await;

    picker.dispatch(key(KeyCode::Enter)).await;
    assert!(matches!(picker.state(), PickerState::Error(msg) if msg.contains("cannot browse h")));
    assert_eq!(picker.title(), "Podcasts");

    // any key dismisses the error
    picker.dispatch(key(KeyCode::Down)).await;
    assert_eq!(picker.state(), &PickerState::Listing);
    assert_eq!(picker.current().map(|i| i.title.as_str()), Some("Daily News"));
}

// =============================================================================
// Queue Picker
// =============================================================================

#[tokio::test]
async fn test_queue_picker_plays_by_position() {
    let queue = Arc::new(Queue::with(&["A", "B", "C"]));
    let items = assert_ok!(queue.get_queue().await);
    let mut picker = Picker::new("Queue", items, PickerMode::Play, Callbacks::for_queue(queue.clone()));

    picker.dispatch(key(KeyCode::End)).await;
    picker.dispatch(key(KeyCode::Enter)).await;

    assert!(picker.outcome().played);
    assert_eq!(queue.calls(), vec!["play 2"]);
}

#[tokio::test]
async fn test_queue_picker_delete_and_clear() {
    let queue = Arc::new(Queue::with(&["A", "B", "C"]));
    let items = assert_ok!(queue.get_queue().await);
    let mut picker = Picker::new("Queue", items, PickerMode::Play, Callbacks::for_queue(queue.clone()));

    picker.dispatch(key(KeyCode::Down)).await;
    picker.dispatch(ctrl('d')).await;
    assert_eq!(titles(&picker), vec!["A", "C"]);
    assert_eq!(picker.status(), Some("Removed 'B' from the queue"));

    picker.dispatch(ctrl('x')).await;
    assert!(picker.items().is_empty());
    assert_eq!(queue.calls(), vec!["remove [1]", "clear"]);
    assert!(!picker.is_done());

    picker.dispatch(key(KeyCode::Esc)).await;
    assert!(picker.outcome().cancelled);
}

#[tokio::test]
async fn test_queue_entry_gone_is_an_error() {
    let queue = Arc::new(Queue::with(&["A", "B"]));
    let items = assert_ok!(queue.get_queue().await);
    let mut picker = Picker::new("Queue", items, PickerMode::Play, Callbacks::for_queue(queue.clone()));

    // another client emptied the queue meanwhile
    assert_ok!(queue.clear_queue().await);
    picker.dispatch(ctrl('d')).await;

    assert!(matches!(picker.state(), PickerState::Error(_)));
    assert_err!(queue.move_queue_item(0, 1).await);
}
