//! Interactive content picker
//!
//! The picker is a message-driven state machine: [`Picker::update`] consumes
//! one [`Message`] at a time and may hand back a [`Task`] for the event loop
//! to run. A task's only effect is producing the next message, so nothing
//! outside the loop ever touches picker state.
//!
//! Per-service behaviour comes from [`Callbacks`]; any callback left `None`
//! simply disables that feature.

use std::fmt;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{debug, info};

use crate::content::browse::browse_item_shared;
use crate::content::cache::SharedBrowseCache;
use crate::content::fuzzy::fuzzy_match;
use crate::models::ContentItem;
use crate::service::{ContentService, QueueService};

/// Rows moved by PageUp/PageDown
pub const PAGE_SIZE: usize = 10;

// =============================================================================
// Callbacks
// =============================================================================

pub type NavigateFuture = BoxFuture<'static, anyhow::Result<Vec<ContentItem>>>;
pub type ActionFuture = BoxFuture<'static, anyhow::Result<()>>;

pub type NavigateFn = Arc<dyn Fn(ContentItem) -> NavigateFuture + Send + Sync>;
pub type ItemActionFn = Arc<dyn Fn(ContentItem) -> ActionFuture + Send + Sync>;
pub type ClearFn = Arc<dyn Fn() -> ActionFuture + Send + Sync>;
pub type PlayableFn = Arc<dyn Fn(&ContentItem) -> bool + Send + Sync>;

/// Capability set a content service offers the picker
#[derive(Clone, Default)]
pub struct Callbacks {
    pub navigate: Option<NavigateFn>,
    pub play: Option<ItemActionFn>,
    pub save_favorite: Option<ItemActionFn>,
    pub remove_favorite: Option<ItemActionFn>,
    pub add_to_queue: Option<ItemActionFn>,
    pub delete_from_queue: Option<ItemActionFn>,
    pub clear_queue: Option<ClearFn>,
    /// Overrides [`ContentItem::is_playable`]
    pub is_playable: Option<PlayableFn>,
}

impl Callbacks {
    /// Radio, podcast and UPnP: browse through the shared cache, play and
    /// manage favorites on the service, enqueue on the device queue
    pub fn for_content(
        service: Arc<dyn ContentService>,
        cache: Arc<SharedBrowseCache>,
        queue: Option<Arc<dyn QueueService>>,
    ) -> Self {
        let navigate: NavigateFn = {
            let service = service.clone();
            Arc::new(move |item: ContentItem| {
                let service = service.clone();
                let cache = cache.clone();
                async move {
                    browse_item_shared(service.as_ref(), &cache, &item)
                        .await
                        .map_err(anyhow::Error::from)
                }
                .boxed()
            })
        };

        let play = item_action(&service, |service, item| {
            async move { service.play(&item).await }.boxed()
        });
        let save_favorite = item_action(&service, |service, item| {
            async move { service.save_favorite(&item).await }.boxed()
        });
        let remove_favorite = item_action(&service, |service, item| {
            async move { service.remove_favorite(&item).await }.boxed()
        });

        let add_to_queue = queue.map(|queue| -> ItemActionFn {
            Arc::new(move |item: ContentItem| {
                let queue = queue.clone();
                async move { queue.add_to_queue(&[item], true).await }.boxed()
            })
        });

        Self {
            navigate: Some(navigate),
            play: Some(play),
            save_favorite: Some(save_favorite),
            remove_favorite: Some(remove_favorite),
            add_to_queue,
            ..Self::default()
        }
    }

    /// The play queue: every entry is playable; entries are located by
    /// backend path in a freshly fetched queue before acting on them
    pub fn for_queue(queue: Arc<dyn QueueService>) -> Self {
        let play: ItemActionFn = {
            let queue = queue.clone();
            Arc::new(move |item: ContentItem| {
                let queue = queue.clone();
                async move {
                    let index = queue_position(queue.as_ref(), &item).await?;
                    queue.play_queue_index(index, &item).await
                }
                .boxed()
            })
        };

        let delete_from_queue: ItemActionFn = {
            let queue = queue.clone();
            Arc::new(move |item: ContentItem| {
                let queue = queue.clone();
                async move {
                    let index = queue_position(queue.as_ref(), &item).await?;
                    queue.remove_from_queue(&[index]).await
                }
                .boxed()
            })
        };

        let clear_queue: ClearFn = Arc::new(move || {
            let queue = queue.clone();
            async move { queue.clear_queue().await }.boxed()
        });

        Self {
            play: Some(play),
            delete_from_queue: Some(delete_from_queue),
            clear_queue: Some(clear_queue),
            is_playable: Some(Arc::new(|_: &ContentItem| true)),
            ..Self::default()
        }
    }

    fn playable(&self, item: &ContentItem) -> bool {
        match &self.is_playable {
            Some(check) => check(item),
            None => item.is_playable(),
        }
    }

    fn for_mode(&self, mode: PickerMode) -> Option<&ItemActionFn> {
        match mode {
            PickerMode::Play => self.play.as_ref(),
            PickerMode::SaveFavorite => self.save_favorite.as_ref(),
            PickerMode::RemoveFavorite => self.remove_favorite.as_ref(),
            PickerMode::AddToQueue => self.add_to_queue.as_ref(),
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("navigate", &self.navigate.is_some())
            .field("play", &self.play.is_some())
            .field("save_favorite", &self.save_favorite.is_some())
            .field("remove_favorite", &self.remove_favorite.is_some())
            .field("add_to_queue", &self.add_to_queue.is_some())
            .field("delete_from_queue", &self.delete_from_queue.is_some())
            .field("clear_queue", &self.clear_queue.is_some())
            .field("is_playable", &self.is_playable.is_some())
            .finish()
    }
}

fn item_action<F>(service: &Arc<dyn ContentService>, call: F) -> ItemActionFn
where
    F: Fn(Arc<dyn ContentService>, ContentItem) -> ActionFuture + Send + Sync + 'static,
{
    let service = service.clone();
    Arc::new(move |item: ContentItem| call(service.clone(), item))
}

async fn queue_position(queue: &dyn QueueService, item: &ContentItem) -> anyhow::Result<usize> {
    let items = queue.get_queue().await?;
    items
        .iter()
        .position(|entry| entry.path == item.path)
        .ok_or_else(|| anyhow::anyhow!("'{}' is no longer in the queue", item.title))
}

// =============================================================================
// Modes, States, Outcome
// =============================================================================

/// What Enter does to a playable item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PickerMode {
    #[default]
    Play,
    SaveFavorite,
    RemoveFavorite,
    AddToQueue,
}

impl PickerMode {
    pub fn verb(&self) -> &'static str {
        match self {
            PickerMode::Play => "play",
            PickerMode::SaveFavorite => "save",
            PickerMode::RemoveFavorite => "remove",
            PickerMode::AddToQueue => "queue",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PickerState {
    #[default]
    Listing,
    /// A navigation fetch is outstanding
    Loading,
    /// The last operation failed; the list is still usable
    Error(String),
    Done,
}

/// How the picker ended
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct PickerOutcome {
    pub played: bool,
    pub saved: bool,
    pub removed: bool,
    pub queued: bool,
    pub cancelled: bool,
    /// The item the final action was applied to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<ContentItem>,
    /// Set when the final action failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PickerOutcome {
    fn acted(&self) -> bool {
        self.played || self.saved || self.removed || self.queued
    }
}

// =============================================================================
// Messages and Tasks
// =============================================================================

/// Non-exiting queue shortcuts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueAction {
    /// Ctrl+A
    Add,
    /// Ctrl+D
    Delete,
    /// Ctrl+X
    Clear,
}

#[derive(Debug)]
pub enum Message {
    Key(KeyEvent),
    /// Children of `parent` arrived (or failed)
    Navigated {
        parent: ContentItem,
        result: anyhow::Result<Vec<ContentItem>>,
    },
    /// The mode action on `item` finished
    Selected {
        item: ContentItem,
        result: anyhow::Result<()>,
    },
    /// A queue shortcut finished
    Queue {
        action: QueueAction,
        item: Option<ContentItem>,
        result: anyhow::Result<()>,
    },
}

/// Work the event loop must run on the picker's behalf
pub struct Task {
    pub future: BoxFuture<'static, Message>,
    /// Blocking tasks are awaited before any further input is read; the
    /// rest run in the background and post their message when done
    pub blocking: bool,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("blocking", &self.blocking).finish()
    }
}

// =============================================================================
// Selection
// =============================================================================

/// Cursor over the filtered list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListState {
    pub selected: usize,
    /// First visible row
    pub offset: usize,
    pub len: usize,
}

impl ListState {
    pub fn new(len: usize) -> Self {
        Self {
            selected: 0,
            offset: 0,
            len,
        }
    }

    pub fn up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            if self.selected < self.offset {
                self.offset = self.selected;
            }
        }
    }

    pub fn down(&mut self) {
        if self.len > 0 && self.selected < self.len - 1 {
            self.selected += 1;
        }
    }

    pub fn page_up(&mut self, page_size: usize) {
        self.selected = self.selected.saturating_sub(page_size);
        if self.selected < self.offset {
            self.offset = self.selected;
        }
    }

    pub fn page_down(&mut self, page_size: usize) {
        if self.len > 0 {
            self.selected = (self.selected + page_size).min(self.len - 1);
        }
    }

    pub fn first(&mut self) {
        self.selected = 0;
        self.offset = 0;
    }

    pub fn last(&mut self) {
        if self.len > 0 {
            self.selected = self.len - 1;
        }
    }

    /// Keep the selection inside a viewport of `visible_height` rows
    pub fn scroll_into_view(&mut self, visible_height: usize) {
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if visible_height > 0 && self.selected >= self.offset + visible_height {
            self.offset = self.selected + 1 - visible_height;
        }
    }

    /// Update the length, clamping the selection
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        if len == 0 {
            self.selected = 0;
            self.offset = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
        if self.offset > self.selected {
            self.offset = self.selected;
        }
    }
}

/// A level the user navigated away from
#[derive(Debug, Clone)]
struct Level {
    title: String,
    items: Vec<ContentItem>,
    selected: usize,
}

// =============================================================================
// Picker
// =============================================================================

#[derive(Debug)]
pub struct Picker {
    title: String,
    mode: PickerMode,
    callbacks: Callbacks,
    all_items: Vec<ContentItem>,
    filtered: Vec<ContentItem>,
    filter: String,
    list: ListState,
    state: PickerState,
    status: Option<String>,
    history: Vec<Level>,
    outcome: PickerOutcome,
}

impl Picker {
    pub fn new(
        title: impl Into<String>,
        items: Vec<ContentItem>,
        mode: PickerMode,
        callbacks: Callbacks,
    ) -> Self {
        let list = ListState::new(items.len());
        Self {
            title: title.into(),
            mode,
            callbacks,
            filtered: items.clone(),
            all_items: items,
            filter: String::new(),
            list,
            state: PickerState::Listing,
            status: None,
            history: Vec::new(),
            outcome: PickerOutcome::default(),
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Titles of the levels above the current one, outermost first
    pub fn breadcrumbs(&self) -> Vec<&str> {
        self.history.iter().map(|level| level.title.as_str()).collect()
    }

    pub fn mode(&self) -> PickerMode {
        self.mode
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.filtered
    }

    pub fn all_items(&self) -> &[ContentItem] {
        &self.all_items
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn list(&self) -> &ListState {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut ListState {
        &mut self.list
    }

    pub fn state(&self) -> &PickerState {
        &self.state
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn is_done(&self) -> bool {
        self.state == PickerState::Done
    }

    pub fn outcome(&self) -> &PickerOutcome {
        &self.outcome
    }

    pub fn into_outcome(self) -> PickerOutcome {
        self.outcome
    }

    pub fn current(&self) -> Option<&ContentItem> {
        self.filtered.get(self.list.selected)
    }

    pub fn is_playable(&self, item: &ContentItem) -> bool {
        self.callbacks.playable(item)
    }

    // -------------------------------------------------------------------------
    // Update
    // -------------------------------------------------------------------------

    /// Apply one message, possibly asking the loop to run a task
    pub fn update(&mut self, message: Message) -> Option<Task> {
        if self.is_done() {
            return None;
        }

        match message {
            Message::Key(key) => self.handle_key(key),
            Message::Navigated { parent, result } => {
                self.navigated(parent, result);
                None
            }
            Message::Selected { item, result } => {
                self.selected(item, result);
                None
            }
            Message::Queue {
                action,
                item,
                result,
            } => {
                self.queue_done(action, item, result);
                None
            }
        }
    }

    /// Apply a message and run every task it causes to completion, in order
    ///
    /// Background tasks are awaited inline, so this is a fully sequential
    /// driver for scripted sessions; the terminal loop uses
    /// [`Picker::update`] directly to keep typing responsive.
    pub async fn dispatch(&mut self, message: Message) {
        let mut next = self.update(message);
        while let Some(task) = next {
            let message = task.future.await;
            next = self.update(message);
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<Task> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        if ctrl {
            return match key.code {
                KeyCode::Char('c') => {
                    self.cancel();
                    None
                }
                KeyCode::Char('a') => self.enqueue(),
                KeyCode::Char('d') => self.dequeue(),
                KeyCode::Char('x') => self.clear_queue(),
                _ => None,
            };
        }

        // any other key acknowledges an error
        if matches!(self.state, PickerState::Error(_)) {
            self.state = PickerState::Listing;
        }

        match key.code {
            KeyCode::Esc => {
                self.cancel();
                None
            }
            KeyCode::Up => {
                self.list.up();
                None
            }
            KeyCode::Down => {
                self.list.down();
                None
            }
            KeyCode::PageUp => {
                self.list.page_up(PAGE_SIZE);
                None
            }
            KeyCode::PageDown => {
                self.list.page_down(PAGE_SIZE);
                None
            }
            KeyCode::Home => {
                self.list.first();
                None
            }
            KeyCode::End => {
                self.list.last();
                None
            }
            KeyCode::Left => {
                self.back();
                None
            }
            KeyCode::Backspace => {
                if self.filter.pop().is_some() {
                    self.apply_filter();
                } else {
                    self.back();
                }
                None
            }
            KeyCode::Char(c) => {
                self.filter.push(c);
                self.apply_filter();
                None
            }
            KeyCode::Enter => self.enter(),
            _ => None,
        }
    }

    fn apply_filter(&mut self) {
        self.filtered = if self.filter.is_empty() {
            self.all_items.clone()
        } else {
            self.all_items
                .iter()
                .filter(|item| fuzzy_match(&item.title, &self.filter))
                .cloned()
                .collect()
        };
        self.list = ListState::new(self.filtered.len());
    }

    fn cancel(&mut self) {
        if !self.outcome.acted() {
            self.outcome.cancelled = true;
        }
        debug!("picker cancelled");
        self.state = PickerState::Done;
    }

    fn enter(&mut self) -> Option<Task> {
        if self.state == PickerState::Loading {
            return None;
        }
        let item = self.current()?.clone();

        if self.callbacks.playable(&item) {
            return self.select(item);
        }

        let Some(navigate) = self.callbacks.navigate.clone() else {
            self.state = PickerState::Error(format!("cannot open '{}' here", item.title));
            return None;
        };

        debug!(title = %item.title, "picker navigating");
        self.state = PickerState::Loading;
        self.status = None;
        let parent = item.clone();
        Some(Task {
            future: async move {
                let result = navigate(item).await;
                Message::Navigated { parent, result }
            }
            .boxed(),
            blocking: false,
        })
    }

    fn select(&mut self, item: ContentItem) -> Option<Task> {
        let Some(action) = self.callbacks.for_mode(self.mode).cloned() else {
            self.state = PickerState::Error(format!(
                "cannot {} '{}' here",
                self.mode.verb(),
                item.title
            ));
            return None;
        };

        Some(Task {
            future: async move {
                let result = action(item.clone()).await;
                Message::Selected { item, result }
            }
            .boxed(),
            blocking: true,
        })
    }

    fn enqueue(&mut self) -> Option<Task> {
        if self.state == PickerState::Loading {
            return None;
        }
        let action = self.callbacks.add_to_queue.clone()?;
        let item = self.current()?.clone();
        if !self.callbacks.playable(&item) {
            self.status = Some(format!("'{}' cannot be queued", item.title));
            return None;
        }

        Some(Task {
            future: async move {
                let result = action(item.clone()).await;
                Message::Queue {
                    action: QueueAction::Add,
                    item: Some(item),
                    result,
                }
            }
            .boxed(),
            blocking: true,
        })
    }

    fn dequeue(&mut self) -> Option<Task> {
        if self.state == PickerState::Loading {
            return None;
        }
        let action = self.callbacks.delete_from_queue.clone()?;
        let item = self.current()?.clone();

        Some(Task {
            future: async move {
                let result = action(item.clone()).await;
                Message::Queue {
                    action: QueueAction::Delete,
                    item: Some(item),
                    result,
                }
            }
            .boxed(),
            blocking: true,
        })
    }

    fn clear_queue(&mut self) -> Option<Task> {
        if self.state == PickerState::Loading {
            return None;
        }
        let action = self.callbacks.clear_queue.clone()?;

        Some(Task {
            future: async move {
                let result = action().await;
                Message::Queue {
                    action: QueueAction::Clear,
                    item: None,
                    result,
                }
            }
            .boxed(),
            blocking: true,
        })
    }

    fn back(&mut self) {
        if self.state == PickerState::Loading {
            return;
        }
        let Some(level) = self.history.pop() else {
            return;
        };

        self.title = level.title;
        self.all_items = level.items;
        self.filter.clear();
        self.apply_filter();
        self.list.selected = level.selected.min(self.list.len.saturating_sub(1));
        self.status = None;
    }

    // -------------------------------------------------------------------------
    // Completions
    // -------------------------------------------------------------------------

    fn navigated(&mut self, parent: ContentItem, result: anyhow::Result<Vec<ContentItem>>) {
        if self.state != PickerState::Loading {
            return;
        }

        match result {
            Ok(children) => {
                debug!(title = %parent.title, children = children.len(), "picker level loaded");
                let previous = Level {
                    title: std::mem::replace(&mut self.title, parent.title),
                    items: std::mem::replace(&mut self.all_items, children),
                    selected: self.list.selected,
                };
                self.history.push(previous);
                self.filter.clear();
                self.apply_filter();
                self.state = PickerState::Listing;
            }
            Err(e) => {
                self.state = PickerState::Error(format!("{:#}", e));
            }
        }
    }

    fn selected(&mut self, item: ContentItem, result: anyhow::Result<()>) {
        match result {
            Ok(()) => {
                info!(title = %item.title, mode = ?self.mode, "picker action applied");
                match self.mode {
                    PickerMode::Play => self.outcome.played = true,
                    PickerMode::SaveFavorite => self.outcome.saved = true,
                    PickerMode::RemoveFavorite => self.outcome.removed = true,
                    PickerMode::AddToQueue => self.outcome.queued = true,
                }
            }
            Err(e) => {
                self.outcome.error = Some(format!("{:#}", e));
            }
        }
        self.outcome.selected = Some(item);
        self.state = PickerState::Done;
    }

    fn queue_done(
        &mut self,
        action: QueueAction,
        item: Option<ContentItem>,
        result: anyhow::Result<()>,
    ) {
        if let Err(e) = result {
            self.state = PickerState::Error(format!("{:#}", e));
            return;
        }

        match (action, item) {
            (QueueAction::Add, Some(item)) => {
                self.status = Some(format!("Added '{}' to the queue", item.title));
            }
            (QueueAction::Delete, Some(item)) => {
                self.all_items.retain(|entry| entry.path != item.path);
                self.filtered.retain(|entry| entry.path != item.path);
                self.list.set_len(self.filtered.len());
                self.status = Some(format!("Removed '{}' from the queue", item.title));
            }
            (QueueAction::Clear, _) => {
                self.all_items.clear();
                self.filtered.clear();
                self.list = ListState::new(0);
                self.status = Some("Queue cleared".to_string());
            }
            (_, None) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemType;
    use std::sync::Mutex;

    fn key(code: KeyCode) -> Message {
        Message::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> Message {
        Message::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    fn items() -> Vec<ContentItem> {
        vec![
            ContentItem::new("WDVX Radio", "s/1", ItemType::Audio),
            ContentItem::new("Jazz", "g/jazz", ItemType::Container),
            ContentItem::new("KEXP", "s/2", ItemType::Audio),
        ]
    }

    fn recording() -> (Callbacks, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let played = log.clone();
        let queued = log.clone();
        let callbacks = Callbacks {
            navigate: Some(Arc::new(|item: ContentItem| {
                async move {
                    Ok::<_, anyhow::Error>(vec![ContentItem::new(
                        format!("{} Station", item.title),
                        "s/9",
                        ItemType::Audio,
                    )])
                }
                .boxed()
            })),
            play: Some(Arc::new(move |item: ContentItem| {
                played.lock().unwrap().push(format!("play {}", item.title));
                async { Ok::<_, anyhow::Error>(()) }.boxed()
            })),
            add_to_queue: Some(Arc::new(move |item: ContentItem| {
                queued.lock().unwrap().push(format!("queue {}", item.title));
                async { Ok::<_, anyhow::Error>(()) }.boxed()
            })),
            ..Callbacks::default()
        };
        (callbacks, log)
    }

    #[test]
    fn test_list_state_clamps() {
        let mut list = ListState::new(3);
        list.up();
        assert_eq!(list.selected, 0);
        list.last();
        list.down();
        assert_eq!(list.selected, 2);
        list.set_len(1);
        assert_eq!(list.selected, 0);
        list.set_len(0);
        list.down();
        assert_eq!(list.selected, 0);
    }

    #[test]
    fn test_scroll_into_view() {
        let mut list = ListState::new(30);
        list.page_down(PAGE_SIZE);
        list.page_down(PAGE_SIZE);
        list.scroll_into_view(5);
        assert_eq!(list.offset, 16);
        list.first();
        assert_eq!(list.offset, 0);
    }

    #[test]
    fn test_cursor_has_no_wraparound() {
        let mut picker = Picker::new("Radio", items(), PickerMode::Play, Callbacks::default());
        picker.update(key(KeyCode::Up));
        assert_eq!(picker.list().selected, 0);
        for _ in 0..5 {
            picker.update(key(KeyCode::Down));
        }
        assert_eq!(picker.list().selected, 2);
    }

    #[test]
    fn test_filter_resets_cursor_and_empty_filter_restores_all() {
        let mut picker = Picker::new("Radio", items(), PickerMode::Play, Callbacks::default());
        picker.update(key(KeyCode::Down));
        picker.update(key(KeyCode::Char('w')));
        picker.update(key(KeyCode::Char('d')));
        picker.update(key(KeyCode::Char('x')));
        assert_eq!(picker.items().len(), 1);
        assert_eq!(picker.items()[0].title, "WDVX Radio");
        assert_eq!(picker.list().selected, 0);

        for _ in 0..3 {
            picker.update(key(KeyCode::Backspace));
        }
        assert_eq!(picker.filter(), "");
        assert_eq!(picker.items(), picker.all_items());
    }

    #[test]
    fn test_enter_on_container_navigates() {
        let (callbacks, _) = recording();
        let mut picker = Picker::new("Radio", items(), PickerMode::Play, callbacks);
        picker.update(key(KeyCode::Down));

        tokio_test::block_on(picker.dispatch(key(KeyCode::Enter)));
        assert_eq!(picker.state(), &PickerState::Listing);
        assert_eq!(picker.title(), "Jazz");
        assert_eq!(picker.breadcrumbs(), vec!["Radio"]);
        assert_eq!(picker.items()[0].title, "Jazz Station");

        picker.update(key(KeyCode::Left));
        assert_eq!(picker.title(), "Radio");
        assert_eq!(picker.list().selected, 1);
        assert!(picker.breadcrumbs().is_empty());
    }

    #[test]
    fn test_navigation_is_background_and_loading_ignores_enter() {
        let (callbacks, _) = recording();
        let mut picker = Picker::new("Radio", items(), PickerMode::Play, callbacks);
        picker.update(key(KeyCode::Down));

        let task = picker.update(key(KeyCode::Enter)).unwrap();
        assert!(!task.blocking);
        assert_eq!(picker.state(), &PickerState::Loading);
        assert!(picker.update(key(KeyCode::Enter)).is_none());

        let message = tokio_test::block_on(task.future);
        picker.update(message);
        assert_eq!(picker.title(), "Jazz");
    }

    #[test]
    fn test_navigation_failure_keeps_list() {
        let callbacks = Callbacks {
            navigate: Some(Arc::new(|_item: ContentItem| {
                async { Err::<Vec<ContentItem>, _>(anyhow::anyhow!("connection refused")) }.boxed()
            })),
            ..Callbacks::default()
        };
        let mut picker = Picker::new("Radio", items(), PickerMode::Play, callbacks);
        picker.update(key(KeyCode::Down));
        tokio_test::block_on(picker.dispatch(key(KeyCode::Enter)));

        assert!(matches!(picker.state(), PickerState::Error(msg) if msg.contains("refused")));
        assert_eq!(picker.items().len(), 3);
        assert_eq!(picker.list().selected, 1);

        picker.update(key(KeyCode::Down));
        assert_eq!(picker.state(), &PickerState::Listing);
    }

    #[test]
    fn test_enter_on_playable_plays_and_exits() {
        let (callbacks, log) = recording();
        let mut picker = Picker::new("Radio", items(), PickerMode::Play, callbacks);

        let task = picker.update(key(KeyCode::Enter)).unwrap();
        assert!(task.blocking);
        picker.update(tokio_test::block_on(task.future));

        assert!(picker.is_done());
        assert!(picker.outcome().played);
        assert!(!picker.outcome().cancelled);
        assert_eq!(picker.outcome().selected.as_ref().unwrap().title, "WDVX Radio");
        assert_eq!(*log.lock().unwrap(), vec!["play WDVX Radio"]);
    }

    #[test]
    fn test_failed_action_still_exits() {
        let callbacks = Callbacks {
            save_favorite: Some(Arc::new(|_item: ContentItem| {
                async { Err::<(), _>(anyhow::anyhow!("favorites full")) }.boxed()
            })),
            ..Callbacks::default()
        };
        let mut picker = Picker::new("Radio", items(), PickerMode::SaveFavorite, callbacks);
        tokio_test::block_on(picker.dispatch(key(KeyCode::Enter)));

        assert!(picker.is_done());
        assert!(!picker.outcome().saved);
        assert_eq!(picker.outcome().error.as_deref(), Some("favorites full"));
    }

    #[test]
    fn test_missing_callbacks_degrade() {
        let mut picker = Picker::new("Radio", items(), PickerMode::RemoveFavorite, Callbacks::default());
        assert!(picker.update(key(KeyCode::Enter)).is_none());
        assert!(matches!(picker.state(), PickerState::Error(_)));

        assert!(picker.update(ctrl('a')).is_none());
        assert!(picker.update(ctrl('d')).is_none());
        assert!(picker.update(ctrl('x')).is_none());
        assert!(!picker.is_done());

        picker.update(key(KeyCode::Down));
        assert!(picker.update(key(KeyCode::Enter)).is_none());
        assert!(matches!(picker.state(), PickerState::Error(msg) if msg.contains("open")));
    }

    #[test]
    fn test_container_playable_is_selected_not_opened() {
        let (callbacks, log) = recording();
        let mut album = ContentItem::new("Kind of Blue", "a/1", ItemType::Container);
        album.container_playable = true;
        let mut picker = Picker::new("Albums", vec![album], PickerMode::Play, callbacks);

        tokio_test::block_on(picker.dispatch(key(KeyCode::Enter)));
        assert!(picker.outcome().played);
        assert_eq!(*log.lock().unwrap(), vec!["play Kind of Blue"]);
    }

    #[test]
    fn test_ctrl_a_queues_without_exiting() {
        let (callbacks, log) = recording();
        let mut picker = Picker::new("Radio", items(), PickerMode::Play, callbacks);

        tokio_test::block_on(picker.dispatch(ctrl('a')));
        assert!(!picker.is_done());
        assert_eq!(picker.status(), Some("Added 'WDVX Radio' to the queue"));

        picker.update(key(KeyCode::Down));
        picker.update(ctrl('a'));
        assert_eq!(picker.status(), Some("'Jazz' cannot be queued"));
        assert_eq!(*log.lock().unwrap(), vec!["queue WDVX Radio"]);
    }

    #[test]
    fn test_escape_cancels() {
        let mut picker = Picker::new("Radio", items(), PickerMode::Play, Callbacks::default());
        picker.update(key(KeyCode::Esc));
        assert!(picker.is_done());
        assert!(picker.outcome().cancelled);

        let mut picker = Picker::new("Radio", items(), PickerMode::Play, Callbacks::default());
        picker.update(ctrl('c'));
        assert!(picker.into_outcome().cancelled);
    }

    #[test]
    fn test_delete_and_clear_update_lists() {
        let callbacks = Callbacks {
            delete_from_queue: Some(Arc::new(|_item: ContentItem| async { Ok::<_, anyhow::Error>(()) }.boxed())),
            clear_queue: Some(Arc::new(|| async { Ok::<_, anyhow::Error>(()) }.boxed())),
            is_playable: Some(Arc::new(|_: &ContentItem| true)),
            ..Callbacks::default()
        };
        let mut picker = Picker::new("Queue", items(), PickerMode::Play, callbacks);
        picker.update(key(KeyCode::End));

        tokio_test::block_on(picker.dispatch(ctrl('d')));
        assert_eq!(picker.all_items().len(), 2);
        assert_eq!(picker.items().len(), 2);
        assert_eq!(picker.list().selected, 1);
        assert!(!picker.is_done());

        tokio_test::block_on(picker.dispatch(ctrl('x')));
        assert!(picker.items().is_empty());
        assert_eq!(picker.list(), &ListState::new(0));
        assert_eq!(picker.status(), Some("Queue cleared"));
    }

    #[test]
    fn test_backspace_on_empty_filter_goes_back() {
        let (callbacks, _) = recording();
        let mut picker = Picker::new("Radio", items(), PickerMode::Play, callbacks);
        picker.update(key(KeyCode::Char('j')));
        tokio_test::block_on(picker.dispatch(key(KeyCode::Enter)));
        assert_eq!(picker.title(), "Jazz");
        assert_eq!(picker.filter(), "");

        picker.update(key(KeyCode::Backspace));
        assert_eq!(picker.title(), "Radio");
        assert_eq!(picker.items().len(), 3);
    }
}
