//! CLI command handlers
//!
//! Each handler does its work through the [`Session`], prints through
//! [`Output`] and turns the result into a semantic [`ExitCode`].

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cli::{
    BrowseCmd, CategoryCmd, CompleteCmd, ExitCode, IndexAction, Output, PickCmd, QueueAction,
    QueueRow, SearchCmd, ServiceArgs, StatusOk, WatchCmd,
};
use crate::config::Config;
use crate::content::completion::{self, Completion};
use crate::content::path;
use crate::error::{ContentError, Result};
use crate::index::TrackIndex;
use crate::models::{ContentItem, IndexedTrack};
use crate::picker::{Callbacks, Picker, PickerOutcome};
use crate::queue;
use crate::service::{ContentService, EventSource, QueueService, ServiceKey};
use crate::session::{ServiceKind, Session};
use crate::ui;
use crate::watch;

fn report(output: &Output, result: Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            warn!(error = %e, "command failed");
            output.fail(&e)
        }
    }
}

fn queue_only(what: &str) -> ContentError {
    ContentError::validation(format!("{} is not available for the queue", what))
}

async fn content_key(session: &Session, target: &ServiceArgs) -> Result<ServiceKey> {
    session
        .service_key(target.service, target.server.as_deref())
        .await
}

fn print_items(items: &[ContentItem]) {
    if items.is_empty() {
        println!("(empty)");
    }
    for item in items {
        println!("{}", item);
    }
}

// =============================================================================
// Content Commands
// =============================================================================

/// List the children of a display path
pub async fn browse_cmd(cmd: BrowseCmd, session: &mut Session, output: &Output) -> ExitCode {
    report(output, browse(cmd, session, output).await)
}

async fn browse(cmd: BrowseCmd, session: &mut Session, output: &Output) -> Result<()> {
    let items = if cmd.target.service == ServiceKind::Queue {
        session.client().get_queue().await?
    } else {
        let key = content_key(session, &cmd.target).await?;
        let service = session.content(key);
        session.browser(&service).browse_path(&cmd.path).await?
    };

    output.print(items, |items| print_items(items))?;
    Ok(())
}

/// Search one service
pub async fn search_cmd(cmd: SearchCmd, session: &mut Session, output: &Output) -> ExitCode {
    report(output, search(cmd, session, output).await)
}

async fn search(cmd: SearchCmd, session: &mut Session, output: &Output) -> Result<()> {
    if cmd.target.service == ServiceKind::Queue {
        return Err(queue_only("search"));
    }
    let key = content_key(session, &cmd.target).await?;
    let mut items = session.content(key).search(&cmd.query).await?;
    items.truncate(cmd.limit);

    output.print(items, |items| print_items(items))?;
    Ok(())
}

/// List a named category
pub async fn category_cmd(cmd: CategoryCmd, session: &mut Session, output: &Output) -> ExitCode {
    report(output, category(cmd, session, output).await)
}

async fn category(cmd: CategoryCmd, session: &mut Session, output: &Output) -> Result<()> {
    if cmd.target.service == ServiceKind::Queue {
        return Err(queue_only("categories"));
    }
    let key = content_key(session, &cmd.target).await?;
    let service = session.content(key);

    if cmd.all {
        let items = service.category_all(&cmd.name).await?;
        output.print(items, |items| print_items(items))?;
    } else {
        let page = service.category(&cmd.name, cmd.page).await?;
        if page.has_more {
            output.info(format!("more on page {}", cmd.page + 1));
        }
        output.print(page.items, |items| print_items(items))?;
    }
    Ok(())
}

/// Print completion candidates; failures degrade to "no candidates"
pub async fn complete_cmd(cmd: CompleteCmd, session: Option<&mut Session>) -> ExitCode {
    println!("{}", completion_for(&cmd, session).await.render());
    ExitCode::Success
}

/// Candidates for the hidden `__complete` command; without a device there
/// are none
pub async fn completion_for(cmd: &CompleteCmd, session: Option<&mut Session>) -> Completion {
    let Some(session) = session else {
        debug!(word = %cmd.word, "no device configured, nothing to complete");
        return Completion::default();
    };
    match complete(cmd, session).await {
        Ok(completion) => completion,
        Err(e) => {
            warn!(error = %e, word = %cmd.word, "completion failed");
            Completion::default()
        }
    }
}

async fn complete(cmd: &CompleteCmd, session: &mut Session) -> Result<Completion> {
    if cmd.target.service == ServiceKind::Queue {
        let items = session.client().get_queue().await?;
        return Ok(completion::complete_queue(&items, &cmd.word));
    }
    let key = content_key(session, &cmd.target).await?;
    let service = session.content(key);
    let mut browser = session.browser(&service);
    completion::complete_path(&mut browser, &cmd.word).await
}

/// Run the interactive picker
pub async fn pick_cmd(cmd: PickCmd, session: &mut Session, output: &Output) -> ExitCode {
    report(output, pick(cmd, session, output).await)
}

async fn pick(cmd: PickCmd, session: &mut Session, output: &Output) -> Result<()> {
    let (title, items, callbacks) = if cmd.target.service == ServiceKind::Queue {
        let items = session.client().get_queue().await?;
        ("Queue".to_string(), items, Callbacks::for_queue(session.queue()))
    } else {
        let key = content_key(session, &cmd.target).await?;
        let service = session.content(key.clone());
        let items = session.browser(&service).browse_path(&cmd.path).await?;
        let title = path::parse(&cmd.path)
            .pop()
            .unwrap_or_else(|| key.to_string());
        let callbacks = Callbacks::for_content(
            Arc::new(service),
            session.share_cache(),
            Some(session.queue()),
        );
        (title, items, callbacks)
    };

    let picker = Picker::new(title, items, cmd.mode.into(), callbacks);
    let outcome = ui::run_picker(picker).await?;
    finish_pick(outcome, output)
}

fn finish_pick(outcome: PickerOutcome, output: &Output) -> Result<()> {
    if let Some(error) = &outcome.error {
        return Err(ContentError::Upstream(anyhow::anyhow!("{}", error)));
    }
    if outcome.cancelled {
        output.info("Cancelled");
        return Ok(());
    }

    output.print(outcome, |outcome| {
        if let Some(item) = &outcome.selected {
            let verb = if outcome.played {
                "Playing"
            } else if outcome.saved {
                "Saved"
            } else if outcome.removed {
                "Removed"
            } else {
                "Queued"
            };
            println!("{} {}", verb, item.label());
        }
    })?;
    Ok(())
}

// =============================================================================
// Queue Commands
// =============================================================================

pub async fn queue_cmd(action: QueueAction, session: &mut Session, output: &Output) -> ExitCode {
    report(output, run_queue(action, session, output).await)
}

async fn run_queue(action: QueueAction, session: &mut Session, output: &Output) -> Result<()> {
    let device = session.queue();

    match action {
        QueueAction::List => {
            let items = device.get_queue().await?;
            let current = device.current_queue_index().await?;
            let rows: Vec<QueueRow> = queue::build_labels(&items)
                .into_iter()
                .zip(&items)
                .map(|(entry, item)| QueueRow {
                    position: entry.index + 1,
                    label: entry.label,
                    title: item.title.clone(),
                    artist: item.artist().map(str::to_string),
                    current: current == Some(entry.index),
                })
                .collect();

            output.print(rows, |rows| {
                if rows.is_empty() {
                    println!("(queue is empty)");
                }
                for row in rows {
                    let marker = if row.current { "▶" } else { " " };
                    println!("{} {:>3}. {}", marker, row.position, row.label);
                }
            })?;
        }

        QueueAction::Move {
            track,
            destination,
            target,
        } => {
            let moved = queue::move_track(device.as_ref(), &track, &destination, target.as_deref()).await?;
            output.print(moved, |moved| match moved.to {
                Some(to) => println!("Moved {} from {} to {}", moved.title, moved.from + 1, to + 1),
                None => println!("{} stays at {}", moved.title, moved.from + 1),
            })?;
        }

        QueueAction::Remove { tracks } => {
            let removed = queue::remove_tracks(device.as_ref(), &tracks).await?;
            output.print(removed, |removed| {
                for item in removed {
                    println!("Removed {}", item.label());
                }
            })?;
        }

        QueueAction::Play { track } => {
            let item = queue::play_track(device.as_ref(), &track).await?;
            output.print(item, |item| println!("Playing {}", item.label()))?;
        }

        QueueAction::Clear => {
            device.clear_queue().await?;
            output.print(StatusOk::default(), |_| println!("Queue cleared"))?;
        }

        QueueAction::Add { target, path } => {
            if target.service == ServiceKind::Queue {
                return Err(queue_only("adding from the queue"));
            }
            let key = content_key(session, &target).await?;
            let service = session.content(key);
            let item = session.browser(&service).find_item(&path).await?;
            device.add_to_queue(std::slice::from_ref(&item), true).await?;
            info!(title = %item.title, "added to queue");
            output.print(item, |item| println!("Queued {}", item.label()))?;
        }
    }
    Ok(())
}

// =============================================================================
// Index Commands
// =============================================================================

/// `index build` needs the device; `search` and `status` work offline
pub async fn index_cmd(
    action: IndexAction,
    config: &Config,
    session: Option<&mut Session>,
    output: &Output,
) -> ExitCode {
    report(output, run_index(action, config, session, output).await)
}

fn index_path() -> Result<std::path::PathBuf> {
    TrackIndex::default_path()
        .ok_or_else(|| ContentError::validation("could not determine the cache directory"))
}

fn load_index() -> Result<TrackIndex> {
    let path = index_path()?;
    TrackIndex::load(&path)?.ok_or_else(|| {
        ContentError::validation("no usable track index; run `tunetui index build <server>` first")
    })
}

async fn run_index(
    action: IndexAction,
    config: &Config,
    session: Option<&mut Session>,
    output: &Output,
) -> Result<()> {
    let max_age = config.index.max_age();

    match action {
        IndexAction::Build { server, container } => {
            let session = session.ok_or_else(|| {
                ContentError::validation("index build needs a device (--device or TUNETUI_DEVICE)")
            })?;
            let server = session.media_server(&server).await?;
            let service = session.content(ServiceKey::Upnp {
                server: server.path.clone(),
            });

            output.info(format!("Indexing {}...", server.title));
            let index = TrackIndex::build(&service, &server.title, &container).await?;
            index.save(&index_path()?)?;

            output.print(index.status(max_age, Utc::now()), |status| {
                println!(
                    "Indexed {} tracks from {} ({})",
                    status.track_count, status.server_name, status.container_name
                );
            })?;
        }

        IndexAction::Search { query, limit } => {
            let index = load_index()?;
            if !index.is_fresh(max_age, Utc::now()) {
                warn!(indexed_at = %index.indexed_at, "searching a stale track index");
                output.info(format!(
                    "Warning: index is older than {}h; rebuild with `tunetui index build`",
                    config.index.max_age_hours
                ));
            }

            let limit = limit.unwrap_or(config.index.max_results);
            let found: Vec<IndexedTrack> = index
                .search(&query.join(" "), limit)
                .into_iter()
                .cloned()
                .collect();

            output.print(found, |found| {
                if found.is_empty() {
                    println!("No matches");
                }
                for track in found {
                    println!("{}", track);
                }
            })?;
        }

        IndexAction::Status => {
            let index = load_index()?;
            output.print(index.status(max_age, Utc::now()), |status| {
                println!("Server:    {}", status.server_name);
                println!("Container: {}", status.container_name);
                println!("Tracks:    {}", status.track_count);
                println!(
                    "Indexed:   {} ({:.1}h ago{})",
                    status.indexed_at.to_rfc3339(),
                    status.age_hours,
                    if status.fresh { "" } else { ", stale" }
                );
            })?;
        }
    }
    Ok(())
}

// =============================================================================
// Watch Command
// =============================================================================

pub async fn watch_cmd(cmd: WatchCmd, session: &mut Session, output: &Output) -> ExitCode {
    let source: Arc<dyn EventSource> = Arc::new(session.client().clone());
    let cancel = CancellationToken::new();
    let signal = watch::cancel_on_ctrl_c(cancel.clone());

    let json = output.json;
    let result = watch::run(source, cancel.clone(), cmd.count, watch::POLL_INTERVAL, |event| {
        if json {
            if let Ok(line) = serde_json::to_string(event) {
                println!("{}", line);
            }
        } else {
            println!("{}", event);
        }
    })
    .await;

    cancel.cancel();
    let _ = signal.await;

    match result {
        Ok(seen) => {
            output.info(format!("{} events", seen));
            ExitCode::Success
        }
        Err(e) => report(output, Err(ContentError::Upstream(e))),
    }
}
