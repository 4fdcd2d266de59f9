//! Queue track resolution and reordering
//!
//! Users address queue tracks either by 1-based position or by name. Names
//! resolve through a deliberately broad fallback, first tier with any match
//! wins and the first match in queue order wins within a tier:
//!
//! 0. exact disambiguated label ("Yesterday (2)", "Help - The Beatles")
//! 1. exact title, ignoring case
//! 2. title contains the query
//! 3. query contains the title (users often type "Title by Artist")
//!
//! Broad matching can pick an unexpected track when several tiers could
//! match; that trade-off is intentional and covered by tests.
//!
//! Moves are computed against a snapshot of the queue fetched once per
//! command, then sent as a single remove-and-reinsert `move_queue_item`.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, info};

use crate::error::{ContentError, Result};
use crate::models::{ContentItem, QueueLabelEntry};
use crate::service::QueueService;

// =============================================================================
// Labels and Resolution
// =============================================================================

/// Label every queue position, suffixing repeats with " (n)" from n = 2
pub fn build_labels(items: &[ContentItem]) -> Vec<QueueLabelEntry> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let base = item.label();
            let count = seen.entry(base.clone()).or_insert(0);
            *count += 1;
            let label = if *count == 1 {
                base
            } else {
                format!("{} ({})", base, count)
            };
            QueueLabelEntry { label, index }
        })
        .collect()
}

/// Resolve a user track reference (1-based number or name) to a 0-based index
pub fn resolve_track_arg(arg: &str, items: &[ContentItem]) -> Result<usize> {
    let arg = arg.trim();
    if let Ok(n) = arg.parse::<i64>() {
        if n < 1 || n as usize > items.len() {
            return Err(ContentError::validation(format!(
                "track number {} is out of range (queue has {} tracks)",
                n,
                items.len()
            )));
        }
        return Ok(n as usize - 1);
    }

    let query = arg.to_lowercase();
    if query.is_empty() {
        return Err(ContentError::validation("empty track reference"));
    }

    let labels = build_labels(items);
    if let Some(entry) = labels.iter().find(|e| e.label.to_lowercase() == query) {
        return Ok(entry.index);
    }

    let titles: Vec<String> = items.iter().map(|i| i.title.to_lowercase()).collect();
    let tiers: [&dyn Fn(&str) -> bool; 3] = [
        &|title: &str| title == query,
        &|title: &str| title.contains(query.as_str()),
        &|title: &str| !title.is_empty() && query.contains(title),
    ];
    for (tier, matches) in tiers.iter().enumerate() {
        if let Some(index) = titles.iter().position(|t| matches(t.as_str())) {
            debug!(arg, tier = tier + 1, index, "resolved queue track by name");
            return Ok(index);
        }
    }

    Err(ContentError::NotFound {
        what: "track",
        name: arg.to_string(),
        available: labels.into_iter().take(10).map(|e| e.label).collect(),
    })
}

// =============================================================================
// Destinations
// =============================================================================

/// Where a track should go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Top,
    Bottom,
    Up,
    Down,
    /// Right after the track currently playing
    Next,
    Before(String),
    After(String),
    /// An explicit position or the position of another track
    At(String),
}

impl Destination {
    /// Parse a destination word plus its optional extra argument
    pub fn parse(dest: &str, extra: Option<&str>) -> Result<Self> {
        let keyword = dest.trim().to_lowercase();
        let needs_target = matches!(keyword.as_str(), "before" | "after");

        match (needs_target, extra) {
            (true, None) => {
                return Err(ContentError::validation(format!(
                    "'{}' needs a target track",
                    keyword
                )))
            }
            (false, Some(extra)) => {
                return Err(ContentError::validation(format!(
                    "unexpected argument '{}' after '{}'",
                    extra, dest
                )))
            }
            _ => {}
        }

        Ok(match (keyword.as_str(), extra) {
            ("top" | "first", _) => Destination::Top,
            ("bottom" | "last" | "end", _) => Destination::Bottom,
            ("up", _) => Destination::Up,
            ("down", _) => Destination::Down,
            ("next", _) => Destination::Next,
            ("before", Some(target)) => Destination::Before(target.to_string()),
            ("after", Some(target)) => Destination::After(target.to_string()),
            _ => Destination::At(dest.to_string()),
        })
    }

    fn needs_current(&self) -> bool {
        matches!(self, Destination::Next)
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Top => write!(f, "top"),
            Destination::Bottom => write!(f, "bottom"),
            Destination::Up => write!(f, "up"),
            Destination::Down => write!(f, "down"),
            Destination::Next => write!(f, "next"),
            Destination::Before(t) => write!(f, "before {}", t),
            Destination::After(t) => write!(f, "after {}", t),
            Destination::At(t) => write!(f, "to {}", t),
        }
    }
}

/// Target index for moving `from`, or `None` when the move changes nothing
///
/// Indices follow remove-then-reinsert semantics: `to` is the position the
/// track occupies after the move.
pub fn target_index(
    from: usize,
    dest: &Destination,
    current: Option<usize>,
    items: &[ContentItem],
) -> Result<Option<usize>> {
    let len = items.len();
    if from >= len {
        return Err(ContentError::validation(format!(
            "track index {} is out of range",
            from + 1
        )));
    }
    let last = len - 1;

    let to = match dest {
        Destination::Top => 0,
        Destination::Bottom => last,
        Destination::Up if from == 0 => return Ok(None),
        Destination::Up => from - 1,
        Destination::Down if from == last => return Ok(None),
        Destination::Down => from + 1,
        Destination::Next => match current {
            Some(cur) => (cur + 1).min(last),
            None => 0,
        },
        Destination::Before(target) => {
            let target = resolve_track_arg(target, items)?;
            if target == from {
                return Ok(None);
            }
            if from > target {
                target
            } else {
                target.saturating_sub(1)
            }
        }
        Destination::After(target) => {
            let target = resolve_track_arg(target, items)?;
            if target == from {
                return Ok(None);
            }
            // the index is taken after the track leaves its old slot, so
            // coming from above the target shifts left by one; the naive
            // `target + 1` from above would land one past the target
            if from < target {
                target
            } else {
                (target + 1).min(last)
            }
        }
        Destination::At(arg) => resolve_track_arg(arg, items)?,
    };

    Ok((to != from).then_some(to))
}

/// Apply a remove-then-reinsert move to a local list
pub fn apply_move<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if from == to || from >= items.len() || to >= items.len() {
        return;
    }
    let item = items.remove(from);
    items.insert(to, item);
}

// =============================================================================
// Queue Operations
// =============================================================================

/// Result of a move request
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MoveOutcome {
    pub title: String,
    /// 0-based position before the move
    pub from: usize,
    /// 0-based position after the move; `None` when nothing changed
    pub to: Option<usize>,
}

/// Move one queue track; validation happens before any mutation
pub async fn move_track(
    queue: &dyn QueueService,
    track: &str,
    dest: &str,
    extra: Option<&str>,
) -> Result<MoveOutcome> {
    let destination = Destination::parse(dest, extra)?;
    let items = queue.get_queue().await?;
    if items.is_empty() {
        return Err(ContentError::validation("the queue is empty"));
    }

    let from = resolve_track_arg(track, &items)?;
    let current = if destination.needs_current() {
        queue.current_queue_index().await?
    } else {
        None
    };
    let to = target_index(from, &destination, current, &items)?;

    if let Some(to) = to {
        info!(from, to, %destination, "moving queue track");
        queue.move_queue_item(from, to).await?;
    } else {
        debug!(from, %destination, "queue move is a no-op");
    }

    Ok(MoveOutcome {
        title: items[from].title.clone(),
        from,
        to,
    })
}

/// Remove tracks by reference; every reference must resolve first
pub async fn remove_tracks(queue: &dyn QueueService, args: &[String]) -> Result<Vec<ContentItem>> {
    if args.is_empty() {
        return Err(ContentError::validation("no tracks given"));
    }
    let items = queue.get_queue().await?;

    let mut indices = args
        .iter()
        .map(|arg| resolve_track_arg(arg, &items))
        .collect::<Result<Vec<_>>>()?;
    indices.sort_unstable();
    indices.dedup();

    queue.remove_from_queue(&indices).await?;
    Ok(indices.into_iter().map(|i| items[i].clone()).collect())
}

/// Start playback at a referenced track
pub async fn play_track(queue: &dyn QueueService, arg: &str) -> Result<ContentItem> {
    let items = queue.get_queue().await?;
    let index = resolve_track_arg(arg, &items)?;
    let item = items[index].clone();
    queue.play_queue_index(index, &item).await?;
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemType;

    fn queue(titles: &[&str]) -> Vec<ContentItem> {
        titles
            .iter()
            .enumerate()
            .map(|(i, t)| ContentItem::new(*t, format!("q/{}", i), ItemType::Audio))
            .collect()
    }

    fn titles(items: &[ContentItem]) -> Vec<&str> {
        items.iter().map(|i| i.title.as_str()).collect()
    }

    #[test]
    fn test_labels_disambiguate_duplicates() {
        let items = queue(&["Title", "Other", "Title", "Title"]);
        let labels: Vec<_> = build_labels(&items).into_iter().map(|e| e.label).collect();
        assert_eq!(labels, vec!["Title", "Other", "Title (2)", "Title (3)"]);
    }

    #[test]
    fn test_labels_include_artist() {
        let items = vec![
            ContentItem::new("Help", "1", ItemType::Audio).with_media(Some("The Beatles"), None),
            ContentItem::new("Help", "2", ItemType::Audio),
            ContentItem::new("Help", "3", ItemType::Audio).with_media(Some("The Beatles"), None),
        ];
        let labels: Vec<_> = build_labels(&items).into_iter().map(|e| e.label).collect();
        assert_eq!(labels, vec!["Help - The Beatles", "Help", "Help - The Beatles (2)"]);
    }

    #[test]
    fn test_resolve_by_number() {
        let items = queue(&["A", "B", "C"]);
        assert_eq!(resolve_track_arg("1", &items).unwrap(), 0);
        assert_eq!(resolve_track_arg("3", &items).unwrap(), 2);
        assert!(matches!(
            resolve_track_arg("0", &items),
            Err(ContentError::Validation(_))
        ));
        assert!(matches!(
            resolve_track_arg("4", &items),
            Err(ContentError::Validation(_))
        ));
    }

    #[test]
    fn test_resolve_tiers() {
        let items = queue(&["Yesterday Once More", "Yesterday", "Let It Be"]);
        // exact title beats an earlier substring match
        assert_eq!(resolve_track_arg("YESTERDAY", &items).unwrap(), 1);
        // title contains query
        assert_eq!(resolve_track_arg("once", &items).unwrap(), 0);
        // query contains title
        assert_eq!(resolve_track_arg("let it be by the beatles", &items).unwrap(), 2);
    }

    #[test]
    fn test_resolve_broad_match_can_surprise() {
        // an exact label wins, otherwise the first title containing the query
        let items = queue(&["Let It Be", "Be"]);
        assert_eq!(resolve_track_arg("be", &items).unwrap(), 1);
        let items = queue(&["Let It Be", "Maybe"]);
        assert_eq!(resolve_track_arg("be", &items).unwrap(), 0);
    }

    #[test]
    fn test_resolve_duplicate_label() {
        let items = queue(&["Title", "Title", "Title"]);
        assert_eq!(resolve_track_arg("title (3)", &items).unwrap(), 2);
        assert_eq!(resolve_track_arg("Title", &items).unwrap(), 0);
    }

    #[test]
    fn test_resolve_not_found() {
        let items = queue(&["A"]);
        let err = resolve_track_arg("zzz", &items).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_parse_destinations() {
        assert_eq!(Destination::parse("top", None).unwrap(), Destination::Top);
        assert_eq!(Destination::parse("Bottom", None).unwrap(), Destination::Bottom);
        assert_eq!(
            Destination::parse("before", Some("Help")).unwrap(),
            Destination::Before("Help".into())
        );
        assert_eq!(Destination::parse("3", None).unwrap(), Destination::At("3".into()));
        assert!(matches!(
            Destination::parse("after", None),
            Err(ContentError::Validation(_))
        ));
        assert!(matches!(
            Destination::parse("top", Some("x")),
            Err(ContentError::Validation(_))
        ));
    }

    #[test]
    fn test_up_on_first_and_down_on_last_are_noops() {
        let items = queue(&["A", "B", "C"]);
        assert_eq!(target_index(0, &Destination::Up, None, &items).unwrap(), None);
        assert_eq!(target_index(2, &Destination::Down, None, &items).unwrap(), None);
        assert_eq!(target_index(1, &Destination::Up, None, &items).unwrap(), Some(0));
        assert_eq!(target_index(1, &Destination::Down, None, &items).unwrap(), Some(2));
    }

    #[test]
    fn test_top_then_bottom() {
        let mut items = queue(&["A", "B", "X", "C", "D"]);
        let to = target_index(2, &Destination::Top, None, &items).unwrap().unwrap();
        apply_move(&mut items, 2, to);
        assert_eq!(titles(&items), vec!["X", "A", "B", "C", "D"]);

        let from = resolve_track_arg("X", &items).unwrap();
        let to = target_index(from, &Destination::Bottom, None, &items).unwrap().unwrap();
        apply_move(&mut items, from, to);
        assert_eq!(items[4].title, "X");
    }

    #[test]
    fn test_next() {
        let items = queue(&["A", "B", "C", "D"]);
        assert_eq!(target_index(3, &Destination::Next, Some(0), &items).unwrap(), Some(1));
        assert_eq!(target_index(0, &Destination::Next, Some(3), &items).unwrap(), Some(3));
        assert_eq!(target_index(2, &Destination::Next, None, &items).unwrap(), Some(0));
        // already right after the current track
        assert_eq!(target_index(1, &Destination::Next, Some(0), &items).unwrap(), None);
    }

    #[test]
    fn test_before_from_earlier_position() {
        let mut items = queue(&["A", "Yesterday", "B", "Help", "C"]);
        let dest = Destination::Before("Help".into());
        let to = target_index(1, &dest, None, &items).unwrap().unwrap();
        assert_eq!(to, 2);
        apply_move(&mut items, 1, to);
        assert_eq!(titles(&items), vec!["A", "B", "Yesterday", "Help", "C"]);
    }

    #[test]
    fn test_before_from_later_position() {
        let mut items = queue(&["A", "Help", "B", "Yesterday"]);
        let dest = Destination::Before("Help".into());
        let to = target_index(3, &dest, None, &items).unwrap().unwrap();
        apply_move(&mut items, 3, to);
        assert_eq!(titles(&items), vec!["A", "Yesterday", "Help", "B"]);
    }

    #[test]
    fn test_after_both_directions() {
        let mut items = queue(&["X", "A", "T", "B"]);
        let dest = Destination::After("T".into());
        let to = target_index(0, &dest, None, &items).unwrap().unwrap();
        apply_move(&mut items, 0, to);
        assert_eq!(titles(&items), vec!["A", "T", "X", "B"]);

        let mut items = queue(&["A", "T", "B", "X"]);
        let to = target_index(3, &dest, None, &items).unwrap().unwrap();
        apply_move(&mut items, 3, to);
        assert_eq!(titles(&items), vec!["A", "T", "X", "B"]);
    }

    #[test]
    fn test_relative_to_itself_is_noop() {
        let items = queue(&["A", "B"]);
        assert_eq!(
            target_index(1, &Destination::Before("B".into()), None, &items).unwrap(),
            None
        );
        assert_eq!(target_index(1, &Destination::At("2".into()), None, &items).unwrap(), None);
    }
}
