//! Shell tab-completion candidates
//!
//! The word under the cursor is split into a parent path and a partial name:
//! a trailing `/` means "browse into", anything after the last `/` filters the
//! parent's children. Output follows the cobra completion protocol used by
//! the generated shell scripts: one candidate per line, then `:<directive>`.

use crate::content::browse::Browser;
use crate::content::fuzzy::fuzzy_match;
use crate::content::path;
use crate::error::Result;
use crate::models::{ContentItem, ItemType};
use crate::queue::build_labels;

/// Directive bit: do not add a space after the completion
pub const DIRECTIVE_NO_SPACE: u32 = 2;
/// Directive bit: do not fall back to file completion
pub const DIRECTIVE_NO_FILE_COMP: u32 = 4;
/// Directive bit: keep candidates in the given order
pub const DIRECTIVE_KEEP_ORDER: u32 = 32;

/// Completion candidates plus how the shell should treat them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub candidates: Vec<String>,
    /// Set when a container is offered, so the user can keep typing into it
    pub no_space: bool,
    /// Set for queue positions, which must not be re-sorted
    pub keep_order: bool,
}

impl Completion {
    pub fn directive(&self) -> u32 {
        let mut bits = DIRECTIVE_NO_FILE_COMP;
        if self.no_space {
            bits |= DIRECTIVE_NO_SPACE;
        }
        if self.keep_order {
            bits |= DIRECTIVE_KEEP_ORDER;
        }
        bits
    }

    /// Protocol text written to stdout
    pub fn render(&self) -> String {
        let mut out = String::new();
        for candidate in &self.candidates {
            out.push_str(candidate);
            out.push('\n');
        }
        out.push(':');
        out.push_str(&self.directive().to_string());
        out
    }
}

/// Complete a display path against a content service
pub async fn complete_path(browser: &mut Browser<'_>, input: &str) -> Result<Completion> {
    let (parent, partial) = path::split_partial(input);
    let children = browser.browse_path(parent).await?;
    Ok(path_candidates(parent, &partial, &children))
}

/// Build path candidates from the children of `parent`
///
/// Prefix matches win; when nothing starts with the partial text, subsequence
/// matches are offered instead so a typo-ish prefix still finds something.
pub fn path_candidates(parent: &str, partial: &str, children: &[ContentItem]) -> Completion {
    let lower = partial.to_lowercase();
    let mut matches: Vec<&ContentItem> = children
        .iter()
        .filter(|c| c.title.to_lowercase().starts_with(&lower))
        .collect();
    if matches.is_empty() && !partial.is_empty() {
        matches = children
            .iter()
            .filter(|c| fuzzy_match(&c.title, partial))
            .collect();
    }

    let mut completion = Completion::default();
    for child in matches {
        let mut candidate = path::join(parent, &child.title);
        if child.item_type != ItemType::Audio {
            candidate.push('/');
            completion.no_space = true;
        }
        completion.candidates.push(candidate);
    }
    completion
}

/// Complete a queue track reference by label, in queue order
pub fn complete_queue(queue: &[ContentItem], input: &str) -> Completion {
    let lower = input.to_lowercase();
    let candidates = build_labels(queue)
        .into_iter()
        .map(|entry| entry.label)
        .filter(|label| label.to_lowercase().starts_with(&lower))
        .collect();

    Completion {
        candidates,
        no_space: false,
        keep_order: true,
    }
}
