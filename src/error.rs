//! Error types for the content core
//!
//! Collaborator calls (HTTP device client, content services) return
//! `anyhow::Result`; the core wraps those failures untouched in
//! [`ContentError::Upstream`] and adds its own resolution and validation
//! failures.

use thiserror::Error;

/// Errors raised by browsing, queue reordering and the track index
#[derive(Error, Debug)]
pub enum ContentError {
    /// A name, label or index did not resolve to anything
    #[error("{what} not found: {name}{}", format_available(.available))]
    NotFound {
        what: &'static str,
        name: String,
        /// Sibling names offered as diagnostic context
        available: Vec<String>,
    },

    /// Bad user input, reported before anything is mutated
    #[error("{0}")]
    Validation(String),

    /// Failure from the device or content service, passed through unchanged
    #[error(transparent)]
    Upstream(#[from] anyhow::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn format_available(available: &[String]) -> String {
    if available.is_empty() {
        String::new()
    } else {
        format!(" (available: {})", available.join(", "))
    }
}

impl ContentError {
    pub fn not_found(what: &'static str, name: impl Into<String>) -> Self {
        ContentError::NotFound {
            what,
            name: name.into(),
            available: Vec::new(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ContentError::Validation(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ContentError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, ContentError>;
