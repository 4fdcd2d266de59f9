//! CLI - Command Line Interface for tunetui
//!
//! Every command is scriptable; output is JSON whenever stdout is not a
//! terminal or `--json` is passed.
//!
//! # Examples
//!
//! ```bash
//! # Browse a radio genre, completing paths with <TAB>
//! tunetui browse radio "by Genre/Jazz"
//!
//! # Reorder the play queue by name
//! tunetui queue move "Yesterday" before "Help"
//!
//! # Index a media server once, then search it offline
//! tunetui index build "Living Room NAS" Music
//! tunetui index search miles blue
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::api::DeviceError;
use crate::error::ContentError;
use crate::picker::PickerMode;
use crate::session::ServiceKind;

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments or a rejected queue/index request
    InvalidArgs = 2,
    /// Device unreachable or failing
    NetworkError = 3,
    /// Track, folder or server not found
    NotFound = 4,
}

impl ExitCode {
    /// Exit code for a failed operation
    pub fn for_error(err: &ContentError) -> Self {
        match err {
            ContentError::NotFound { .. } => ExitCode::NotFound,
            ContentError::Validation(_) => ExitCode::InvalidArgs,
            ContentError::Upstream(e) => match e.downcast_ref::<DeviceError>() {
                Some(DeviceError::NotFound) => ExitCode::NotFound,
                Some(_) => ExitCode::NetworkError,
                None if e.downcast_ref::<reqwest::Error>().is_some() => ExitCode::NetworkError,
                None => ExitCode::Error,
            },
            ContentError::Io(_) | ContentError::Json(_) => ExitCode::Error,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// tunetui - browse and control networked audio from the terminal
#[derive(Parser, Debug)]
#[command(
    name = "tunetui",
    version,
    author = "Gorka & Hermes",
    about = "Browse radio, podcasts and media servers on a networked speaker",
    long_about = "A terminal client for a networked audio device: browse and \
                  search its radio, podcast and UPnP content, pick items \
                  interactively, reorder the play queue and search an offline \
                  index of your music library.",
    arg_required_else_help = true,
    after_help = "EXAMPLES:\n\
                  tunetui pick radio                         Pick a station interactively\n\
                  tunetui browse podcast \"Favorites\"         List a podcast folder\n\
                  tunetui queue move 3 top                   Move track 3 to the top\n\
                  tunetui index search coltrane naima        Search the offline index"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Device URL (overrides TUNETUI_DEVICE and the config file)
    #[arg(long, short = 'd', global = true)]
    pub device: Option<String>,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Verbose logging to the log file
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the children of a display path
    #[command(visible_alias = "ls")]
    Browse(BrowseCmd),

    /// Search a content service
    #[command(visible_alias = "s")]
    Search(SearchCmd),

    /// List a named category (popular, trending, favorites...)
    #[command(visible_alias = "cat")]
    Category(CategoryCmd),

    /// Print shell completion candidates for a path or queue track
    #[command(hide = true, name = "__complete")]
    Complete(CompleteCmd),

    /// Pick an item interactively
    #[command(visible_alias = "p")]
    Pick(PickCmd),

    /// Inspect and reorder the play queue
    #[command(visible_alias = "q")]
    Queue(QueueCmd),

    /// Offline track index of a media server
    Index(IndexCmd),

    /// Print live device events until interrupted
    Watch(WatchCmd),
}

/// Service selection shared by the content commands
#[derive(Args, Debug, Clone)]
pub struct ServiceArgs {
    /// Content service
    #[arg(value_enum)]
    pub service: ServiceKind,

    /// Media server name or id (upnp only)
    #[arg(long, short = 's')]
    pub server: Option<String>,
}

// =============================================================================
// Content Commands
// =============================================================================

/// List the children of a display path ("" is the service root)
#[derive(Args, Debug)]
pub struct BrowseCmd {
    #[command(flatten)]
    pub target: ServiceArgs,

    /// Display path, segments joined by '/'; inside a name write '/' as %2F,
    /// ':' as %3A and '%' as %25 (completion emits the same escapes)
    #[arg(default_value = "")]
    pub path: String,
}

/// Free-text search within a service
#[derive(Args, Debug)]
pub struct SearchCmd {
    #[command(flatten)]
    pub target: ServiceArgs,

    /// Search query
    #[arg(required = true)]
    pub query: String,

    /// Maximum number of results
    #[arg(long, short = 'l', default_value = "50")]
    pub limit: usize,
}

/// One page of a category, or all of it
#[derive(Args, Debug)]
pub struct CategoryCmd {
    #[command(flatten)]
    pub target: ServiceArgs,

    /// Category name
    #[arg(required = true)]
    pub name: String,

    /// Page to fetch (0-based)
    #[arg(long, default_value = "0", conflicts_with = "all")]
    pub page: u32,

    /// Follow pagination to the end
    #[arg(long, short = 'a')]
    pub all: bool,
}

/// Completion candidates in the shell completion protocol
#[derive(Args, Debug)]
pub struct CompleteCmd {
    #[command(flatten)]
    pub target: ServiceArgs,

    /// The word being completed
    #[arg(default_value = "")]
    pub word: String,
}

/// Interactive picker
#[derive(Args, Debug)]
pub struct PickCmd {
    #[command(flatten)]
    pub target: ServiceArgs,

    /// Display path to start from
    #[arg(default_value = "")]
    pub path: String,

    /// What Enter does to a playable item
    #[arg(long, short = 'm', value_enum, default_value = "play")]
    pub mode: PickMode,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PickMode {
    /// Play immediately
    #[default]
    Play,
    /// Save as favorite
    Save,
    /// Remove from favorites
    Remove,
    /// Append to the play queue
    Queue,
}

impl From<PickMode> for PickerMode {
    fn from(mode: PickMode) -> Self {
        match mode {
            PickMode::Play => PickerMode::Play,
            PickMode::Save => PickerMode::SaveFavorite,
            PickMode::Remove => PickerMode::RemoveFavorite,
            PickMode::Queue => PickerMode::AddToQueue,
        }
    }
}

// =============================================================================
// Queue Commands
// =============================================================================

#[derive(Args, Debug)]
pub struct QueueCmd {
    #[command(subcommand)]
    pub action: QueueAction,
}

#[derive(Subcommand, Debug)]
pub enum QueueAction {
    /// Show the queue with track labels
    #[command(visible_alias = "ls")]
    List,

    /// Move a track: top, bottom, up, down, next, before <t>, after <t>, <n>, <title>
    #[command(visible_alias = "mv")]
    Move {
        /// Track number (1-based) or label
        track: String,
        /// Destination
        destination: String,
        /// Reference track for before/after
        target: Option<String>,
    },

    /// Remove one or more tracks
    #[command(visible_alias = "rm")]
    Remove {
        /// Track numbers (1-based) or labels
        #[arg(required = true)]
        tracks: Vec<String>,
    },

    /// Jump to a track
    Play {
        /// Track number (1-based) or label
        track: String,
    },

    /// Remove every track
    Clear,

    /// Append an item found by display path
    Add {
        #[command(flatten)]
        target: ServiceArgs,
        /// Display path of the item
        path: String,
    },
}

// =============================================================================
// Index Commands
// =============================================================================

#[derive(Args, Debug)]
pub struct IndexCmd {
    #[command(subcommand)]
    pub action: IndexAction,
}

#[derive(Subcommand, Debug)]
pub enum IndexAction {
    /// Walk a media server (or one of its folders) and save the index
    Build {
        /// Media server name or id
        server: String,
        /// Display path of the folder to index, e.g. "Music/AC%2FDC" (default: whole server)
        #[arg(default_value = "")]
        container: String,
    },

    /// Search the saved index
    Search {
        /// Query words; every word must match
        #[arg(required = true)]
        query: Vec<String>,
        /// Maximum results (0 = unbounded, default from config)
        #[arg(long, short = 'l')]
        limit: Option<usize>,
    },

    /// Show what is indexed and how old it is
    Status,
}

/// Watch device events
#[derive(Args, Debug)]
pub struct WatchCmd {
    /// Stop after this many events
    #[arg(long, short = 'n')]
    pub count: Option<usize>,
}

// =============================================================================
// JSON Output Types
// =============================================================================

/// Standard JSON response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

/// Status OK response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusOk {
    pub status: &'static str,
}

impl Default for StatusOk {
    fn default() -> Self {
        Self { status: "ok" }
    }
}

/// One row of `queue list`
#[derive(Debug, Clone, Serialize)]
pub struct QueueRow {
    /// 1-based position
    pub position: usize,
    pub label: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    pub current: bool,
}

// =============================================================================
// Output Helper
// =============================================================================

/// Output handler that respects --json and --quiet flags
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data as JSON, or hand it to `text` for humans
    pub fn print<T: Serialize>(&self, data: T, text: impl FnOnce(&T)) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            text(&data);
        }
        Ok(())
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Report a failed operation with its semantic exit code
    pub fn fail(&self, err: &ContentError) -> ExitCode {
        self.error(err.to_string(), ExitCode::for_error(err))
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
