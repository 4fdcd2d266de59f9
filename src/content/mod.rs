//! Content navigation core
//!
//! - `path`: display path escaping, parsing and building
//! - `fuzzy`: subsequence matcher for filtering
//! - `cache`: TTL-bounded browse cache
//! - `browse`: display-path resolution through the cache
//! - `completion`: shell completion candidates

pub mod browse;
pub mod cache;
pub mod completion;
pub mod fuzzy;
pub mod path;

pub use browse::Browser;
pub use cache::{BrowseCache, SharedBrowseCache};
pub use completion::Completion;
pub use fuzzy::fuzzy_match;
