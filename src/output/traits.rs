//! Result sink traits and error types
//!
//! This module defines the interface every stage writes its records through,
//! and the logical stores those records are partitioned into.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors that can occur while persisting records
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid store key: '{0}'")]
    InvalidKey(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// One logical append-only store per crawl stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Store {
    /// Original posts per target URL, keyed by URL index
    Search,

    /// Followers per author, keyed by author user id
    Followers,

    /// Recent posts per follower, keyed by follower user id
    FollowerPosts,
}

impl Store {
    /// Directory name the store's files live under
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Followers => "followers",
            Self::FollowerPosts => "follower_posts",
        }
    }
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Trait for append-only record sinks
///
/// A call appends exactly one batch for one entity. Earlier batches are never
/// rewritten, so repeated runs accumulate.
pub trait ResultSink {
    /// Appends `records` as one batch under `key` in `store`
    ///
    /// An empty slice is still written as an empty batch.
    fn append<T: Serialize>(&mut self, store: Store, key: &str, records: &[T])
        -> OutputResult<()>;
}
