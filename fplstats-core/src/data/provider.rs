//! Data source trait, progress reporting, and structured error types.
//!
//! The `EntitySource` trait abstracts over where player files come from (the
//! GitHub mirror in production, in-memory fixtures in tests) so the pipeline
//! can be driven without network access.

use crate::domain::{EntityFile, WeeklyTable};
use thiserror::Error;

/// Structured error types for listing and fetching.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    Network(String),

    #[error("HTTP {status} for {url}")]
    Http { status: u16, url: String },

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("failed to parse {what}: {reason}")]
    Parse { what: String, reason: String },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("I/O error reading {path}: {reason}")]
    Io { path: String, reason: String },
}

impl DataError {
    /// Worth another attempt: connection trouble or a server-side error.
    pub fn is_transient(&self) -> bool {
        match self {
            DataError::Network(_) => true,
            DataError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn parse(what: impl Into<String>, reason: impl ToString) -> Self {
        DataError::Parse {
            what: what.into(),
            reason: reason.to_string(),
        }
    }
}

/// Where player directories and their gameweek files come from.
pub trait EntitySource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// List the player directories, in the order the source reports them.
    fn list_entities(&self) -> Result<Vec<EntityFile>, DataError>;

    /// Fetch and parse one player's gameweek file.
    fn fetch_entity(&self, entity: &EntityFile) -> Result<WeeklyTable, DataError>;

    /// False once the source has been rate limited; further fetches are pointless.
    fn is_available(&self) -> bool {
        true
    }
}

/// Progress callback for the per-player fetch loop.
pub trait FetchProgress: Send + Sync {
    /// Called before fetching a player.
    fn on_start(&self, entity: &EntityFile, index: usize, total: usize);

    /// Called when a fetch finishes; `Ok` carries the row count.
    fn on_complete(
        &self,
        entity: &EntityFile,
        index: usize,
        total: usize,
        result: Result<usize, &DataError>,
    );

    /// Called when the whole batch is done.
    fn on_batch_complete(&self, fetched: usize, failed: usize, total: usize);
}

/// Prints one line per player to stdout.
pub struct StdoutProgress;

impl FetchProgress for StdoutProgress {
    fn on_start(&self, entity: &EntityFile, index: usize, total: usize) {
        println!("[{}/{}] Processing {}...", index + 1, total, entity.name);
    }

    fn on_complete(
        &self,
        entity: &EntityFile,
        _index: usize,
        _total: usize,
        result: Result<usize, &DataError>,
    ) {
        if let Err(e) = result {
            println!("  FAIL: {}: {e}", entity.name);
        }
    }

    fn on_batch_complete(&self, fetched: usize, failed: usize, total: usize) {
        println!("\nFetch complete: {fetched}/{total} fetched, {failed} failed");
    }
}

/// Silent progress reporter.
pub struct NoProgress;

impl FetchProgress for NoProgress {
    fn on_start(&self, _entity: &EntityFile, _index: usize, _total: usize) {}

    fn on_complete(
        &self,
        _entity: &EntityFile,
        _index: usize,
        _total: usize,
        _result: Result<usize, &DataError>,
    ) {
    }

    fn on_batch_complete(&self, _fetched: usize, _failed: usize, _total: usize) {}
}
