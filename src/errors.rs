//! Error hierarchy for the aggregator, categorized by operational concern:
//! backing transport (fatal and sticky), client watcher lifecycle, and
//! configuration.

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failures surfaced by the authoritative-store adapter
    #[error(transparent)]
    Backing(#[from] BackingError),

    /// Client watcher lifecycle errors
    #[error(transparent)]
    Watcher(#[from] WatcherError),

    /// Configuration loading failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Configuration validation failures
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Errors produced by a [`Backing`](crate::Backing) implementation.
///
/// Any of these is fatal to the dispatch loop: the projection is only
/// meaningful while coherent with the authoritative store, so the first
/// backing error becomes the loop's sticky error and is reported to every
/// pending and future client request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackingError {
    /// Bulk snapshot load failed
    #[error("bulk load failed: {0}")]
    BulkLoad(String),

    /// Fetching the current value of a changed entity failed
    #[error("{0}")]
    Fetch(String),

    /// The change stream broke
    #[error("change stream failed: {0}")]
    ChangeStream(String),

    /// A change event or payload named an entity kind unknown to the
    /// projection
    #[error("unknown entity kind: {0}")]
    UnknownKind(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WatcherError {
    /// The client's watcher was stopped
    #[error("state watcher was stopped")]
    Stopped,
}
