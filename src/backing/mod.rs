//! Contract between the aggregator and the authoritative-store adapter.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tokio::sync::mpsc;

use crate::AllInfo;
use crate::BackingError;
use crate::EntityId;
use crate::EntityInfo;


/// A change notification from the authoritative store, keyed by
/// (collection, id).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Change {
    pub collection: String,
    pub id: String,
}

impl Change {
    pub fn new(
        collection: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Change {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

/// Adapter over the authoritative store.
///
/// `changed` reports "entity not found" by calling `update(id, None)` on
/// the sink and returning `Ok`; an `Err` is reserved for transport failure
/// and is fatal to the dispatch loop.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Backing: Send + Sync + 'static {
    /// Bulk-loads the current state into the sink.
    async fn get_all(
        &self,
        all: &mut AllInfo,
    ) -> Result<(), BackingError>;

    /// Reacts to one change event: fetches the current value of the
    /// changed entity and applies it to the sink, or marks it removed if
    /// it is no longer present in the store.
    async fn changed(
        &self,
        all: &mut AllInfo,
        change: Change,
    ) -> Result<(), BackingError>;

    /// Begins streaming change events to the given channel. Called at most
    /// once, by the dispatch loop.
    fn watch(
        &self,
        changes: mpsc::Sender<Change>,
    );

    /// Stops streaming change events.
    fn unwatch(&self);

    /// Derives the canonical identity for an entity payload.
    fn id_for_info(
        &self,
        info: &EntityInfo,
    ) -> EntityId;
}
