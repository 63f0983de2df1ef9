use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::AllInfo;
use crate::Backing;
use crate::BackingError;
use crate::Change;
use crate::EntityId;
use crate::EntityInfo;

/// In-memory implementation of [`Backing`] driven directly by tests, with
/// injectable fetch errors. Collection names are the entity kind tags.
#[derive(Clone, Default)]
pub struct TestBacking {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    entities: HashMap<EntityId, EntityInfo>,
    fetch_err: Option<BackingError>,
    watch_tx: Option<mpsc::Sender<Change>>,
}

impl TestBacking {
    pub fn new(initial: Vec<EntityInfo>) -> Self {
        let backing = TestBacking::default();
        {
            let mut inner = backing.inner.lock();
            for info in initial {
                inner.entities.insert(info.entity_id(), info);
            }
        }
        backing
    }

    /// Upserts an entity and emits the matching change event if watched.
    pub fn update_entity(&self, info: impl Into<EntityInfo>) {
        let info = info.into();
        let id = info.entity_id();
        let mut inner = self.inner.lock();
        inner.entities.insert(id.clone(), info);
        notify(&inner, &id);
    }

    /// Deletes an entity and emits the matching change event if watched.
    pub fn delete_entity(&self, id: &EntityId) {
        let mut inner = self.inner.lock();
        inner.entities.remove(id);
        notify(&inner, id);
    }

    /// Makes every subsequent fetch fail with the given error.
    pub fn set_fetch_error(&self, err: BackingError) {
        self.inner.lock().fetch_err = Some(err);
    }

    fn fetch(&self, id: &EntityId) -> Result<Option<EntityInfo>, BackingError> {
        let inner = self.inner.lock();
        if let Some(err) = &inner.fetch_err {
            return Err(err.clone());
        }
        Ok(inner.entities.get(id).cloned())
    }
}

fn notify(
    inner: &Inner,
    id: &EntityId,
) {
    if let Some(tx) = &inner.watch_tx {
        tx.try_send(Change::new(id.kind.as_str(), id.id.clone()))
            .expect("change buffer overflowed");
    }
}

#[async_trait]
impl Backing for TestBacking {
    async fn get_all(
        &self,
        all: &mut AllInfo,
    ) -> Result<(), BackingError> {
        let entities: Vec<(EntityId, EntityInfo)> = {
            let inner = self.inner.lock();
            inner
                .entities
                .iter()
                .map(|(id, info)| (id.clone(), info.clone()))
                .collect()
        };
        for (id, info) in entities {
            all.update(id, Some(info));
        }
        Ok(())
    }

    async fn changed(
        &self,
        all: &mut AllInfo,
        change: Change,
    ) -> Result<(), BackingError> {
        let kind = change.collection.parse()?;
        let id = EntityId::new(kind, change.id);
        match self.fetch(&id)? {
            Some(info) => all.update(id, Some(info)),
            None => all.update(id, None),
        }
        Ok(())
    }

    fn watch(
        &self,
        changes: mpsc::Sender<Change>,
    ) {
        let mut inner = self.inner.lock();
        assert!(inner.watch_tx.is_none(), "test backing can only watch once");
        inner.watch_tx = Some(changes);
    }

    fn unwatch(&self) {
        self.inner.lock().watch_tx = None;
    }

    fn id_for_info(
        &self,
        info: &EntityInfo,
    ) -> EntityId {
        info.entity_id()
    }
}
