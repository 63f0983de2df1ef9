//! The revision-stamped entity projection shared by every client watcher.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::ops::Bound;

use crate::Delta;
use crate::EntityId;
use crate::EntityInfo;

/// One record of the projection.
///
/// After removal the latest payload is retained as the tombstone value so
/// clients that saw the entity live can still be told what was removed.
/// `ref_count` tracks how many attached clients observed the entity live
/// and have not yet been told about a later removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EntityEntry {
    pub(crate) info: EntityInfo,
    pub(crate) creation_revno: i64,
    pub(crate) revno: i64,
    pub(crate) removed: bool,
    pub(crate) ref_count: usize,
}

/// In-memory store mapping entity identity to its revision-stamped entry.
///
/// Entries are kept in ascending revno order. Every mutation stamps a fresh
/// revno from a monotonically increasing counter and moves the entry to the
/// tail of that order, so `changes_since` is a single ordered range scan.
#[derive(Debug, Default)]
pub struct AllInfo {
    latest_revno: i64,
    entries: BTreeMap<i64, EntityEntry>,
    index: HashMap<EntityId, i64>,
}

impl AllInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest revno ever assigned; 0 before the first mutation.
    pub fn latest_revno(&self) -> i64 {
        self.latest_revno
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts an entry for an id that must not be present yet.
    pub fn add(
        &mut self,
        id: EntityId,
        info: EntityInfo,
    ) {
        assert!(
            !self.index.contains_key(&id),
            "adding new entry with duplicate id {id}"
        );
        self.latest_revno += 1;
        let revno = self.latest_revno;
        self.entries.insert(
            revno,
            EntityEntry {
                info,
                creation_revno: revno,
                revno,
                removed: false,
                ref_count: 0,
            },
        );
        self.index.insert(id, revno);
    }

    /// Records the latest state of the entity with the given id.
    ///
    /// `Some(info)` inserts or refreshes the entry. `None` records a
    /// removal: an unknown id is ignored, an unreferenced live entry is
    /// deleted outright, and anything else becomes (or stays) a tombstone
    /// with a fresh revno so clients behind the removal still observe it.
    pub fn update(
        &mut self,
        id: EntityId,
        info: Option<EntityInfo>,
    ) {
        match info {
            Some(info) => {
                let Some(&revno) = self.index.get(&id) else {
                    self.add(id, info);
                    return;
                };
                let mut entry = self.entries.remove(&revno).expect("entry index out of sync");
                self.latest_revno += 1;
                entry.revno = self.latest_revno;
                entry.info = info;
                entry.removed = false;
                self.entries.insert(self.latest_revno, entry);
                self.index.insert(id, self.latest_revno);
            }
            None => {
                let Some(&revno) = self.index.get(&id) else {
                    return;
                };
                self.latest_revno += 1;
                let mut entry = self.entries.remove(&revno).expect("entry index out of sync");
                if !entry.removed && entry.ref_count == 0 {
                    // Nobody holds the entry, so there is no tombstone to keep.
                    self.index.remove(&id);
                    return;
                }
                entry.revno = self.latest_revno;
                entry.removed = true;
                self.entries.insert(self.latest_revno, entry);
                self.index.insert(id, self.latest_revno);
            }
        }
    }

    /// Physically removes the entry for the given id, if any. The caller
    /// is responsible for ensuring no client still holds a reference.
    pub(crate) fn delete(
        &mut self,
        id: &EntityId,
    ) {
        let Some(revno) = self.index.remove(id) else {
            return;
        };
        self.entries.remove(&revno);
    }

    pub(crate) fn inc_ref(
        &mut self,
        id: &EntityId,
    ) {
        let entry = self.entry_mut(id).expect("inc_ref of unknown entity");
        entry.ref_count += 1;
    }

    /// Releases one client hold on the entry; a tombstone whose last hold
    /// is released is purged immediately.
    pub(crate) fn dec_ref(
        &mut self,
        id: &EntityId,
    ) {
        let entry = self.entry_mut(id).expect("dec_ref of unknown entity");
        assert!(entry.ref_count > 0, "watcher reference count went below zero");
        entry.ref_count -= 1;
        if entry.removed && entry.ref_count == 0 {
            self.delete(id);
        }
    }

    /// Streams one delta per entry mutated after `revno`, oldest first.
    ///
    /// Tombstones created after `revno` are skipped: a client that never
    /// saw the entity cannot be told of its removal. Passing `-1` yields
    /// the entire projection including retained tombstones.
    pub fn changes_since(
        &self,
        revno: i64,
    ) -> impl Iterator<Item = Delta> + '_ {
        self.entries
            .range((Bound::Excluded(revno), Bound::Unbounded))
            .filter(move |(_, entry)| revno < 0 || !(entry.removed && entry.creation_revno > revno))
            .map(|(_, entry)| Delta {
                removed: entry.removed,
                entity: entry.info.clone(),
            })
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = &EntityEntry> {
        self.entries.values()
    }

    pub(crate) fn lookup(
        &self,
        id: &EntityId,
    ) -> Option<&EntityEntry> {
        self.index.get(id).and_then(|revno| self.entries.get(revno))
    }

    #[cfg(test)]
    pub(crate) fn index_len(&self) -> usize {
        self.index.len()
    }

    fn entry_mut(
        &mut self,
        id: &EntityId,
    ) -> Option<&mut EntityEntry> {
        let revno = *self.index.get(id)?;
        self.entries.get_mut(&revno)
    }
}
