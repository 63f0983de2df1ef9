use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::AllInfo;
use crate::Delta;
use crate::EntityEntry;
use crate::EntityId;
use crate::EntityInfo;

static LOGGER_INIT: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
}

/// Asserts the full contents of the projection: entries in revno order,
/// a coherent index, and the expected latest revno.
pub(crate) fn assert_all_info_contents(
    all: &AllInfo,
    latest_revno: i64,
    expect: &[EntityEntry],
) {
    let got: Vec<EntityEntry> = all.entries().cloned().collect();
    assert_eq!(got, expect);
    for entry in expect {
        let indexed = all
            .lookup(&entry.info.entity_id())
            .expect("entry missing from index");
        assert_eq!(indexed.revno, entry.revno);
    }
    assert_eq!(all.index_len(), expect.len());
    assert_eq!(all.latest_revno(), latest_revno);
}

/// Asserts the structural invariants of the projection: strict revno
/// ordering, creation before mutation, no revno beyond the latest, no
/// unreferenced tombstones, and a bijective index.
pub(crate) fn assert_invariants(all: &AllInfo) {
    let mut prev = i64::MIN;
    for entry in all.entries() {
        assert!(entry.revno > prev, "entries out of revno order");
        prev = entry.revno;
        assert!(entry.creation_revno <= entry.revno);
        assert!(entry.revno <= all.latest_revno());
        assert!(
            !(entry.removed && entry.ref_count == 0),
            "unreferenced tombstone retained"
        );
        let indexed = all
            .lookup(&entry.info.entity_id())
            .expect("entry missing from index");
        assert_eq!(indexed.revno, entry.revno);
    }
    assert_eq!(all.index_len(), all.entries().count());
}

/// Collapses a delta batch into a set keyed by entity identity; removals
/// map to `None`. Panics if an identity is mentioned twice, since a batch
/// carries at most one delta per entity.
pub(crate) fn delta_map(deltas: &[Delta]) -> HashMap<EntityId, Option<EntityInfo>> {
    let mut m = HashMap::new();
    for d in deltas {
        let id = d.entity.entity_id();
        let value = if d.removed { None } else { Some(d.entity.clone()) };
        assert!(
            m.insert(id.clone(), value).is_none(),
            "{id} mentioned twice in delta set"
        );
    }
    m
}
