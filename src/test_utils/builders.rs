use crate::AllInfo;
use crate::EntityEntry;
use crate::EntityId;
use crate::EntityInfo;
use crate::EntityKind;
use crate::MachineInfo;
use crate::ServiceInfo;
use crate::UnitInfo;

pub(crate) fn machine(id: &str) -> EntityInfo {
    MachineInfo {
        id: id.into(),
        ..Default::default()
    }
    .into()
}

pub(crate) fn machine_with_instance(
    id: &str,
    instance_id: &str,
) -> EntityInfo {
    MachineInfo {
        id: id.into(),
        instance_id: instance_id.into(),
    }
    .into()
}

pub(crate) fn service(
    name: &str,
    exposed: bool,
) -> EntityInfo {
    ServiceInfo {
        name: name.into(),
        exposed,
        ..Default::default()
    }
    .into()
}

pub(crate) fn unit(name: &str) -> EntityInfo {
    UnitInfo {
        name: name.into(),
        ..Default::default()
    }
    .into()
}

pub(crate) fn machine_id(id: &str) -> EntityId {
    EntityId::new(EntityKind::Machine, id)
}

pub(crate) fn live_entry(
    info: EntityInfo,
    creation_revno: i64,
    revno: i64,
    ref_count: usize,
) -> EntityEntry {
    EntityEntry {
        info,
        creation_revno,
        revno,
        removed: false,
        ref_count,
    }
}

pub(crate) fn removed_entry(
    info: EntityInfo,
    creation_revno: i64,
    revno: i64,
    ref_count: usize,
) -> EntityEntry {
    EntityEntry {
        info,
        creation_revno,
        revno,
        removed: true,
        ref_count,
    }
}

pub(crate) fn all_info_add(
    all: &mut AllInfo,
    info: EntityInfo,
) {
    all.add(info.entity_id(), info);
}
