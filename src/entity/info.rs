//! Observable cluster entities and their identity contract.
//!
//! Every entity the aggregator projects exposes two pure observations: its
//! kind and an identifier unique within that kind. Together they form the
//! globally unique [`EntityId`]. Payloads are opaque to the aggregator core;
//! equality is by value.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::BackingError;

/// Kind tag of an observable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Machine,
    Service,
    Unit,
    Relation,
    Annotation,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Machine => "machine",
            EntityKind::Service => "service",
            EntityKind::Unit => "unit",
            EntityKind::Relation => "relation",
            EntityKind::Annotation => "annotation",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = BackingError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "machine" => Ok(EntityKind::Machine),
            "service" => Ok(EntityKind::Service),
            "unit" => Ok(EntityKind::Unit),
            "relation" => Ok(EntityKind::Relation),
            "annotation" => Ok(EntityKind::Annotation),
            other => Err(BackingError::UnknownKind(other.to_string())),
        }
    }
}

/// Globally unique identity of an entity: `(kind, id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityId {
    pub fn new(
        kind: EntityKind,
        id: impl Into<String>,
    ) -> Self {
        EntityId { kind, id: id.into() }
    }
}

impl fmt::Display for EntityId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}-{}", self.kind, self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineInfo {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "InstanceId", default)]
    pub instance_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Exposed", default)]
    pub exposed: bool,
    #[serde(rename = "CharmURL", default)]
    pub charm_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitInfo {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Service", default)]
    pub service: String,
    #[serde(rename = "Series", default)]
    pub series: String,
    #[serde(rename = "MachineId", default)]
    pub machine_id: String,
    #[serde(rename = "Ports", default)]
    pub ports: Vec<Port>,
}

/// An opened port on a unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    #[serde(rename = "Protocol")]
    pub protocol: String,
    #[serde(rename = "Number")]
    pub number: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationInfo {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Endpoints", default)]
    pub endpoints: Vec<Endpoint>,
}

/// One side of a relation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(rename = "ServiceName")]
    pub service_name: String,
    #[serde(rename = "Name", default)]
    pub relation_name: String,
    #[serde(rename = "Role", default)]
    pub role: String,
    #[serde(rename = "Interface", default)]
    pub interface: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationInfo {
    #[serde(rename = "GlobalKey")]
    pub global_key: String,
    #[serde(rename = "Tag", default)]
    pub tag: String,
    #[serde(rename = "Annotations", default)]
    pub annotations: HashMap<String, String>,
}

/// The concrete payload of an observable entity, self-describing on the
/// wire through its `Kind` tag. The tag dispatch doubles as the kind
/// registry for deserialization; unknown kinds are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "Kind")]
pub enum EntityInfo {
    #[serde(rename = "machine")]
    Machine(MachineInfo),
    #[serde(rename = "service")]
    Service(ServiceInfo),
    #[serde(rename = "unit")]
    Unit(UnitInfo),
    #[serde(rename = "relation")]
    Relation(RelationInfo),
    #[serde(rename = "annotation")]
    Annotation(AnnotationInfo),
}

impl EntityInfo {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityInfo::Machine(_) => EntityKind::Machine,
            EntityInfo::Service(_) => EntityKind::Service,
            EntityInfo::Unit(_) => EntityKind::Unit,
            EntityInfo::Relation(_) => EntityKind::Relation,
            EntityInfo::Annotation(_) => EntityKind::Annotation,
        }
    }

    /// The canonical identity of this payload within the projection.
    pub fn entity_id(&self) -> EntityId {
        let id = match self {
            EntityInfo::Machine(m) => m.id.clone(),
            EntityInfo::Service(s) => s.name.clone(),
            EntityInfo::Unit(u) => u.name.clone(),
            EntityInfo::Relation(r) => r.key.clone(),
            EntityInfo::Annotation(a) => a.global_key.clone(),
        };
        EntityId { kind: self.kind(), id }
    }
}

impl From<MachineInfo> for EntityInfo {
    fn from(info: MachineInfo) -> Self {
        EntityInfo::Machine(info)
    }
}

impl From<ServiceInfo> for EntityInfo {
    fn from(info: ServiceInfo) -> Self {
        EntityInfo::Service(info)
    }
}

impl From<UnitInfo> for EntityInfo {
    fn from(info: UnitInfo) -> Self {
        EntityInfo::Unit(info)
    }
}

impl From<RelationInfo> for EntityInfo {
    fn from(info: RelationInfo) -> Self {
        EntityInfo::Relation(info)
    }
}

impl From<AnnotationInfo> for EntityInfo {
    fn from(info: AnnotationInfo) -> Self {
        EntityInfo::Annotation(info)
    }
}
