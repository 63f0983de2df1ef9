//! The delta envelope, the only boundary type clients depend on.

use serde::Deserialize;
use serde::Serialize;

use super::EntityInfo;

/// One observable transition of the projection.
///
/// The serialized field names `Removed` and `Entity` are a wire
/// compatibility contract and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    #[serde(rename = "Removed", default)]
    pub removed: bool,
    #[serde(rename = "Entity")]
    pub entity: EntityInfo,
}

impl Delta {
    /// A delta reporting the latest live value of an entity.
    pub fn new(entity: impl Into<EntityInfo>) -> Self {
        Delta {
            removed: false,
            entity: entity.into(),
        }
    }

    /// A delta reporting the removal of an entity. The payload carries the
    /// last value seen before removal.
    pub fn removed(entity: impl Into<EntityInfo>) -> Self {
        Delta {
            removed: true,
            entity: entity.into(),
        }
    }
}
