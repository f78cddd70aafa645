use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::dbtype::{EntityField, EntityId, EntityType, SiteId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Created,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityChangedEvent {
    pub entity_id: EntityId,
    pub entity_type: EntityType,
    pub action: ChangeAction,
    #[serde(default)]
    pub fields: BTreeSet<EntityField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    EntityChanged(EntityChangedEvent),
    SiteDeleted { site_id: SiteId },
}

impl Event {
    pub fn entity_changed(entity_id: EntityId, entity_type: EntityType, action: ChangeAction, fields: BTreeSet<EntityField>) -> Self {
        Event::EntityChanged(EntityChangedEvent { entity_id, entity_type, action, fields })
    }

    pub fn site(&self) -> SiteId {
        match self {
            Event::EntityChanged(e) => e.entity_id.site_id,
            Event::SiteDeleted { site_id } => *site_id,
        }
    }
}
