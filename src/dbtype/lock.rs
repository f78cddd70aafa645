use serde::{Deserialize, Serialize};

use super::entity::Entity;
use super::ids::EntityId;
use super::property::PropertyValue;

/// Lock attached to an action. Evaluated against the entity trying to use it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Lock {
    #[default]
    Unlocked,
    ById { id: EntityId, #[serde(default)] negate: bool },
    ByProperty { application: String, path: String, value: PropertyValue, #[serde(default)] negate: bool },
    ByGroup { group: EntityId, #[serde(default)] negate: bool },
}

impl Lock {
    /// `user` must be read under its reader token by the caller. `is_member`
    /// answers direct membership of (group, member); it is not called for
    /// other lock kinds.
    pub fn evaluate<F>(&self, user: &Entity, is_member: F) -> bool
    where
        F: Fn(&EntityId, &EntityId) -> bool,
    {
        match self {
            Lock::Unlocked => true,
            Lock::ById { id, negate } => (user.id() == *id) != *negate,
            Lock::ByProperty { application, path, value, negate } => {
                let found = user.application(application).and_then(|app| app.properties.get(path.trim_matches('/')));
                (found == Some(value)) != *negate
            }
            Lock::ByGroup { group, negate } => is_member(group, &user.id()) != *negate,
        }
    }

    pub fn is_locked(&self) -> bool { !matches!(self, Lock::Unlocked) }
}
