use crate::dbtype::{EntityField, EntityType, SiteId};

use super::event::{ChangeAction, Event};

pub type SubscriptionId = u64;

/// What a subscriber wants delivered. Empty lists match everything. A field
/// filter only narrows updates: creation and deletion touch every field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionParams {
    EntityChanged { entity_types: Vec<EntityType>, fields: Vec<EntityField>, site: Option<SiteId> },
    SiteDeleted,
}

impl SubscriptionParams {
    pub fn entity_changed(entity_types: Vec<EntityType>, fields: Vec<EntityField>) -> Self {
        SubscriptionParams::EntityChanged { entity_types, fields, site: None }
    }

    pub fn matches(&self, event: &Event) -> bool {
        match (self, event) {
            (SubscriptionParams::EntityChanged { entity_types, fields, site }, Event::EntityChanged(ev)) => {
                if let Some(s) = site { if *s != ev.entity_id.site_id { return false; } }
                if !entity_types.is_empty() && !entity_types.contains(&ev.entity_type) { return false; }
                ev.action != ChangeAction::Updated || fields.is_empty() || fields.iter().any(|f| ev.fields.contains(f))
            }
            (SubscriptionParams::SiteDeleted, Event::SiteDeleted { .. }) => true,
            _ => false,
        }
    }

    /// Site this subscription is bound to, if any. Such subscriptions are torn
    /// down when their site is deleted.
    pub fn scoped_site(&self) -> Option<SiteId> {
        match self {
            SubscriptionParams::EntityChanged { site, .. } => *site,
            SubscriptionParams::SiteDeleted => None,
        }
    }
}

/// Receiver side of a subscription. Called on the bus dispatcher thread, never
/// inline with the publisher.
pub trait EventListener: Send + Sync {
    fn on_event(&self, id: SubscriptionId, event: &Event);

    /// The bus removed the subscription without the subscriber asking for it.
    fn on_subscription_removed(&self, _id: SubscriptionId) {}
}
