//! Per-site cache of which groups grant each capability.
//!
//! For a site the cache keeps, per capability, the backing capability entity
//! id followed by the ids of groups it lists as members. An empty list means
//! "not resolved yet"; a site without an entry has never been touched. Lists
//! are filled lazily under the write lock and cleared by the invalidation
//! listener when the backing entity's membership changes.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::{debug, error, info};

use super::operation::Capability;
use crate::dbinterface::Database;
use crate::dbtype::{EntityField, EntityId, EntityType, SiteId};
use crate::events::{Event, EventBus, EventListener, SubscriptionId, SubscriptionParams};

type CapabilityLists = Vec<Vec<EntityId>>;

pub struct CapabilityCache {
    db: Arc<Database>,
    sites: RwLock<HashMap<SiteId, CapabilityLists>>,
}

impl CapabilityCache {
    pub fn new(db: Arc<Database>) -> Self { Self { db, sites: RwLock::new(HashMap::new()) } }

    /// Backing entity id followed by member group ids; empty when the
    /// capability is unusable in `site`.
    pub fn groups_for(&self, site: SiteId, capability: Capability) -> Vec<EntityId> {
        let idx = capability.index();
        {
            let sites = self.sites.read();
            if let Some(lists) = sites.get(&site) {
                if !lists[idx].is_empty() { return lists[idx].clone(); }
            }
        }
        let mut sites = self.sites.write();
        let lists = sites.entry(site).or_insert_with(|| vec![Vec::new(); Capability::COUNT]);
        // Another thread may have filled it between the two locks.
        if lists[idx].is_empty() {
            lists[idx] = self.resolve(site, capability);
        }
        lists[idx].clone()
    }

    fn resolve(&self, site: SiteId, capability: Capability) -> Vec<EntityId> {
        let found = self.db.find_by_name(site, Some(EntityType::Capability), capability.entity_name(), true);
        let cap_id = match found.as_slice() {
            [one] => *one,
            [] => {
                error!(target: "mudsec::security", "fatal: capability entity {} missing in site {}", capability.entity_name(), site);
                return Vec::new();
            }
            many => {
                error!(target: "mudsec::security", "fatal: {} capability entities named {} in site {}", many.len(), capability.entity_name(), site);
                return Vec::new();
            }
        };
        let members: Vec<EntityId> = {
            let cap = self.db.get(&cap_id);
            let Some(token) = cap.read() else { return Vec::new(); };
            token.group().map(|g| g.enabled_members().copied().collect()).unwrap_or_default()
        };
        let mut out = vec![cap_id];
        out.extend(members.into_iter().filter(|m| self.db.get(m).entity_type().map(|t| t.is_group()).unwrap_or(false)));
        debug!(target: "mudsec::security", "resolved {} in site {}: {:?}", capability, site, out);
        out
    }

    /// Forget every list backed by capability entity `id`.
    pub fn invalidate_entity(&self, id: &EntityId) -> usize {
        let mut sites = self.sites.write();
        let Some(lists) = sites.get_mut(&id.site()) else { return 0; };
        let mut cleared = 0;
        for list in lists.iter_mut().filter(|l| l.first() == Some(id)) {
            list.clear();
            cleared += 1;
        }
        if cleared > 0 { debug!(target: "mudsec::security", "invalidated {} capability list(s) backed by {}", cleared, id); }
        cleared
    }

    pub fn invalidate_site(&self, site: SiteId) -> bool {
        let removed = self.sites.write().remove(&site).is_some();
        if removed { debug!(target: "mudsec::security", "dropped capability cache for deleted site {}", site); }
        removed
    }

    pub fn is_site_initialized(&self, site: SiteId) -> bool { self.sites.read().contains_key(&site) }

    /// Cached list without resolving; empty when not cached.
    pub fn cached(&self, site: SiteId, capability: Capability) -> Vec<EntityId> {
        self.sites.read().get(&site).map(|l| l[capability.index()].clone()).unwrap_or_default()
    }
}

/// Keeps a [`CapabilityCache`] coherent with capability entity edits and
/// site deletions. Resubscribes if the bus drops one of its subscriptions.
pub struct CapabilityInvalidator {
    cache: Arc<CapabilityCache>,
    bus: Weak<EventBus>,
    this: Weak<CapabilityInvalidator>,
    subscriptions: Mutex<HashMap<SubscriptionId, SubscriptionParams>>,
}

impl CapabilityInvalidator {
    pub fn register(cache: Arc<CapabilityCache>, bus: &Arc<EventBus>) -> Arc<Self> {
        let me = Arc::new_cyclic(|this| Self {
            cache,
            bus: Arc::downgrade(bus),
            this: this.clone(),
            subscriptions: Mutex::new(HashMap::new()),
        });
        me.subscribe(Self::membership_params());
        me.subscribe(SubscriptionParams::SiteDeleted);
        info!(target: "mudsec::security", "capability invalidation listener registered");
        me
    }

    fn membership_params() -> SubscriptionParams {
        SubscriptionParams::entity_changed(
            vec![EntityType::Capability],
            vec![EntityField::GroupIds, EntityField::GroupDisabledIds, EntityField::Name],
        )
    }

    fn subscribe(&self, params: SubscriptionParams) {
        let (Some(bus), Some(me)) = (self.bus.upgrade(), self.this.upgrade()) else { return; };
        let id = bus.subscribe(params.clone(), me);
        self.subscriptions.lock().insert(id, params);
    }

    pub fn subscription_ids(&self) -> Vec<SubscriptionId> {
        let mut ids: Vec<SubscriptionId> = self.subscriptions.lock().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn unregister(&self) {
        let ids: Vec<SubscriptionId> = self.subscriptions.lock().drain().map(|(id, _)| id).collect();
        if let Some(bus) = self.bus.upgrade() {
            for id in ids { bus.unsubscribe(id); }
        }
    }
}

impl EventListener for CapabilityInvalidator {
    fn on_event(&self, _id: SubscriptionId, event: &Event) {
        match event {
            Event::EntityChanged(ev) if ev.entity_type == EntityType::Capability => {
                self.cache.invalidate_entity(&ev.entity_id);
            }
            Event::SiteDeleted { site_id } => {
                self.cache.invalidate_site(*site_id);
            }
            _ => {}
        }
    }

    fn on_subscription_removed(&self, id: SubscriptionId) {
        let params = self.subscriptions.lock().remove(&id);
        match params {
            Some(p) => {
                error!(target: "mudsec::security", "capability subscription {} removed by the bus; resubscribing", id);
                self.subscribe(p);
            }
            None => debug!(target: "mudsec::security", "ignoring removal of unknown subscription {}", id),
        }
    }
}
