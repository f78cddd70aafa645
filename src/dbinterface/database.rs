//! In-memory entity database.
//!
//! Stores entities per site behind one map lock; each entity carries its own
//! reader/writer lock. The map lock is never held while an entity lock is
//! taken, so callers may freely hold entity tokens while calling back in.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};
use unicode_normalization::UnicodeNormalization;

use super::entity_ref::{EntityCell, EntityRef};
use crate::dbtype::{Entity, EntityId, EntityType, SiteId};
use crate::error::{AppError, AppResult};
use crate::events::{ChangeAction, Event, EventBus};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteRecord {
    pub id: SiteId,
    pub name: String,
    #[serde(default)]
    pub next_entity: u64,
}

/// Serialized form of a whole world, used for fixtures and the audit tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldSnapshot {
    #[serde(default)]
    pub sites: Vec<SiteRecord>,
    #[serde(default)]
    pub entities: Vec<Entity>,
}

pub struct Database {
    entities: RwLock<HashMap<EntityId, Arc<EntityCell>>>,
    sites: RwLock<BTreeMap<SiteId, SiteRecord>>,
    events: Option<Arc<EventBus>>,
}

impl Default for Database {
    fn default() -> Self { Self::new() }
}

fn normalize_name(s: &str) -> String { s.trim().nfc().collect::<String>().to_lowercase() }

impl Database {
    pub fn new() -> Self {
        Self { entities: RwLock::new(HashMap::new()), sites: RwLock::new(BTreeMap::new()), events: None }
    }

    /// Database whose writes and deletions are published on `bus`.
    pub fn with_events(bus: Arc<EventBus>) -> Self {
        Self { events: Some(bus), ..Self::new() }
    }

    pub fn events(&self) -> Option<&Arc<EventBus>> { self.events.as_ref() }

    fn publish(&self, event: Event) {
        if let Some(bus) = &self.events { bus.publish(event); }
    }

    // ----- sites -----

    pub fn create_site(&self, name: &str) -> SiteId {
        let mut sites = self.sites.write();
        let id = sites.keys().next_back().copied().unwrap_or(0) + 1;
        sites.insert(id, SiteRecord { id, name: name.to_string(), next_entity: 1 });
        info!(target: "mudsec::db", "created site {} '{}'", id, name);
        id
    }

    /// Register a site under a fixed id. Returns false if it already exists.
    pub fn create_site_with_id(&self, id: SiteId, name: &str) -> bool {
        if id == 0 { return false; }
        let mut sites = self.sites.write();
        if sites.contains_key(&id) { return false; }
        sites.insert(id, SiteRecord { id, name: name.to_string(), next_entity: 1 });
        true
    }

    pub fn site_exists(&self, id: SiteId) -> bool { self.sites.read().contains_key(&id) }

    pub fn site_ids(&self) -> Vec<SiteId> { self.sites.read().keys().copied().collect() }

    /// Drop a site and every entity in it, then announce the deletion.
    pub fn delete_site(&self, id: SiteId) -> bool {
        if self.sites.write().remove(&id).is_none() { return false; }
        let removed = {
            let mut map = self.entities.write();
            let before = map.len();
            map.retain(|eid, _| eid.site_id != id);
            before - map.len()
        };
        info!(target: "mudsec::db", "deleted site {} ({} entities)", id, removed);
        self.publish(Event::SiteDeleted { site_id: id });
        true
    }

    // ----- entities -----

    fn allocate_id(&self, site: SiteId) -> AppResult<EntityId> {
        let mut sites = self.sites.write();
        let rec = sites.get_mut(&site).ok_or_else(|| AppError::not_found("site_not_found".to_string(), format!("site {} does not exist", site)))?;
        let n = rec.next_entity.max(1);
        rec.next_entity = n + 1;
        Ok(EntityId::new(site, n))
    }

    pub fn create_entity(&self, site: SiteId, entity_type: EntityType, name: &str, owner: EntityId) -> AppResult<EntityRef> {
        let id = self.allocate_id(site)?;
        self.insert_entity(Entity::new(id, entity_type, name, owner))
    }

    /// Store a fully built entity under its own id. The site must exist and the
    /// id must be free.
    pub fn insert_entity(&self, mut entity: Entity) -> AppResult<EntityRef> {
        let id = entity.id();
        if !id.is_valid() { return Err(AppError::user("invalid_entity_id".to_string(), format!("cannot store entity with id {}", id))); }
        {
            let mut sites = self.sites.write();
            let rec = sites.get_mut(&id.site_id).ok_or_else(|| AppError::not_found("site_not_found".to_string(), format!("site {} does not exist", id.site_id)))?;
            if rec.next_entity <= id.entity_id { rec.next_entity = id.entity_id + 1; }
        }
        entity.take_changes();
        let entity_type = entity.entity_type();
        let cell = EntityCell::new(entity, self.events.clone());
        {
            let mut map = self.entities.write();
            if map.contains_key(&id) { return Err(AppError::conflict("entity_exists".to_string(), format!("entity {} already exists", id))); }
            map.insert(id, cell.clone());
        }
        debug!(target: "mudsec::db", "stored {} {}", entity_type, id);
        self.publish(Event::entity_changed(id, entity_type, ChangeAction::Created, Default::default()));
        Ok(EntityRef::from_cell(cell))
    }

    pub fn delete_entity(&self, id: &EntityId) -> bool {
        let removed = self.entities.write().remove(id);
        match removed {
            Some(cell) => {
                if cell.handle_count() > 0 { debug!(target: "mudsec::db", "deleting {} while {} handle(s) outstanding", id, cell.handle_count()); }
                self.publish(Event::entity_changed(*id, cell.entity_type(), ChangeAction::Deleted, Default::default()));
                true
            }
            None => false,
        }
    }

    /// Handle for `id`; invalid if no such entity.
    pub fn get(&self, id: &EntityId) -> EntityRef {
        if !id.is_valid() { return EntityRef::invalid(); }
        let cell = self.entities.read().get(id).cloned();
        match cell { Some(c) => EntityRef::from_cell(c), None => EntityRef::invalid() }
    }

    pub fn entity_count(&self) -> usize { self.entities.read().len() }

    /// Entities in `site` whose name matches. `exact` compares whole names,
    /// otherwise a prefix match is used. Comparison is NFC + case-insensitive.
    pub fn find_by_name(&self, site: SiteId, entity_type: Option<EntityType>, name: &str, exact: bool) -> Vec<EntityId> {
        let wanted = normalize_name(name);
        if wanted.is_empty() { return Vec::new(); }
        let mut out: Vec<EntityId> = self.site_cells(site).into_iter()
            .filter(|c| entity_type.map(|t| t == c.entity_type()).unwrap_or(true))
            .filter_map(|c| {
                let eref = EntityRef::from_cell(c);
                let token = eref.read()?;
                let have = normalize_name(token.name());
                let hit = if exact { have == wanted } else { have.starts_with(&wanted) };
                (hit && !token.is_deleted()).then(|| token.entity_id())
            })
            .collect();
        out.sort();
        out
    }

    /// Entities whose container is `container`, in id order.
    pub fn entities_in(&self, container: &EntityId) -> Vec<EntityId> {
        let mut out: Vec<EntityId> = self.site_cells(container.site_id).into_iter()
            .filter_map(|c| {
                let eref = EntityRef::from_cell(c);
                let token = eref.read()?;
                (token.container() == *container).then(|| token.entity_id())
            })
            .collect();
        out.sort();
        out
    }

    fn site_cells(&self, site: SiteId) -> Vec<Arc<EntityCell>> {
        self.entities.read().iter().filter(|(id, _)| id.site_id == site).map(|(_, c)| c.clone()).collect()
    }

    // ----- snapshots -----

    pub fn snapshot(&self) -> WorldSnapshot {
        let sites: Vec<SiteRecord> = self.sites.read().values().cloned().collect();
        let mut cells: Vec<Arc<EntityCell>> = self.entities.read().values().cloned().collect();
        cells.sort_by_key(|c| c.id());
        let entities = cells.into_iter()
            .filter_map(|c| EntityRef::from_cell(c).read().map(|t| (*t).clone()))
            .collect();
        WorldSnapshot { sites, entities }
    }

    pub fn snapshot_json(&self) -> AppResult<String> { Ok(serde_json::to_string_pretty(&self.snapshot())?) }

    /// Load sites and entities from a snapshot. Entities of unknown sites are
    /// skipped with a warning; duplicate ids are an error.
    pub fn load_snapshot(&self, snapshot: WorldSnapshot) -> AppResult<usize> {
        for s in snapshot.sites.iter() {
            if !self.create_site_with_id(s.id, &s.name) { warn!(target: "mudsec::db", "snapshot site {} already present", s.id); }
        }
        let mut loaded = 0usize;
        for e in snapshot.entities.into_iter() {
            if !self.site_exists(e.id().site_id) {
                warn!(target: "mudsec::db", "snapshot entity {} references unknown site; skipped", e.id());
                continue;
            }
            self.insert_entity(e)?;
            loaded += 1;
        }
        info!(target: "mudsec::db", "loaded {} entities from snapshot", loaded);
        Ok(loaded)
    }

    pub fn load_snapshot_json(&self, text: &str) -> AppResult<usize> {
        let snap: WorldSnapshot = serde_json::from_str(text)?;
        self.load_snapshot(snap)
    }
}
