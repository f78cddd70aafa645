//! Reference-counted entity handles and scoped lock tokens.
//!
//! An `EntityRef` keeps the underlying entity alive for as long as it is held,
//! even if the database drops it in the meantime. Each clone/drop performs an
//! explicit acquire/release on the entity's handle counter so the database can
//! tell which entities are in use.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::trace;

use crate::dbtype::{Entity, EntityId, EntityType};
use crate::events::{ChangeAction, Event, EventBus};

pub(crate) struct EntityCell {
    id: EntityId,
    entity_type: EntityType,
    data: RwLock<Entity>,
    handles: AtomicUsize,
    events: Option<Arc<EventBus>>,
}

impl EntityCell {
    pub(crate) fn new(entity: Entity, events: Option<Arc<EventBus>>) -> Arc<Self> {
        Arc::new(Self { id: entity.id(), entity_type: entity.entity_type(), data: RwLock::new(entity), handles: AtomicUsize::new(0), events })
    }

    pub(crate) fn id(&self) -> EntityId { self.id }

    pub(crate) fn entity_type(&self) -> EntityType { self.entity_type }

    pub(crate) fn events(&self) -> Option<&Arc<EventBus>> { self.events.as_ref() }

    pub(crate) fn handle_count(&self) -> usize { self.handles.load(Ordering::Acquire) }

    fn acquire(&self) { self.handles.fetch_add(1, Ordering::AcqRel); }

    fn release(&self) { self.handles.fetch_sub(1, Ordering::AcqRel); }
}

/// Handle to a stored entity. May be invalid (entity not found).
#[derive(Default)]
pub struct EntityRef {
    cell: Option<Arc<EntityCell>>,
}

impl EntityRef {
    pub fn invalid() -> Self { Self { cell: None } }

    pub(crate) fn from_cell(cell: Arc<EntityCell>) -> Self {
        cell.acquire();
        Self { cell: Some(cell) }
    }

    pub fn valid(&self) -> bool { self.cell.is_some() }

    /// Id of the referenced entity, or the default id when invalid.
    pub fn id(&self) -> EntityId { self.cell.as_ref().map(|c| c.id()).unwrap_or_default() }

    pub fn entity_type(&self) -> Option<EntityType> { self.cell.as_ref().map(|c| c.entity_type()) }

    /// Number of live handles to this entity (including this one).
    pub fn ref_count(&self) -> usize { self.cell.as_ref().map(|c| c.handle_count()).unwrap_or(0) }

    /// Shared access for the lifetime of the token.
    pub fn read(&self) -> Option<ReaderLockToken<'_>> {
        let cell = self.cell.as_ref()?;
        Some(ReaderLockToken { id: cell.id(), guard: cell.data.read() })
    }

    /// Exclusive access. Changes made through the token are published as one
    /// `EntityChanged` event when the token is dropped.
    pub fn write(&self) -> Option<WriterLockToken<'_>> {
        let cell = self.cell.as_ref()?;
        Some(WriterLockToken { id: cell.id(), entity_type: cell.entity_type(), guard: Some(cell.data.write()), events: cell.events() })
    }
}

impl Clone for EntityRef {
    fn clone(&self) -> Self {
        match &self.cell {
            Some(c) => Self::from_cell(c.clone()),
            None => Self::invalid(),
        }
    }
}

impl Drop for EntityRef {
    fn drop(&mut self) {
        if let Some(c) = &self.cell { c.release(); }
    }
}

impl std::fmt::Debug for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.cell {
            Some(c) => write!(f, "EntityRef({} {})", c.id(), c.entity_type()),
            None => f.write_str("EntityRef(invalid)"),
        }
    }
}

pub struct ReaderLockToken<'a> {
    id: EntityId,
    guard: RwLockReadGuard<'a, Entity>,
}

impl ReaderLockToken<'_> {
    /// Entity this token was issued for.
    pub fn entity_id(&self) -> EntityId { self.id }
}

impl Deref for ReaderLockToken<'_> {
    type Target = Entity;
    fn deref(&self) -> &Entity { &self.guard }
}

pub struct WriterLockToken<'a> {
    id: EntityId,
    entity_type: EntityType,
    guard: Option<RwLockWriteGuard<'a, Entity>>,
    events: Option<&'a Arc<EventBus>>,
}

impl WriterLockToken<'_> {
    pub fn entity_id(&self) -> EntityId { self.id }
}

impl Deref for WriterLockToken<'_> {
    type Target = Entity;
    fn deref(&self) -> &Entity {
        match &self.guard {
            Some(g) => g,
            None => unreachable!("writer token used after release"),
        }
    }
}

impl DerefMut for WriterLockToken<'_> {
    fn deref_mut(&mut self) -> &mut Entity {
        match &mut self.guard {
            Some(g) => g,
            None => unreachable!("writer token used after release"),
        }
    }
}

impl Drop for WriterLockToken<'_> {
    fn drop(&mut self) {
        let Some(mut guard) = self.guard.take() else { return; };
        let fields = guard.take_changes();
        // Release the entity before anyone can observe the event.
        drop(guard);
        if fields.is_empty() { return; }
        trace!(target: "mudsec::db", "entity {} changed {:?}", self.id, fields);
        if let Some(bus) = self.events {
            bus.publish(Event::entity_changed(self.id, self.entity_type, ChangeAction::Updated, fields));
        }
    }
}
