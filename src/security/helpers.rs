//! Shared algorithms used by the checkers: locality, permission evaluation
//! with one level of group resolution, and admin standing.
//!
//! Entity data is copied out of a reader token and the token is released
//! before any further lookup, so no helper ever holds two entity locks.

use std::sync::Arc;
use tracing::warn;

use super::context::Context;
use crate::config::SecurityConfig;
use crate::dbinterface::{Database, EntityRef};
use crate::dbtype::{BasicFlagHandling, EntityId, EntityType, Security, SecurityFlag, SiteId};

/// Minimal view of an entity needed for locality walks.
#[derive(Debug, Clone, Copy)]
struct Placement {
    id: EntityId,
    entity_type: EntityType,
    container: EntityId,
}

/// Owner and security record copied out of an entity or application.
#[derive(Debug, Clone)]
pub struct SecuritySnapshot {
    pub owner: EntityId,
    pub security: Security,
}

pub struct CheckerHelpers {
    db: Arc<Database>,
    global_site: SiteId,
    max_depth: usize,
}

impl CheckerHelpers {
    pub fn new(db: Arc<Database>, config: &SecurityConfig) -> Self {
        Self { db, global_site: config.global_site_id, max_depth: config.max_container_depth }
    }

    pub fn db(&self) -> &Database { &self.db }

    pub fn global_site(&self) -> SiteId { self.global_site }

    fn placement(&self, id: &EntityId) -> Option<Placement> {
        let r = self.db.get(id);
        let token = r.read()?;
        Some(Placement { id: token.id(), entity_type: token.entity_type(), container: token.container() })
    }

    /// Container of `id`, or the default id when unknown.
    pub fn container_of(&self, id: &EntityId) -> EntityId {
        self.placement(id).map(|p| p.container).unwrap_or_default()
    }

    /// Would `source` perceive `target` as nearby?
    ///
    /// True when target is source, source's container, something sharing
    /// source's container, or (with `check_inventory`) something source
    /// carries. Actions are local when attached to source's room, to source,
    /// to something in the room, to something carried, or to a region that
    /// encloses source's room. Regions enclosing source's room are local too.
    pub fn is_entity_local(&self, source: &EntityRef, target: &EntityRef, check_inventory: bool) -> bool {
        if !source.valid() || !target.valid() { return false; }
        self.is_local_ids(&source.id(), &target.id(), check_inventory)
    }

    fn is_local_ids(&self, source: &EntityId, target: &EntityId, check_inventory: bool) -> bool {
        let Some(src) = self.placement(source) else { return false; };
        let Some(tgt) = self.placement(target) else { return false; };
        if src.id == tgt.id { return true; }
        let room = src.container;
        if room.is_valid() && tgt.id == room { return true; }

        if tgt.entity_type.is_action() {
            let attached = tgt.container;
            if !attached.is_valid() { return false; }
            if attached == room || attached == src.id { return true; }
            let Some(holder) = self.placement(&attached) else { return false; };
            if room.is_valid() && holder.container == room { return true; }
            if check_inventory && holder.container == src.id { return true; }
            if holder.entity_type.is_region() { return self.region_encloses(&holder.id, &room); }
            return false;
        }

        if room.is_valid() && tgt.container == room { return true; }
        if check_inventory && tgt.container == src.id { return true; }
        if tgt.entity_type.is_region() { return self.region_encloses(&tgt.id, &room); }
        false
    }

    /// Walks up from `start` through regions looking for `region`.
    fn region_encloses(&self, region: &EntityId, start: &EntityId) -> bool {
        if !start.is_valid() { return false; }
        let mut current = *start;
        for _ in 0..self.max_depth {
            let Some(p) = self.placement(&current) else { return false; };
            let parent = p.container;
            if !parent.is_valid() { return false; }
            if parent == *region { return true; }
            match self.placement(&parent) {
                Some(pp) if pp.entity_type.is_region() => current = parent,
                _ => return false,
            }
        }
        warn!(target: "mudsec::security", "region walk from {} exceeded {} levels; treating as not local", start, self.max_depth);
        false
    }

    /// Like [`is_entity_local`](Self::is_entity_local), but a property-bearing
    /// non-action target is also local when its immediate container is. Only
    /// one level: contents of a nearby box count, the box's own contents do not.
    pub fn is_entity_local_via_inventory(&self, source: &EntityRef, target: &EntityRef, check_inventory: bool) -> bool {
        if self.is_entity_local(source, target, check_inventory) { return true; }
        let Some(tgt) = self.placement(&target.id()) else { return false; };
        if tgt.entity_type.is_action() || !tgt.entity_type.has_properties() || !tgt.container.is_valid() { return false; }
        self.is_local_ids(&source.id(), &tgt.container, check_inventory)
    }

    /// Locality relative to the context's requester.
    pub fn is_local_to_requester(&self, context: &Context, target: &EntityRef, check_inventory: bool) -> bool {
        let requester = self.db.get(&context.requester());
        self.is_entity_local_via_inventory(&requester, target, check_inventory)
    }

    /// Direct membership of `member` in group (or capability) `group`.
    pub fn is_group_member(&self, group: &EntityId, member: &EntityId) -> bool {
        let r = self.db.get(group);
        let Some(token) = r.read() else { return false; };
        token.group().map(|g| g.is_member(member)).unwrap_or(false)
    }

    /// `candidate` is in `ids`, or in a group that is listed in `ids`.
    /// Only one level of groups is resolved.
    fn in_id_list(&self, ids: &[EntityId], candidate: &EntityId) -> bool {
        if ids.contains(candidate) { return true; }
        ids.iter().any(|id| {
            let is_group = self.db.get(id).entity_type().map(|t| t.is_group()).unwrap_or(false);
            is_group && id != candidate && self.is_group_member(id, candidate)
        })
    }

    /// Permission evaluation with group resolution. `second` is OR-ed with
    /// `first`.
    pub fn has_permission(
        &self,
        owner: &EntityId,
        security: &Security,
        wanted: SecurityFlag,
        first: &EntityId,
        second: Option<&EntityId>,
        handling: BasicFlagHandling,
    ) -> bool {
        for cand in std::iter::once(first).chain(second) {
            if !cand.is_valid() { continue; }
            if cand == owner || self.in_id_list(security.admin_ids(), cand) { return true; }
            if security.list_grants(wanted, handling) && self.in_id_list(security.list_ids(), cand) { return true; }
        }
        security.other_grants(wanted, handling)
    }

    /// Owner or admin-list standing with group resolution.
    pub fn is_admin(&self, owner: &EntityId, security: &Security, first: &EntityId, second: Option<&EntityId>) -> bool {
        std::iter::once(first)
            .chain(second)
            .any(|c| c.is_valid() && (c == owner || self.in_id_list(security.admin_ids(), c)))
    }

    /// Ids whose rights apply for this context: the program when there is
    /// one (plus the requester when running as requester), else the
    /// requester alone.
    pub fn candidates(context: &Context) -> (EntityId, Option<EntityId>) {
        if context.program().is_valid() {
            let second = context.run_as_requester().then(|| context.requester());
            (context.program(), second)
        } else {
            (context.requester(), None)
        }
    }

    pub fn entity_security(&self, target: &EntityRef) -> Option<SecuritySnapshot> {
        let token = target.read()?;
        Some(SecuritySnapshot { owner: token.owner(), security: token.security().clone() })
    }

    /// Security of `application` on `target`; `None` when either is missing.
    pub fn application_security(&self, target: &EntityRef, application: &str) -> Option<SecuritySnapshot> {
        let token = target.read()?;
        let app = token.application(application)?;
        Some(SecuritySnapshot { owner: app.owner, security: app.security.clone() })
    }

    pub fn snapshot_permits(&self, context: &Context, snap: &SecuritySnapshot, wanted: SecurityFlag, handling: BasicFlagHandling) -> bool {
        let (first, second) = Self::candidates(context);
        self.has_permission(&snap.owner, &snap.security, wanted, &first, second.as_ref(), handling)
    }

    pub fn snapshot_admin(&self, context: &Context, snap: &SecuritySnapshot) -> bool {
        let (first, second) = Self::candidates(context);
        self.is_admin(&snap.owner, &snap.security, &first, second.as_ref())
    }

    /// Entity-level permission for the context's candidates.
    pub fn has_permission_ctx(&self, context: &Context, target: &EntityRef, wanted: SecurityFlag, handling: BasicFlagHandling) -> bool {
        self.entity_security(target).map(|s| self.snapshot_permits(context, &s, wanted, handling)).unwrap_or(false)
    }

    pub fn is_admin_ctx(&self, context: &Context, target: &EntityRef) -> bool {
        self.entity_security(target).map(|s| self.snapshot_admin(context, &s)).unwrap_or(false)
    }

    /// Whether the context may learn `target`'s name.
    pub fn can_see_name(&self, context: &Context, target: &EntityRef) -> bool {
        use super::operation::Capability;

        if context.has_capability(Capability::AnyIdToName) { return true; }
        let Some(snap) = self.entity_security(target) else { return false; };
        if context.run_as_requester() && self.is_admin(&snap.owner, &snap.security, &context.requester(), None) {
            return true;
        }
        if self.is_local_to_requester(context, target, true) { return true; }
        self.snapshot_permits(context, &snap, SecurityFlag::READ, BasicFlagHandling::ExcludeBasic)
    }
}
