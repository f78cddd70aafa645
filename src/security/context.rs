//! Per-request security context.
//!
//! Carries who is asking (requester), what is running on their behalf
//! (program), the capabilities resolved for them and a small ring buffer of
//! recent decisions. One context per evaluation scope; never shared between
//! requesters or threads.

use std::collections::BTreeSet;

use super::operation::{Capability, CheckResult, Operation};
use crate::dbtype::{EntityField, EntityId, EntityType};

pub type ProcessId = u64;

/// Number of decisions remembered by a context.
pub const CONTEXT_CACHE_SIZE: usize = 64;

/// Discriminator for a cached decision: the operation plus whatever arguments
/// the check was made with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Global(Operation),
    EntityType(Operation, EntityType),
    Target(Operation, EntityId),
    Application(Operation, EntityId, String),
    Field(Operation, EntityId, EntityField),
    Source(Operation, EntityId, EntityId),
}

/// Fixed-capacity cache; once full, the oldest slot is overwritten
/// (round-robin, not LRU).
#[derive(Debug, Default)]
struct ResultCache {
    slots: Vec<(CacheKey, CheckResult)>,
    next: usize,
}

impl ResultCache {
    fn lookup(&self, key: &CacheKey) -> Option<CheckResult> {
        self.slots.iter().find(|(k, _)| k == key).map(|(_, r)| *r)
    }

    fn store(&mut self, key: CacheKey, result: CheckResult) {
        if let Some(slot) = self.slots.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = result;
            return;
        }
        if self.slots.len() < CONTEXT_CACHE_SIZE {
            self.slots.push((key, result));
        } else {
            self.slots[self.next] = (key, result);
        }
        self.next = (self.next + 1) % CONTEXT_CACHE_SIZE;
    }

    fn clear(&mut self) {
        self.slots.clear();
        self.next = 0;
    }
}

#[derive(Debug)]
pub struct Context {
    requester: EntityId,
    program: EntityId,
    pid: Option<ProcessId>,
    run_as_requester: bool,
    capabilities_populated: bool,
    admin: bool,
    capabilities: BTreeSet<Capability>,
    cache: ResultCache,
}

impl Context {
    /// Context for `program` acting on behalf of `requester`. Pass the default
    /// id as `program` for native (non-scripted) requests.
    pub fn new(requester: EntityId, program: EntityId, run_as_requester: bool) -> Self {
        Self {
            requester,
            program,
            pid: None,
            run_as_requester,
            capabilities_populated: false,
            admin: false,
            capabilities: BTreeSet::new(),
            cache: ResultCache::default(),
        }
    }

    /// Native request by the requester itself.
    pub fn for_requester(requester: EntityId) -> Self { Self::new(requester, EntityId::default(), true) }

    pub fn with_pid(mut self, pid: ProcessId) -> Self { self.pid = Some(pid); self }

    pub fn requester(&self) -> EntityId { self.requester }
    pub fn program(&self) -> EntityId { self.program }
    pub fn pid(&self) -> Option<ProcessId> { self.pid }
    pub fn run_as_requester(&self) -> bool { self.run_as_requester }

    /// Changing who exercises the privilege invalidates cached decisions.
    pub fn set_run_as_requester(&mut self, run_as: bool) {
        if self.run_as_requester != run_as {
            self.run_as_requester = run_as;
            self.cache.clear();
        }
    }

    pub fn capabilities_populated(&self) -> bool { self.capabilities_populated }
    pub fn is_admin(&self) -> bool { self.admin }
    pub fn has_capability(&self, cap: Capability) -> bool { self.capabilities.contains(&cap) }
    pub fn capabilities(&self) -> impl Iterator<Item = &Capability> + '_ { self.capabilities.iter() }

    /// Drop resolved capabilities and every cached decision; the next check
    /// re-resolves from the capability entities.
    pub fn reset_capabilities(&mut self) {
        self.capabilities.clear();
        self.admin = false;
        self.capabilities_populated = false;
        self.cache.clear();
    }

    pub fn cached_results(&self) -> usize { self.cache.slots.len() }

    pub(crate) fn mark_capabilities_populated(&mut self) { self.capabilities_populated = true; }

    pub(crate) fn add_capability(&mut self, cap: Capability) {
        self.capabilities.insert(cap);
        if cap == Capability::Admin { self.admin = true; }
    }

    pub(crate) fn cache_lookup(&self, key: &CacheKey) -> Option<CheckResult> { self.cache.lookup(key) }

    pub(crate) fn cache_store(&mut self, key: CacheKey, result: CheckResult) { self.cache.store(key, result); }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u64) -> CacheKey { CacheKey::Target(Operation::GetContains, EntityId::new(2, n)) }

    #[test]
    fn ring_buffer_overwrites_oldest() {
        let mut ctx = Context::for_requester(EntityId::new(2, 1));
        for n in 1..=CONTEXT_CACHE_SIZE as u64 { ctx.cache_store(key(n), CheckResult::Accept); }
        assert_eq!(ctx.cached_results(), CONTEXT_CACHE_SIZE);
        ctx.cache_store(key(1000), CheckResult::Deny);
        assert_eq!(ctx.cached_results(), CONTEXT_CACHE_SIZE);
        assert_eq!(ctx.cache_lookup(&key(1)), None);
        assert_eq!(ctx.cache_lookup(&key(2)), Some(CheckResult::Accept));
        assert_eq!(ctx.cache_lookup(&key(1000)), Some(CheckResult::Deny));
        ctx.cache_store(key(1001), CheckResult::Deny);
        assert_eq!(ctx.cache_lookup(&key(2)), None);
    }

    #[test]
    fn discriminators_are_distinct() {
        let mut ctx = Context::for_requester(EntityId::new(2, 1));
        let t = EntityId::new(2, 5);
        ctx.cache_store(CacheKey::Field(Operation::GetEntityField, t, EntityField::Name), CheckResult::Accept);
        assert_eq!(ctx.cache_lookup(&CacheKey::Field(Operation::GetEntityField, t, EntityField::Note)), None);
        assert_eq!(ctx.cache_lookup(&CacheKey::Target(Operation::GetEntityField, t)), None);
        ctx.cache_store(CacheKey::Application(Operation::GetApplicationProperty, t, "mail".into()), CheckResult::Deny);
        assert_eq!(ctx.cache_lookup(&CacheKey::Application(Operation::GetApplicationProperty, t, "bank".into())), None);
    }

    #[test]
    fn reset_clears_capabilities_and_cache() {
        let mut ctx = Context::new(EntityId::new(2, 1), EntityId::new(2, 9), false).with_pid(77);
        ctx.add_capability(Capability::Admin);
        ctx.mark_capabilities_populated();
        ctx.cache_store(key(3), CheckResult::Accept);
        assert!(ctx.is_admin());
        assert_eq!(ctx.pid(), Some(77));
        ctx.reset_capabilities();
        assert!(!ctx.is_admin());
        assert!(!ctx.capabilities_populated());
        assert!(!ctx.has_capability(Capability::Admin));
        assert_eq!(ctx.cached_results(), 0);
    }

    #[test]
    fn changing_run_as_clears_cache() {
        let mut ctx = Context::new(EntityId::new(2, 1), EntityId::new(2, 9), false);
        ctx.cache_store(key(3), CheckResult::Accept);
        ctx.set_run_as_requester(false);
        assert_eq!(ctx.cached_results(), 1);
        ctx.set_run_as_requester(true);
        assert_eq!(ctx.cached_results(), 0);
    }
}
