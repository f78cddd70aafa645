//! The authorization service.
//!
//! `SecurityAccess` owns the per-operation checker chains (fixed at
//! construction), the capability cache and its invalidation listener. Every
//! question goes through one of the `security_check*` entry points, which
//! consult the context's decision cache, resolve capabilities on first use,
//! and fold the chain's votes fail-closed.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, trace};

use super::capability_cache::{CapabilityCache, CapabilityInvalidator};
use super::checker::SecurityChecker;
use super::checkers::{builtin_chain, checker_by_name};
use super::context::{CacheKey, Context};
use super::error::SecurityViolation;
use super::helpers::CheckerHelpers;
use super::operation::{fold_results, Capability, CheckResult, Operation};
use crate::config::SecurityConfig;
use crate::dbinterface::{Database, EntityRef};
use crate::dbtype::{application_name, EntityField, EntityType};

/// Checkers that lead every chain.
const LEADING_CHECKERS: [&str; 2] = ["cross_site", "admin"];

type CheckerTable = HashMap<Operation, Vec<Arc<dyn SecurityChecker>>>;

pub struct SecurityAccess {
    config: SecurityConfig,
    helpers: Arc<CheckerHelpers>,
    checkers: CheckerTable,
    capabilities: Arc<CapabilityCache>,
    invalidator: Option<Arc<CapabilityInvalidator>>,
}

impl SecurityAccess {
    pub fn new(db: Arc<Database>, config: SecurityConfig) -> Self { Self::with_checkers(db, config, Vec::new()) }

    /// Like [`new`](Self::new), with caller-supplied checkers appended to the
    /// chains of the given operations.
    pub fn with_checkers(db: Arc<Database>, config: SecurityConfig, extra: Vec<(Operation, Arc<dyn SecurityChecker>)>) -> Self {
        let helpers = Arc::new(CheckerHelpers::new(db.clone(), &config));
        let mut checkers = populate_security(&config, &helpers);
        for (op, checker) in extra {
            checkers.entry(op).or_default().push(checker);
        }
        let capabilities = Arc::new(CapabilityCache::new(db.clone()));
        let invalidator = match db.events() {
            Some(bus) => Some(CapabilityInvalidator::register(capabilities.clone(), bus)),
            None => {
                debug!(target: "mudsec::security", "database has no event bus; capability cache will not be invalidated");
                None
            }
        };
        Self { config, helpers, checkers, capabilities, invalidator }
    }

    pub fn config(&self) -> &SecurityConfig { &self.config }

    pub fn helpers(&self) -> &Arc<CheckerHelpers> { &self.helpers }

    pub fn capability_cache(&self) -> &CapabilityCache { &self.capabilities }

    pub fn invalidator(&self) -> Option<&Arc<CapabilityInvalidator>> { self.invalidator.as_ref() }

    /// Names of the checkers consulted for `op`, in order.
    pub fn checker_names(&self, op: Operation) -> Vec<&'static str> {
        self.checkers.get(&op).map(|c| c.iter().map(|c| c.name()).collect()).unwrap_or_default()
    }

    /// Stop listening for invalidation events.
    pub fn shutdown(&self) {
        if let Some(inv) = &self.invalidator { inv.unregister(); }
    }

    /// Resolve the context's capabilities once: implicit admins first, then
    /// membership of requester or program in each capability's groups, in
    /// the requester's site and in the global site.
    pub fn populate_context_capabilities(&self, context: &mut Context) {
        if context.capabilities_populated() { return; }
        let requester = context.requester();
        let program = context.program();

        if self.config.is_implicit_admin(&requester) || (program.is_valid() && self.config.is_implicit_admin(&program)) {
            context.add_capability(Capability::Admin);
        }

        let mut sites = vec![requester.site()];
        if self.config.global_site_id != requester.site() { sites.push(self.config.global_site_id); }

        for cap in Capability::ALL {
            if context.has_capability(cap) { continue; }
            let held = sites.iter().any(|site| {
                let groups = self.capabilities.groups_for(*site, cap);
                groups.iter().any(|g| {
                    self.helpers.is_group_member(g, &requester) || (program.is_valid() && self.helpers.is_group_member(g, &program))
                })
            });
            if held { context.add_capability(cap); }
        }
        context.mark_capabilities_populated();
        debug!(target: "mudsec::security", "capabilities for {}: {:?}", requester, context.capabilities().collect::<Vec<_>>());
    }

    fn evaluate<F>(&self, op: Operation, context: &mut Context, key: CacheKey, vote: F) -> CheckResult
    where
        F: Fn(&dyn SecurityChecker, &Context) -> CheckResult,
    {
        if let Some(hit) = context.cache_lookup(&key) {
            trace!(target: "mudsec::security", "cached {:?} for {:?}", hit, key);
            return hit;
        }
        self.populate_context_capabilities(context);
        let chain = self.checkers.get(&op).map(Vec::as_slice).unwrap_or(&[]);
        let verdict = {
            let ctx: &Context = context;
            fold_results(chain.iter().map(|checker| {
                let v = vote(checker.as_ref(), ctx);
                trace!(target: "mudsec::security", "{} voted {:?} on {:?}", checker.name(), v, key);
                v
            }))
        };
        trace!(target: "mudsec::security", "{:?} -> {:?}", key, verdict);
        context.cache_store(key, verdict);
        verdict
    }

    fn finish<F>(verdict: CheckResult, throw_on_denied: bool, violation: F) -> Result<bool, SecurityViolation>
    where
        F: FnOnce() -> SecurityViolation,
    {
        if verdict == CheckResult::Accept { return Ok(true); }
        let v = violation();
        debug!(target: "mudsec::security", "denied: {}", v);
        if throw_on_denied { Err(v) } else { Ok(false) }
    }

    fn violation(op: Operation, context: &Context) -> SecurityViolation {
        SecurityViolation::new(op, context.requester(), context.program())
    }

    /// Operation with no target.
    pub fn security_check(&self, op: Operation, context: &mut Context, throw_on_denied: bool) -> Result<bool, SecurityViolation> {
        let verdict = self.evaluate(op, context, CacheKey::Global(op), |c, ctx| c.check(op, ctx));
        Self::finish(verdict, throw_on_denied, || Self::violation(op, context))
    }

    pub fn security_check_entity_type(&self, op: Operation, context: &mut Context, entity_type: EntityType, throw_on_denied: bool) -> Result<bool, SecurityViolation> {
        let verdict = self.evaluate(op, context, CacheKey::EntityType(op, entity_type), |c, ctx| c.check_entity_type(op, ctx, entity_type));
        Self::finish(verdict, throw_on_denied, || Self::violation(op, context).with_entity_type(entity_type))
    }

    /// An invalid `target` is refused without raising.
    pub fn security_check_target(&self, op: Operation, context: &mut Context, target: &EntityRef, throw_on_denied: bool) -> Result<bool, SecurityViolation> {
        if !target.valid() { return Ok(false); }
        let verdict = self.evaluate(op, context, CacheKey::Target(op, target.id()), |c, ctx| c.check_target(op, ctx, target));
        Self::finish(verdict, throw_on_denied, || Self::violation(op, context).with_target(target.id()))
    }

    /// `application` may be a full property path; only its application name
    /// is used. An empty name is refused without raising.
    pub fn security_check_application(
        &self,
        op: Operation,
        context: &mut Context,
        target: &EntityRef,
        application: &str,
        throw_on_denied: bool,
    ) -> Result<bool, SecurityViolation> {
        if !target.valid() { return Ok(false); }
        let Some(app) = application_name(application) else { return Ok(false); };
        let key = CacheKey::Application(op, target.id(), app.to_string());
        let verdict = self.evaluate(op, context, key, |c, ctx| c.check_application(op, ctx, target, app));
        Self::finish(verdict, throw_on_denied, || Self::violation(op, context).with_target(target.id()).with_application(app))
    }

    pub fn security_check_field(
        &self,
        op: Operation,
        context: &mut Context,
        target: &EntityRef,
        field: EntityField,
        throw_on_denied: bool,
    ) -> Result<bool, SecurityViolation> {
        if !target.valid() { return Ok(false); }
        let verdict = self.evaluate(op, context, CacheKey::Field(op, target.id(), field), |c, ctx| c.check_field(op, ctx, target, field));
        Self::finish(verdict, throw_on_denied, || Self::violation(op, context).with_target(target.id()).with_field(field))
    }

    /// Two-entity check. For transfers `target` is the destination and
    /// `source` the entity being moved.
    pub fn security_check_source(
        &self,
        op: Operation,
        context: &mut Context,
        target: &EntityRef,
        source: &EntityRef,
        throw_on_denied: bool,
    ) -> Result<bool, SecurityViolation> {
        if !target.valid() || !source.valid() { return Ok(false); }
        let key = CacheKey::Source(op, target.id(), source.id());
        let verdict = self.evaluate(op, context, key, |c, ctx| c.check_source(op, ctx, target, source));
        Self::finish(verdict, throw_on_denied, || Self::violation(op, context).with_target(target.id()).with_moved(source.id()))
    }
}

impl Drop for SecurityAccess {
    fn drop(&mut self) { self.shutdown(); }
}

/// Build every operation's chain: site and admin checkers, the operation's
/// own checkers, then any configured extras. Bad configuration entries are
/// logged and skipped.
fn populate_security(config: &SecurityConfig, helpers: &Arc<CheckerHelpers>) -> CheckerTable {
    let mut table: CheckerTable = HashMap::new();
    for op in Operation::ALL {
        let mut chain = Vec::new();
        for name in LEADING_CHECKERS.iter().chain(builtin_chain(op)) {
            match checker_by_name(name, helpers) {
                Some(c) => chain.push(c),
                None => error!(target: "mudsec::security", "fatal: built-in checker '{}' for {} is not registered", name, op),
            }
        }
        table.insert(op, chain);
    }

    for (op_name, names) in &config.extra_checkers {
        let op: Operation = match op_name.parse() {
            Ok(op) => op,
            Err(e) => {
                error!(target: "mudsec::security", "ignoring extra checkers: {}", e);
                continue;
            }
        };
        for name in names {
            match checker_by_name(name, helpers) {
                Some(c) => table.entry(op).or_default().push(c),
                None => error!(target: "mudsec::security", "ignoring unknown checker '{}' configured for {}", name, op),
            }
        }
    }
    info!(target: "mudsec::security", "security checkers registered for {} operations", table.len());
    table
}
