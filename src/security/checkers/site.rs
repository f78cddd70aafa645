//! Checkers that lead or close every chain: site isolation, admin bypass,
//! and the unconditional accept.

use std::sync::Arc;

use crate::dbinterface::EntityRef;
use crate::dbtype::{EntityField, EntityId, EntityType, SiteId};
use crate::security::checker::SecurityChecker;
use crate::security::context::Context;
use crate::security::helpers::CheckerHelpers;
use crate::security::operation::{CheckResult, Operation};

/// Refuses outright any access to an entity of another site, unless one side
/// lives in the global site. Never accepts on its own.
pub struct CrossSiteChecker {
    helpers: Arc<CheckerHelpers>,
}

impl CrossSiteChecker {
    pub fn new(helpers: Arc<CheckerHelpers>) -> Self { Self { helpers } }

    fn verdict(&self, context: &Context, entities: &[&EntityRef]) -> CheckResult {
        let global = self.helpers.global_site();
        let mut actors = vec![context.requester().site()];
        if context.program().is_valid() { actors.push(context.program().site()); }
        for entity in entities.iter().filter(|e| e.valid()) {
            let site = entity.id().site();
            if actors.iter().any(|a| !Self::same_or_global(*a, site, global)) {
                return CheckResult::DenyAlways;
            }
        }
        CheckResult::Skip
    }

    fn same_or_global(a: SiteId, b: SiteId, global: SiteId) -> bool { a == b || a == global || b == global }
}

impl SecurityChecker for CrossSiteChecker {
    fn name(&self) -> &'static str { "cross_site" }

    fn check_target(&self, _: Operation, context: &Context, target: &EntityRef) -> CheckResult {
        self.verdict(context, &[target])
    }

    fn check_application(&self, _: Operation, context: &Context, target: &EntityRef, _: &str) -> CheckResult {
        self.verdict(context, &[target])
    }

    fn check_field(&self, _: Operation, context: &Context, target: &EntityRef, _: EntityField) -> CheckResult {
        self.verdict(context, &[target])
    }

    fn check_source(&self, _: Operation, context: &Context, target: &EntityRef, source: &EntityRef) -> CheckResult {
        self.verdict(context, &[target, source])
    }
}

/// Admins pass everything, but only within their own site.
pub struct AdminSecurityChecker;

impl AdminSecurityChecker {
    fn on_own_site(context: &Context, ids: &[EntityId]) -> CheckResult {
        let site = context.requester().site();
        if context.is_admin() && ids.iter().all(|id| id.site() == site) { CheckResult::AcceptAlways } else { CheckResult::Skip }
    }
}

impl SecurityChecker for AdminSecurityChecker {
    fn name(&self) -> &'static str { "admin" }

    fn check(&self, _: Operation, context: &Context) -> CheckResult {
        if context.is_admin() { CheckResult::AcceptAlways } else { CheckResult::Skip }
    }

    fn check_entity_type(&self, op: Operation, context: &Context, _: EntityType) -> CheckResult { self.check(op, context) }

    fn check_target(&self, _: Operation, context: &Context, target: &EntityRef) -> CheckResult {
        Self::on_own_site(context, &[target.id()])
    }

    fn check_application(&self, _: Operation, context: &Context, target: &EntityRef, _: &str) -> CheckResult {
        Self::on_own_site(context, &[target.id()])
    }

    fn check_field(&self, _: Operation, context: &Context, target: &EntityRef, _: EntityField) -> CheckResult {
        Self::on_own_site(context, &[target.id()])
    }

    fn check_source(&self, _: Operation, context: &Context, target: &EntityRef, source: &EntityRef) -> CheckResult {
        Self::on_own_site(context, &[target.id(), source.id()])
    }
}

pub struct AcceptAllChecker;

impl SecurityChecker for AcceptAllChecker {
    fn name(&self) -> &'static str { "accept_all" }
    fn check(&self, _: Operation, _: &Context) -> CheckResult { CheckResult::Accept }
    fn check_entity_type(&self, _: Operation, _: &Context, _: EntityType) -> CheckResult { CheckResult::Accept }
    fn check_target(&self, _: Operation, _: &Context, _: &EntityRef) -> CheckResult { CheckResult::Accept }
    fn check_application(&self, _: Operation, _: &Context, _: &EntityRef, _: &str) -> CheckResult { CheckResult::Accept }
    fn check_field(&self, _: Operation, _: &Context, _: &EntityRef, _: EntityField) -> CheckResult { CheckResult::Accept }
    fn check_source(&self, _: Operation, _: &Context, _: &EntityRef, _: &EntityRef) -> CheckResult { CheckResult::Accept }
}
