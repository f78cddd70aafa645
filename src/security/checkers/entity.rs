use std::sync::Arc;

use crate::dbinterface::EntityRef;
use crate::dbtype::{BasicFlagHandling, EntityType, SecurityFlag};
use crate::security::checker::SecurityChecker;
use crate::security::context::Context;
use crate::security::helpers::CheckerHelpers;
use crate::security::operation::{Capability, CheckResult, Operation};

/// Who may create what. Characters need CREATE_PLAYER, programs and
/// capabilities are reserved to admins (accepted earlier in the chain), and
/// everything else needs BUILDER.
pub struct CreateEntityChecker;

impl SecurityChecker for CreateEntityChecker {
    fn name(&self) -> &'static str { "create_entity" }

    fn check_entity_type(&self, _: Operation, context: &Context, entity_type: EntityType) -> CheckResult {
        match entity_type {
            EntityType::Player | EntityType::Guest => CheckResult::from_bool(context.has_capability(Capability::CreatePlayer)),
            EntityType::Capability | EntityType::Program => CheckResult::Deny,
            _ => CheckResult::from_bool(context.has_capability(Capability::Builder)),
        }
    }
}

/// Deleting needs BUILDER and admin standing on the entity.
pub struct DeleteEntityChecker {
    helpers: Arc<CheckerHelpers>,
}

impl DeleteEntityChecker {
    pub fn new(helpers: Arc<CheckerHelpers>) -> Self { Self { helpers } }
}

impl SecurityChecker for DeleteEntityChecker {
    fn name(&self) -> &'static str { "delete_entity" }

    fn check_target(&self, _: Operation, context: &Context, target: &EntityRef) -> CheckResult {
        CheckResult::from_bool(context.has_capability(Capability::Builder) && self.helpers.is_admin_ctx(context, target))
    }
}

/// Listing contents: nearby containers, or explicit read permission.
pub struct GetContainsChecker {
    helpers: Arc<CheckerHelpers>,
}

impl GetContainsChecker {
    pub fn new(helpers: Arc<CheckerHelpers>) -> Self { Self { helpers } }
}

impl SecurityChecker for GetContainsChecker {
    fn name(&self) -> &'static str { "get_contains" }

    fn check_target(&self, _: Operation, context: &Context, target: &EntityRef) -> CheckResult {
        let allowed = self.helpers.is_local_to_requester(context, target, true)
            || self.helpers.has_permission_ctx(context, target, SecurityFlag::READ, BasicFlagHandling::ExcludeBasic);
        CheckResult::from_bool(allowed)
    }
}
