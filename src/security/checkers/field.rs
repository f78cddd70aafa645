use std::sync::Arc;

use crate::dbinterface::EntityRef;
use crate::dbtype::{BasicFlagHandling, EntityField, SecurityFlag};
use crate::security::checker::SecurityChecker;
use crate::security::context::Context;
use crate::security::helpers::CheckerHelpers;
use crate::security::operation::{CheckResult, Operation};

/// Fields anyone nearby may see when the entity grants BASIC.
fn is_base_field(field: EntityField) -> bool {
    matches!(
        field,
        EntityField::Type
            | EntityField::Owner
            | EntityField::Flags
            | EntityField::Deleted
            | EntityField::ContainedBy
            | EntityField::ActionContainedBy
            | EntityField::ActionTargets
            | EntityField::ActionCommands
            | EntityField::PlayerDisplayName
    )
}

pub struct GetEntityFieldChecker {
    helpers: Arc<CheckerHelpers>,
}

impl GetEntityFieldChecker {
    pub fn new(helpers: Arc<CheckerHelpers>) -> Self { Self { helpers } }
}

impl SecurityChecker for GetEntityFieldChecker {
    fn name(&self) -> &'static str { "get_entity_field" }

    fn check_field(&self, _: Operation, context: &Context, target: &EntityRef, field: EntityField) -> CheckResult {
        let h = &self.helpers;
        let allowed = match field {
            EntityField::Id => true,
            EntityField::Name => h.can_see_name(context, target),
            EntityField::Password => false,
            f if is_base_field(f) => {
                let handling = if h.is_local_to_requester(context, target, true) {
                    BasicFlagHandling::IncludeBasic
                } else {
                    BasicFlagHandling::ExcludeBasic
                };
                h.has_permission_ctx(context, target, SecurityFlag::READ, handling)
            }
            _ => h.has_permission_ctx(context, target, SecurityFlag::READ, BasicFlagHandling::ExcludeBasic),
        };
        CheckResult::from_bool(allowed)
    }
}

pub struct SetEntityFieldChecker {
    helpers: Arc<CheckerHelpers>,
}

impl SetEntityFieldChecker {
    pub fn new(helpers: Arc<CheckerHelpers>) -> Self { Self { helpers } }
}

impl SecurityChecker for SetEntityFieldChecker {
    fn name(&self) -> &'static str { "set_entity_field" }

    fn check_field(&self, _: Operation, context: &Context, target: &EntityRef, field: EntityField) -> CheckResult {
        let h = &self.helpers;
        let allowed = match field {
            EntityField::Id | EntityField::Type | EntityField::Version | EntityField::CreatedTimestamp | EntityField::UpdatedTimestamp => false,
            EntityField::Security | EntityField::Owner => h.is_admin_ctx(context, target),
            _ => h.has_permission_ctx(context, target, SecurityFlag::WRITE, BasicFlagHandling::ExcludeBasic),
        };
        CheckResult::from_bool(allowed)
    }
}

/// Same rule as reading the name field.
pub struct ConvertIdToNameChecker {
    helpers: Arc<CheckerHelpers>,
}

impl ConvertIdToNameChecker {
    pub fn new(helpers: Arc<CheckerHelpers>) -> Self { Self { helpers } }
}

impl SecurityChecker for ConvertIdToNameChecker {
    fn name(&self) -> &'static str { "convert_id_to_name" }

    fn check_target(&self, _: Operation, context: &Context, target: &EntityRef) -> CheckResult {
        CheckResult::from_bool(self.helpers.can_see_name(context, target))
    }
}
