use std::sync::Arc;

use crate::dbinterface::EntityRef;
use crate::dbtype::{BasicFlagHandling, SecurityFlag};
use crate::security::checker::SecurityChecker;
use crate::security::context::Context;
use crate::security::helpers::CheckerHelpers;
use crate::security::operation::{CheckResult, Operation};

/// Property reads use the application's own owner and security. Nearby
/// entities also honor BASIC; a missing application denies.
pub struct GetApplicationPropertyChecker {
    helpers: Arc<CheckerHelpers>,
}

impl GetApplicationPropertyChecker {
    pub fn new(helpers: Arc<CheckerHelpers>) -> Self { Self { helpers } }
}

impl SecurityChecker for GetApplicationPropertyChecker {
    fn name(&self) -> &'static str { "get_application_property" }

    fn check_application(&self, _: Operation, context: &Context, target: &EntityRef, application: &str) -> CheckResult {
        let Some(snap) = self.helpers.application_security(target, application) else { return CheckResult::Deny; };
        let handling = if self.helpers.is_local_to_requester(context, target, true) {
            BasicFlagHandling::IncludeBasic
        } else {
            BasicFlagHandling::ExcludeBasic
        };
        CheckResult::from_bool(self.helpers.snapshot_permits(context, &snap, SecurityFlag::READ, handling))
    }
}

pub struct SetApplicationPropertyChecker {
    helpers: Arc<CheckerHelpers>,
}

impl SetApplicationPropertyChecker {
    pub fn new(helpers: Arc<CheckerHelpers>) -> Self { Self { helpers } }
}

impl SecurityChecker for SetApplicationPropertyChecker {
    fn name(&self) -> &'static str { "set_application_property" }

    fn check_application(&self, _: Operation, context: &Context, target: &EntityRef, application: &str) -> CheckResult {
        let Some(snap) = self.helpers.application_security(target, application) else { return CheckResult::Deny; };
        CheckResult::from_bool(self.helpers.snapshot_permits(context, &snap, SecurityFlag::WRITE, BasicFlagHandling::ExcludeBasic))
    }
}

/// Admin standing on the application, or on the entity that holds it.
fn application_admin(helpers: &CheckerHelpers, context: &Context, target: &EntityRef, application: &str) -> bool {
    let on_app = helpers.application_security(target, application).map(|s| helpers.snapshot_admin(context, &s)).unwrap_or(false);
    on_app || helpers.is_admin_ctx(context, target)
}

/// Reading or changing an application's security record.
pub struct GetSetApplicationSecurityChecker {
    helpers: Arc<CheckerHelpers>,
}

impl GetSetApplicationSecurityChecker {
    pub fn new(helpers: Arc<CheckerHelpers>) -> Self { Self { helpers } }
}

impl SecurityChecker for GetSetApplicationSecurityChecker {
    fn name(&self) -> &'static str { "get_set_application_security" }

    fn check_application(&self, _: Operation, context: &Context, target: &EntityRef, application: &str) -> CheckResult {
        CheckResult::from_bool(application_admin(&self.helpers, context, target, application))
    }
}

/// Adding an application needs write permission on the entity.
pub struct CreateApplicationChecker {
    helpers: Arc<CheckerHelpers>,
}

impl CreateApplicationChecker {
    pub fn new(helpers: Arc<CheckerHelpers>) -> Self { Self { helpers } }
}

impl SecurityChecker for CreateApplicationChecker {
    fn name(&self) -> &'static str { "create_application" }

    fn check_application(&self, _: Operation, context: &Context, target: &EntityRef, _: &str) -> CheckResult {
        CheckResult::from_bool(self.helpers.has_permission_ctx(context, target, SecurityFlag::WRITE, BasicFlagHandling::ExcludeBasic))
    }
}

pub struct DeleteApplicationChecker {
    helpers: Arc<CheckerHelpers>,
}

impl DeleteApplicationChecker {
    pub fn new(helpers: Arc<CheckerHelpers>) -> Self { Self { helpers } }
}

impl SecurityChecker for DeleteApplicationChecker {
    fn name(&self) -> &'static str { "delete_application" }

    fn check_application(&self, _: Operation, context: &Context, target: &EntityRef, application: &str) -> CheckResult {
        CheckResult::from_bool(application_admin(&self.helpers, context, target, application))
    }
}
