use std::sync::Arc;
use tracing::error;

use crate::dbinterface::EntityRef;
use crate::dbtype::{BasicFlagHandling, SecurityFlag};
use crate::security::checker::SecurityChecker;
use crate::security::context::Context;
use crate::security::helpers::CheckerHelpers;
use crate::security::operation::{CheckResult, Operation};

/// Moving `source` into `target`.
///
/// Between a room-like and a non-room entity the requester may act when both
/// ends are near them; otherwise (and for room-to-room or thing-to-thing
/// moves) admin standing on both ends is required.
pub struct TransferEntityChecker {
    helpers: Arc<CheckerHelpers>,
}

impl TransferEntityChecker {
    pub fn new(helpers: Arc<CheckerHelpers>) -> Self { Self { helpers } }
}

impl SecurityChecker for TransferEntityChecker {
    fn name(&self) -> &'static str { "transfer_entity" }

    fn check_source(&self, _: Operation, context: &Context, target: &EntityRef, source: &EntityRef) -> CheckResult {
        let (Some(dest_type), Some(moving_type)) = (target.entity_type(), source.entity_type()) else { return CheckResult::Deny; };
        let h = &self.helpers;
        let admin_both = || h.is_admin_ctx(context, source) && h.is_admin_ctx(context, target);

        if dest_type.is_room_like() != moving_type.is_room_like() {
            let requester = h.db().get(&context.requester());
            let co_located = h.is_entity_local(&requester, source, true) && h.is_entity_local(&requester, target, true);
            return CheckResult::from_bool(co_located || admin_both());
        }
        CheckResult::from_bool(admin_both())
    }
}

/// Using an action: the user needs read (or BASIC) permission on the action
/// and must satisfy its lock.
pub struct UseActionChecker {
    helpers: Arc<CheckerHelpers>,
}

impl UseActionChecker {
    pub fn new(helpers: Arc<CheckerHelpers>) -> Self { Self { helpers } }
}

impl SecurityChecker for UseActionChecker {
    fn name(&self) -> &'static str { "use_action" }

    fn check_target(&self, op: Operation, context: &Context, target: &EntityRef) -> CheckResult {
        if !target.entity_type().map(|t| t.is_action()).unwrap_or(false) {
            error!(target: "mudsec::security", "{} on {} which is not an action", op, target.id());
            return CheckResult::Skip;
        }
        let (owner, security, lock) = {
            let Some(token) = target.read() else { return CheckResult::Deny; };
            let lock = token.action().map(|a| a.lock.clone()).unwrap_or_default();
            (token.owner(), token.security().clone(), lock)
        };

        let user_id = context.requester();
        if !self.helpers.has_permission(&owner, &security, SecurityFlag::READ, &user_id, None, BasicFlagHandling::IncludeBasic) {
            return CheckResult::Deny;
        }
        if !lock.is_locked() { return CheckResult::Accept; }

        let user = self.helpers.db().get(&user_id);
        let Some(user_token) = user.read() else { return CheckResult::Deny; };
        let unlocked = lock.evaluate(&user_token, |group, member| group != &user_id && self.helpers.is_group_member(group, member));
        CheckResult::from_bool(unlocked)
    }
}
