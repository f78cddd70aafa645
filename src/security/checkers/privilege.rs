use std::sync::Arc;
use tracing::error;

use crate::dbinterface::EntityRef;
use crate::security::checker::SecurityChecker;
use crate::security::context::Context;
use crate::security::helpers::CheckerHelpers;
use crate::security::operation::{Capability, CheckResult, Operation};

/// Accepts exactly when the context holds one capability. Answers both the
/// context-only and the target shapes.
pub struct CapabilityChecker {
    name: &'static str,
    capability: Capability,
}

impl CapabilityChecker {
    pub const fn new(name: &'static str, capability: Capability) -> Self { Self { name, capability } }

    pub const fn send_text_room_unrestricted() -> Self { Self::new("send_text_room_unrestricted", Capability::SendTextRoomUnrestricted) }
    pub const fn send_text_entity() -> Self { Self::new("send_text_entity", Capability::SendTextEntity) }
    pub const fn character_online() -> Self { Self::new("character_online", Capability::CharacterOnline) }
    pub const fn find_character_by_name() -> Self { Self::new("find_character_by_name", Capability::FindByNameAfar) }
    pub const fn run_as_requester() -> Self { Self::new("run_as_requester", Capability::RunAsUser) }

    pub fn capability(&self) -> Capability { self.capability }
}

impl SecurityChecker for CapabilityChecker {
    fn name(&self) -> &'static str { self.name }

    fn check(&self, _: Operation, context: &Context) -> CheckResult {
        CheckResult::from_bool(context.has_capability(self.capability))
    }

    fn check_target(&self, op: Operation, context: &Context, _: &EntityRef) -> CheckResult { self.check(op, context) }
}

/// Talking to a room: allowed in the room you stand in, anywhere with
/// SEND_TEXT_ROOM_UNRESTRICTED.
pub struct SendTextRoomChecker {
    helpers: Arc<CheckerHelpers>,
}

impl SendTextRoomChecker {
    pub fn new(helpers: Arc<CheckerHelpers>) -> Self { Self { helpers } }
}

impl SecurityChecker for SendTextRoomChecker {
    fn name(&self) -> &'static str { "send_text_room" }

    fn check_target(&self, op: Operation, context: &Context, target: &EntityRef) -> CheckResult {
        if !target.entity_type().map(|t| t.is_room_like()).unwrap_or(false) {
            error!(target: "mudsec::security", "{} on {} which is not a room", op, target.id());
            return CheckResult::Skip;
        }
        let here = self.helpers.container_of(&context.requester()) == target.id();
        CheckResult::from_bool(here || context.has_capability(Capability::SendTextRoomUnrestricted))
    }
}
