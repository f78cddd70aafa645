//! Concrete checkers and their registry.

mod application;
mod entity;
mod field;
mod movement;
mod privilege;
mod site;

use std::sync::Arc;

pub use application::{
    CreateApplicationChecker, DeleteApplicationChecker, GetApplicationPropertyChecker, GetSetApplicationSecurityChecker,
    SetApplicationPropertyChecker,
};
pub use entity::{CreateEntityChecker, DeleteEntityChecker, GetContainsChecker};
pub use field::{ConvertIdToNameChecker, GetEntityFieldChecker, SetEntityFieldChecker};
pub use movement::{TransferEntityChecker, UseActionChecker};
pub use privilege::{CapabilityChecker, SendTextRoomChecker};
pub use site::{AcceptAllChecker, AdminSecurityChecker, CrossSiteChecker};

use super::checker::SecurityChecker;
use super::helpers::CheckerHelpers;
use super::operation::Operation;

/// Every name accepted by [`checker_by_name`].
pub const CHECKER_NAMES: [&str; 22] = [
    "cross_site", "admin", "accept_all", "create_entity", "delete_entity", "get_contains",
    "get_entity_field", "set_entity_field", "convert_id_to_name", "get_application_property",
    "set_application_property", "get_set_application_security", "create_application",
    "delete_application", "transfer_entity", "use_action", "send_text_room",
    "send_text_room_unrestricted", "send_text_entity", "character_online",
    "find_character_by_name", "run_as_requester",
];

/// Build a checker from its stable name; `None` for unknown names.
pub fn checker_by_name(name: &str, helpers: &Arc<CheckerHelpers>) -> Option<Arc<dyn SecurityChecker>> {
    let h = helpers.clone();
    let checker: Arc<dyn SecurityChecker> = match name {
        "cross_site" => Arc::new(CrossSiteChecker::new(h)),
        "admin" => Arc::new(AdminSecurityChecker),
        "accept_all" => Arc::new(AcceptAllChecker),
        "create_entity" => Arc::new(CreateEntityChecker),
        "delete_entity" => Arc::new(DeleteEntityChecker::new(h)),
        "get_contains" => Arc::new(GetContainsChecker::new(h)),
        "get_entity_field" => Arc::new(GetEntityFieldChecker::new(h)),
        "set_entity_field" => Arc::new(SetEntityFieldChecker::new(h)),
        "convert_id_to_name" => Arc::new(ConvertIdToNameChecker::new(h)),
        "get_application_property" => Arc::new(GetApplicationPropertyChecker::new(h)),
        "set_application_property" => Arc::new(SetApplicationPropertyChecker::new(h)),
        "get_set_application_security" => Arc::new(GetSetApplicationSecurityChecker::new(h)),
        "create_application" => Arc::new(CreateApplicationChecker::new(h)),
        "delete_application" => Arc::new(DeleteApplicationChecker::new(h)),
        "transfer_entity" => Arc::new(TransferEntityChecker::new(h)),
        "use_action" => Arc::new(UseActionChecker::new(h)),
        "send_text_room" => Arc::new(SendTextRoomChecker::new(h)),
        "send_text_room_unrestricted" => Arc::new(CapabilityChecker::send_text_room_unrestricted()),
        "send_text_entity" => Arc::new(CapabilityChecker::send_text_entity()),
        "character_online" => Arc::new(CapabilityChecker::character_online()),
        "find_character_by_name" => Arc::new(CapabilityChecker::find_character_by_name()),
        "run_as_requester" => Arc::new(CapabilityChecker::run_as_requester()),
        _ => return None,
    };
    Some(checker)
}

/// Operation-specific checkers, in evaluation order. The site and admin
/// checkers that lead every chain are not included.
pub fn builtin_chain(op: Operation) -> &'static [&'static str] {
    match op {
        Operation::GetContains => &["get_contains"],
        Operation::GetEntityField => &["get_entity_field"],
        Operation::SetEntityField => &["set_entity_field"],
        Operation::GetApplicationProperty => &["get_application_property"],
        Operation::SetApplicationProperty => &["set_application_property"],
        Operation::GetApplicationSecurity | Operation::SetApplicationSecurity => &["get_set_application_security"],
        Operation::CreateApplication => &["create_application"],
        Operation::DeleteApplication => &["delete_application"],
        Operation::CreateEntity => &["create_entity"],
        Operation::DeleteEntity => &["delete_entity"],
        Operation::FindByNameRelative => &["accept_all"],
        Operation::FindCharacterByName => &["find_character_by_name"],
        Operation::ConvertIdToName => &["convert_id_to_name"],
        Operation::UseAction => &["use_action"],
        Operation::TransferEntity => &["transfer_entity"],
        Operation::SendTextRoom => &["send_text_room"],
        Operation::SendTextRoomUnrestricted => &["send_text_room_unrestricted"],
        Operation::SendTextEntity => &["send_text_entity"],
        Operation::CharacterOnline => &["character_online"],
        Operation::RunAsRequester => &["run_as_requester"],
    }
}
