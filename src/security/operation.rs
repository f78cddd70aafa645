use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Everything a session, program or subsystem can ask permission for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    GetContains,
    GetEntityField,
    SetEntityField,
    GetApplicationProperty,
    SetApplicationProperty,
    GetApplicationSecurity,
    SetApplicationSecurity,
    CreateApplication,
    DeleteApplication,
    CreateEntity,
    DeleteEntity,
    FindByNameRelative,
    FindCharacterByName,
    ConvertIdToName,
    UseAction,
    TransferEntity,
    SendTextRoom,
    SendTextRoomUnrestricted,
    SendTextEntity,
    CharacterOnline,
    RunAsRequester,
}

impl Operation {
    pub const ALL: [Operation; 21] = [
        Operation::GetContains, Operation::GetEntityField, Operation::SetEntityField,
        Operation::GetApplicationProperty, Operation::SetApplicationProperty,
        Operation::GetApplicationSecurity, Operation::SetApplicationSecurity,
        Operation::CreateApplication, Operation::DeleteApplication, Operation::CreateEntity,
        Operation::DeleteEntity, Operation::FindByNameRelative, Operation::FindCharacterByName,
        Operation::ConvertIdToName, Operation::UseAction, Operation::TransferEntity,
        Operation::SendTextRoom, Operation::SendTextRoomUnrestricted, Operation::SendTextEntity,
        Operation::CharacterOnline, Operation::RunAsRequester,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::GetContains => "get_contains",
            Operation::GetEntityField => "get_entity_field",
            Operation::SetEntityField => "set_entity_field",
            Operation::GetApplicationProperty => "get_application_property",
            Operation::SetApplicationProperty => "set_application_property",
            Operation::GetApplicationSecurity => "get_application_security",
            Operation::SetApplicationSecurity => "set_application_security",
            Operation::CreateApplication => "create_application",
            Operation::DeleteApplication => "delete_application",
            Operation::CreateEntity => "create_entity",
            Operation::DeleteEntity => "delete_entity",
            Operation::FindByNameRelative => "find_by_name_relative",
            Operation::FindCharacterByName => "find_character_by_name",
            Operation::ConvertIdToName => "convert_id_to_name",
            Operation::UseAction => "use_action",
            Operation::TransferEntity => "transfer_entity",
            Operation::SendTextRoom => "send_text_room",
            Operation::SendTextRoomUnrestricted => "send_text_room_unrestricted",
            Operation::SendTextEntity => "send_text_entity",
            Operation::CharacterOnline => "character_online",
            Operation::RunAsRequester => "run_as_requester",
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase();
        Operation::ALL.iter().copied().find(|o| o.as_str() == norm).ok_or_else(|| format!("unknown operation '{}'", s))
    }
}

/// Named global privilege. Each is backed by one capability entity per site
/// whose group membership decides who holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Admin,
    CreatePlayer,
    Builder,
    SendTextRoomUnrestricted,
    SendTextEntity,
    FindByNameAfar,
    AnyIdToName,
    CharacterOnline,
    RunAsUser,
}

impl Capability {
    pub const COUNT: usize = 9;

    pub const ALL: [Capability; Capability::COUNT] = [
        Capability::Admin, Capability::CreatePlayer, Capability::Builder,
        Capability::SendTextRoomUnrestricted, Capability::SendTextEntity, Capability::FindByNameAfar,
        Capability::AnyIdToName, Capability::CharacterOnline, Capability::RunAsUser,
    ];

    pub fn index(&self) -> usize { *self as usize }

    /// Name of the backing capability entity.
    pub fn entity_name(&self) -> &'static str {
        match self {
            Capability::Admin => "ADMIN",
            Capability::CreatePlayer => "CREATE_PLAYER",
            Capability::Builder => "BUILDER",
            Capability::SendTextRoomUnrestricted => "SEND_TEXT_ROOM_UNRESTRICTED",
            Capability::SendTextEntity => "SEND_TEXT_ENTITY",
            Capability::FindByNameAfar => "FIND_BY_NAME_AFAR",
            Capability::AnyIdToName => "ANY_ID_TO_NAME",
            Capability::CharacterOnline => "CHARACTER_ONLINE",
            Capability::RunAsUser => "RUN_AS_USER",
        }
    }
}

impl Display for Capability {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.entity_name()) }
}

/// One checker's vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckResult {
    Accept,
    /// Accept and stop consulting further checkers.
    AcceptAlways,
    Deny,
    DenyAlways,
    /// No opinion.
    Skip,
}

impl CheckResult {
    pub fn from_bool(allowed: bool) -> Self { if allowed { CheckResult::Accept } else { CheckResult::Deny } }

    /// Fold this vote into `aggregate`. Returns true when evaluation stops.
    ///
    /// Accept only promotes a still-undecided aggregate; either "always"
    /// variant and any deny end the chain.
    pub fn fold_into(self, aggregate: &mut CheckResult) -> bool {
        match self {
            CheckResult::Accept => {
                if *aggregate == CheckResult::Skip { *aggregate = CheckResult::Accept; }
                false
            }
            CheckResult::AcceptAlways => { *aggregate = CheckResult::Accept; true }
            CheckResult::Deny | CheckResult::DenyAlways => { *aggregate = CheckResult::Deny; true }
            CheckResult::Skip => false,
        }
    }
}

/// Fold a lazily produced sequence of votes. Votes after a short-circuit are
/// never produced. An all-skip (or empty) sequence is a denial.
pub fn fold_results<I>(votes: I) -> CheckResult
where
    I: IntoIterator<Item = CheckResult>,
{
    let mut aggregate = CheckResult::Skip;
    for vote in votes {
        if vote.fold_into(&mut aggregate) { break; }
    }
    if aggregate == CheckResult::Skip { CheckResult::Deny } else { aggregate }
}
