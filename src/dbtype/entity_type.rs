use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Type tag carried by every entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Entity,
    Region,
    Room,
    Player,
    Guest,
    Thing,
    Puppet,
    Vehicle,
    Group,
    Capability,
    Program,
    Action,
    Exit,
    Command,
}

impl EntityType {
    pub const ALL: [EntityType; 14] = [
        EntityType::Entity, EntityType::Region, EntityType::Room, EntityType::Player,
        EntityType::Guest, EntityType::Thing, EntityType::Puppet, EntityType::Vehicle,
        EntityType::Group, EntityType::Capability, EntityType::Program, EntityType::Action,
        EntityType::Exit, EntityType::Command,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Entity => "entity",
            EntityType::Region => "region",
            EntityType::Room => "room",
            EntityType::Player => "player",
            EntityType::Guest => "guest",
            EntityType::Thing => "thing",
            EntityType::Puppet => "puppet",
            EntityType::Vehicle => "vehicle",
            EntityType::Group => "group",
            EntityType::Capability => "capability",
            EntityType::Program => "program",
            EntityType::Action => "action",
            EntityType::Exit => "exit",
            EntityType::Command => "command",
        }
    }

    pub fn is_action(&self) -> bool { matches!(self, EntityType::Action | EntityType::Exit | EntityType::Command) }

    pub fn is_room_like(&self) -> bool { matches!(self, EntityType::Room | EntityType::Region) }

    pub fn is_region(&self) -> bool { matches!(self, EntityType::Region) }

    /// Something that can sit in a container (an inventory or a room).
    pub fn is_containable(&self) -> bool {
        matches!(self, EntityType::Player | EntityType::Guest | EntityType::Thing | EntityType::Puppet | EntityType::Vehicle | EntityType::Program)
    }

    pub fn is_container(&self) -> bool {
        matches!(self, EntityType::Region | EntityType::Room | EntityType::Player | EntityType::Guest | EntityType::Thing | EntityType::Puppet | EntityType::Vehicle)
    }

    pub fn is_character(&self) -> bool { matches!(self, EntityType::Player | EntityType::Guest | EntityType::Puppet) }

    pub fn is_group(&self) -> bool { matches!(self, EntityType::Group | EntityType::Capability) }

    /// Whether entities of this type carry application properties.
    pub fn has_properties(&self) -> bool { !matches!(self, EntityType::Entity | EntityType::Group | EntityType::Capability) }
}

impl Display for EntityType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase();
        EntityType::ALL.iter().copied().find(|t| t.as_str() == norm).ok_or_else(|| format!("unknown entity type '{}'", s))
    }
}

/// Addressable fields of an entity. Used by field-scoped security checks and
/// by change events to say what was modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityField {
    Id,
    Type,
    Version,
    Name,
    Note,
    Security,
    Owner,
    Flags,
    Deleted,
    CreatedTimestamp,
    UpdatedTimestamp,
    ApplicationProperties,
    ContainedBy,
    Home,
    ActionContainedBy,
    ActionTargets,
    ActionLock,
    ActionCommands,
    ActionSuccessMessage,
    ActionFailMessage,
    GroupIds,
    GroupDisabledIds,
    ProgramSourceCode,
    ProgramLanguage,
    PlayerDisplayName,
    Password,
}

impl EntityField {
    pub const ALL: [EntityField; 26] = [
        EntityField::Id, EntityField::Type, EntityField::Version, EntityField::Name, EntityField::Note,
        EntityField::Security, EntityField::Owner, EntityField::Flags, EntityField::Deleted,
        EntityField::CreatedTimestamp, EntityField::UpdatedTimestamp, EntityField::ApplicationProperties,
        EntityField::ContainedBy, EntityField::Home, EntityField::ActionContainedBy, EntityField::ActionTargets,
        EntityField::ActionLock, EntityField::ActionCommands, EntityField::ActionSuccessMessage,
        EntityField::ActionFailMessage, EntityField::GroupIds, EntityField::GroupDisabledIds,
        EntityField::ProgramSourceCode, EntityField::ProgramLanguage, EntityField::PlayerDisplayName,
        EntityField::Password,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityField::Id => "id",
            EntityField::Type => "type",
            EntityField::Version => "version",
            EntityField::Name => "name",
            EntityField::Note => "note",
            EntityField::Security => "security",
            EntityField::Owner => "owner",
            EntityField::Flags => "flags",
            EntityField::Deleted => "deleted",
            EntityField::CreatedTimestamp => "created_timestamp",
            EntityField::UpdatedTimestamp => "updated_timestamp",
            EntityField::ApplicationProperties => "application_properties",
            EntityField::ContainedBy => "contained_by",
            EntityField::Home => "home",
            EntityField::ActionContainedBy => "action_contained_by",
            EntityField::ActionTargets => "action_targets",
            EntityField::ActionLock => "action_lock",
            EntityField::ActionCommands => "action_commands",
            EntityField::ActionSuccessMessage => "action_success_message",
            EntityField::ActionFailMessage => "action_fail_message",
            EntityField::GroupIds => "group_ids",
            EntityField::GroupDisabledIds => "group_disabled_ids",
            EntityField::ProgramSourceCode => "program_source_code",
            EntityField::ProgramLanguage => "program_language",
            EntityField::PlayerDisplayName => "player_display_name",
            EntityField::Password => "password",
        }
    }
}

impl Display for EntityField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for EntityField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase();
        EntityField::ALL.iter().copied().find(|f| f.as_str() == norm).ok_or_else(|| format!("unknown entity field '{}'", s))
    }
}
