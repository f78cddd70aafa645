use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::entity_type::{EntityField, EntityType};
use super::ids::EntityId;
use super::lock::Lock;
use super::property::ApplicationProperties;
use super::security::Security;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionData {
    #[serde(default)]
    pub targets: Vec<EntityId>,
    #[serde(default)]
    pub lock: Lock,
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub success_message: String,
    #[serde(default)]
    pub fail_message: String,
}

/// Membership list of a group or capability entity. Members may themselves be
/// groups or capabilities; disabled members are listed but hold nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupData {
    #[serde(default)]
    pub members: BTreeSet<EntityId>,
    #[serde(default)]
    pub disabled: BTreeSet<EntityId>,
}

impl GroupData {
    pub fn is_member(&self, id: &EntityId) -> bool { self.members.contains(id) && !self.disabled.contains(id) }

    /// Members not disabled, in id order.
    pub fn enabled_members(&self) -> impl Iterator<Item = &EntityId> + '_ {
        self.members.iter().filter(move |m| !self.disabled.contains(m))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramData {
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,
    entity_type: EntityType,
    name: String,
    #[serde(default)]
    note: String,
    owner: EntityId,
    #[serde(default)]
    security: Security,
    #[serde(default)]
    flags: BTreeSet<String>,
    #[serde(default)]
    deleted: bool,
    #[serde(default)]
    version: u32,
    #[serde(default = "Utc::now")]
    created: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    updated: DateTime<Utc>,
    #[serde(default)]
    applications: BTreeMap<String, ApplicationProperties>,
    #[serde(default)]
    contained_by: EntityId,
    #[serde(default)]
    home: EntityId,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    action: Option<ActionData>,
    #[serde(default)]
    group: Option<GroupData>,
    #[serde(default)]
    program: Option<ProgramData>,
    #[serde(skip)]
    changes: BTreeSet<EntityField>,
}

impl Entity {
    pub fn new(id: EntityId, entity_type: EntityType, name: &str, owner: EntityId) -> Self {
        let now = Utc::now();
        Self {
            id,
            entity_type,
            name: name.to_string(),
            note: String::new(),
            owner,
            security: Security::default(),
            flags: BTreeSet::new(),
            deleted: false,
            version: 1,
            created: now,
            updated: now,
            applications: BTreeMap::new(),
            contained_by: EntityId::default(),
            home: EntityId::default(),
            display_name: None,
            action: entity_type.is_action().then(ActionData::default),
            group: entity_type.is_group().then(GroupData::default),
            program: (entity_type == EntityType::Program).then(ProgramData::default),
            changes: BTreeSet::new(),
        }
    }

    fn touch(&mut self, field: EntityField) {
        self.changes.insert(field);
        self.version = self.version.wrapping_add(1);
        self.updated = Utc::now();
    }

    /// Fields modified since the last call.
    pub fn take_changes(&mut self) -> BTreeSet<EntityField> { std::mem::take(&mut self.changes) }

    pub fn has_changes(&self) -> bool { !self.changes.is_empty() }

    pub fn id(&self) -> EntityId { self.id }
    pub fn entity_type(&self) -> EntityType { self.entity_type }
    pub fn name(&self) -> &str { &self.name }
    pub fn note(&self) -> &str { &self.note }
    pub fn owner(&self) -> EntityId { self.owner }
    pub fn security(&self) -> &Security { &self.security }
    pub fn flags(&self) -> &BTreeSet<String> { &self.flags }
    pub fn is_deleted(&self) -> bool { self.deleted }
    pub fn version(&self) -> u32 { self.version }
    pub fn created(&self) -> DateTime<Utc> { self.created }
    pub fn updated(&self) -> DateTime<Utc> { self.updated }
    pub fn home(&self) -> EntityId { self.home }
    pub fn display_name(&self) -> Option<&str> { self.display_name.as_deref() }
    pub fn action(&self) -> Option<&ActionData> { self.action.as_ref() }
    pub fn group(&self) -> Option<&GroupData> { self.group.as_ref() }
    pub fn program(&self) -> Option<&ProgramData> { self.program.as_ref() }

    /// Container of this entity. For actions this is the entity the action is
    /// attached to.
    pub fn container(&self) -> EntityId { self.contained_by }

    pub fn application(&self, name: &str) -> Option<&ApplicationProperties> { self.applications.get(name) }
    pub fn application_names(&self) -> impl Iterator<Item = &String> + '_ { self.applications.keys() }

    pub fn set_name(&mut self, name: &str) { self.name = name.to_string(); self.touch(EntityField::Name); }
    pub fn set_note(&mut self, note: &str) { self.note = note.to_string(); self.touch(EntityField::Note); }
    pub fn set_owner(&mut self, owner: EntityId) { self.owner = owner; self.touch(EntityField::Owner); }
    pub fn set_security(&mut self, security: Security) { self.security = security; self.touch(EntityField::Security); }
    pub fn security_mut(&mut self) -> &mut Security { self.touch(EntityField::Security); &mut self.security }
    pub fn set_deleted(&mut self, deleted: bool) { self.deleted = deleted; self.touch(EntityField::Deleted); }
    pub fn set_home(&mut self, home: EntityId) { self.home = home; self.touch(EntityField::Home); }
    pub fn set_display_name(&mut self, name: Option<String>) { self.display_name = name; self.touch(EntityField::PlayerDisplayName); }

    pub fn add_flag(&mut self, flag: &str) -> bool {
        let added = self.flags.insert(flag.to_string());
        if added { self.touch(EntityField::Flags); }
        added
    }

    pub fn remove_flag(&mut self, flag: &str) -> bool {
        let removed = self.flags.remove(flag);
        if removed { self.touch(EntityField::Flags); }
        removed
    }

    pub fn set_container(&mut self, container: EntityId) {
        self.contained_by = container;
        let field = if self.entity_type.is_action() { EntityField::ActionContainedBy } else { EntityField::ContainedBy };
        self.touch(field);
    }

    pub fn set_application(&mut self, name: &str, app: ApplicationProperties) {
        self.applications.insert(name.to_string(), app);
        self.touch(EntityField::ApplicationProperties);
    }

    pub fn application_mut(&mut self, name: &str) -> Option<&mut ApplicationProperties> {
        if !self.applications.contains_key(name) { return None; }
        self.touch(EntityField::ApplicationProperties);
        self.applications.get_mut(name)
    }

    pub fn remove_application(&mut self, name: &str) -> Option<ApplicationProperties> {
        let out = self.applications.remove(name);
        if out.is_some() { self.touch(EntityField::ApplicationProperties); }
        out
    }

    /// Group membership mutation; no-op (false) for non-group entities.
    pub fn add_group_member(&mut self, member: EntityId) -> bool {
        let Some(g) = self.group.as_mut() else { return false; };
        let added = g.members.insert(member);
        if added { self.touch(EntityField::GroupIds); }
        added
    }

    pub fn remove_group_member(&mut self, member: &EntityId) -> bool {
        let Some(g) = self.group.as_mut() else { return false; };
        let removed = g.members.remove(member);
        if removed { self.touch(EntityField::GroupIds); }
        removed
    }

    pub fn set_member_disabled(&mut self, member: EntityId, disabled: bool) -> bool {
        let Some(g) = self.group.as_mut() else { return false; };
        let changed = if disabled { g.disabled.insert(member) } else { g.disabled.remove(&member) };
        if changed { self.touch(EntityField::GroupDisabledIds); }
        changed
    }

    pub fn set_action_lock(&mut self, lock: Lock) -> bool {
        let Some(a) = self.action.as_mut() else { return false; };
        a.lock = lock;
        self.touch(EntityField::ActionLock);
        true
    }

    pub fn set_action_targets(&mut self, targets: Vec<EntityId>) -> bool {
        let Some(a) = self.action.as_mut() else { return false; };
        a.targets = targets;
        self.touch(EntityField::ActionTargets);
        true
    }

    pub fn set_action_commands(&mut self, commands: Vec<String>) -> bool {
        let Some(a) = self.action.as_mut() else { return false; };
        a.commands = commands;
        self.touch(EntityField::ActionCommands);
        true
    }

    pub fn set_program_source(&mut self, language: &str, source: &str) -> bool {
        let Some(p) = self.program.as_mut() else { return false; };
        p.language = language.to_string();
        p.source = source.to_string();
        self.touch(EntityField::ProgramSourceCode);
        true
    }
}
