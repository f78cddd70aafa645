//! Per-entity permission record.
//!
//! A `Security` holds two flag sets: one applied to the explicit id list and one
//! applied to everybody else ("other"). The owner and the admin ids always have
//! full rights. An id is never in both the admin set and the list set.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::ids::EntityId;

/// Upper bound on each id list in a [`Security`] record.
pub const MAX_SECURITY_IDS: usize = 20;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct SecurityFlag: u8 {
        const READ = 0b0001;
        const WRITE = 0b0010;
        /// Reduced visibility used for "nearby" reads of base attributes.
        const BASIC = 0b0100;
        const CHOWN = 0b1000;
    }
}

/// Controls whether the BASIC flag may stand in for the flag being asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicFlagHandling {
    IncludeBasic,
    ExcludeBasic,
}

impl BasicFlagHandling {
    fn qualifies(self, flags: SecurityFlag, wanted: SecurityFlag) -> bool {
        flags.contains(wanted) || (self == BasicFlagHandling::IncludeBasic && flags.contains(SecurityFlag::BASIC))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Security {
    #[serde(default)]
    pub list_flags: SecurityFlag,
    #[serde(default)]
    pub other_flags: SecurityFlag,
    #[serde(default)]
    admin_ids: Vec<EntityId>,
    #[serde(default)]
    list_ids: Vec<EntityId>,
}

impl Security {
    pub fn new(list_flags: SecurityFlag, other_flags: SecurityFlag) -> Self {
        Self { list_flags, other_flags, admin_ids: Vec::new(), list_ids: Vec::new() }
    }

    pub fn admin_ids(&self) -> &[EntityId] { &self.admin_ids }
    pub fn list_ids(&self) -> &[EntityId] { &self.list_ids }

    pub fn is_admin_id(&self, id: &EntityId) -> bool { self.admin_ids.contains(id) }
    pub fn is_list_id(&self, id: &EntityId) -> bool { self.list_ids.contains(id) }

    /// Adds `id` as an admin, removing it from the list set. Returns false if the
    /// admin set is full or the id is invalid.
    pub fn add_admin(&mut self, id: EntityId) -> bool {
        if !id.is_valid() { return false; }
        if self.admin_ids.contains(&id) { return true; }
        if self.admin_ids.len() >= MAX_SECURITY_IDS { return false; }
        self.list_ids.retain(|x| *x != id);
        self.admin_ids.push(id);
        true
    }

    /// Adds `id` to the list set, removing it from the admin set. Returns false
    /// if the list set is full or the id is invalid.
    pub fn add_to_list(&mut self, id: EntityId) -> bool {
        if !id.is_valid() { return false; }
        if self.list_ids.contains(&id) { return true; }
        if self.list_ids.len() >= MAX_SECURITY_IDS { return false; }
        self.admin_ids.retain(|x| *x != id);
        self.list_ids.push(id);
        true
    }

    pub fn remove_admin(&mut self, id: &EntityId) -> bool {
        let before = self.admin_ids.len();
        self.admin_ids.retain(|x| x != id);
        before != self.admin_ids.len()
    }

    pub fn remove_from_list(&mut self, id: &EntityId) -> bool {
        let before = self.list_ids.len();
        self.list_ids.retain(|x| x != id);
        before != self.list_ids.len()
    }

    pub fn list_grants(&self, wanted: SecurityFlag, handling: BasicFlagHandling) -> bool {
        handling.qualifies(self.list_flags, wanted)
    }

    pub fn other_grants(&self, wanted: SecurityFlag, handling: BasicFlagHandling) -> bool {
        handling.qualifies(self.other_flags, wanted)
    }

    /// Pure evaluation against direct membership only: no group resolution.
    ///
    /// Explicit permission: a candidate is the owner, an admin, or in the list
    /// set while the list flags grant `wanted`. Otherwise the "other" flags decide.
    pub fn allows(&self, owner: &EntityId, wanted: SecurityFlag, first: &EntityId, second: Option<&EntityId>, handling: BasicFlagHandling) -> bool {
        for cand in std::iter::once(first).chain(second) {
            if !cand.is_valid() { continue; }
            if cand == owner || self.is_admin_id(cand) { return true; }
            if self.is_list_id(cand) && self.list_grants(wanted, handling) { return true; }
        }
        self.other_grants(wanted, handling)
    }

    /// Owner or admin-list standing, independent of any flag.
    pub fn is_admin(&self, owner: &EntityId, first: &EntityId, second: Option<&EntityId>) -> bool {
        std::iter::once(first).chain(second).any(|c| c.is_valid() && (c == owner || self.is_admin_id(c)))
    }
}
