use serde::Serialize;
use std::fmt::Write as _;

use super::operation::Operation;
use crate::dbtype::{EntityField, EntityId, EntityType};

/// Raised by the `security_check*` entry points when the caller asked for
/// denials to be reported as errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{}", self.describe())]
pub struct SecurityViolation {
    pub operation: Operation,
    pub requester: EntityId,
    pub program: EntityId,
    pub target: Option<EntityId>,
    /// Second entity of a two-entity check (the entity being moved for
    /// transfers).
    pub moved: Option<EntityId>,
    pub application: Option<String>,
    pub field: Option<EntityField>,
    pub entity_type: Option<EntityType>,
}

impl SecurityViolation {
    pub fn new(operation: Operation, requester: EntityId, program: EntityId) -> Self {
        Self { operation, requester, program, target: None, moved: None, application: None, field: None, entity_type: None }
    }

    pub fn with_target(mut self, target: EntityId) -> Self { self.target = Some(target); self }
    pub fn with_moved(mut self, moved: EntityId) -> Self { self.moved = Some(moved); self }
    pub fn with_application(mut self, application: &str) -> Self { self.application = Some(application.to_string()); self }
    pub fn with_field(mut self, field: EntityField) -> Self { self.field = Some(field); self }
    pub fn with_entity_type(mut self, entity_type: EntityType) -> Self { self.entity_type = Some(entity_type); self }

    fn describe(&self) -> String {
        let mut s = format!("security violation: {} denied for requester {}", self.operation, self.requester);
        if self.program.is_valid() { let _ = write!(s, " via program {}", self.program); }
        if let Some(t) = &self.target { let _ = write!(s, " on {}", t); }
        if let Some(src) = &self.moved { let _ = write!(s, " moving {}", src); }
        if let Some(app) = &self.application { let _ = write!(s, " application '{}'", app); }
        if let Some(f) = &self.field { let _ = write!(s, " field {}", f.as_str()); }
        if let Some(t) = &self.entity_type { let _ = write!(s, " type {}", t.as_str()); }
        s
    }
}
