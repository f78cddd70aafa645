use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ids::EntityId;
use super::security::Security;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Id(EntityId),
}

impl PropertyValue {
    pub fn as_display(&self) -> String {
        match self {
            PropertyValue::String(s) => s.clone(),
            PropertyValue::Integer(i) => i.to_string(),
            PropertyValue::Float(f) => f.to_string(),
            PropertyValue::Boolean(b) => b.to_string(),
            PropertyValue::Id(id) => id.to_string(),
        }
    }
}

/// One named application's property tree on an entity, with its own owner and
/// security record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationProperties {
    pub owner: EntityId,
    #[serde(default)]
    pub security: Security,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}

impl ApplicationProperties {
    pub fn new(owner: EntityId) -> Self { Self { owner, security: Security::default(), properties: BTreeMap::new() } }
}

/// Extract the application name from a property path: `/app/sub/path` and
/// `app/sub` both yield `app`. Empty names yield None.
pub fn application_name(path: &str) -> Option<&str> {
    let t = path.trim().trim_start_matches('/');
    let name = match t.find('/') { Some(idx) => &t[..idx], None => t };
    let name = name.trim();
    if name.is_empty() { None } else { Some(name) }
}

/// Path inside the application (`/app/sub/path` -> `sub/path`).
pub fn property_subpath(path: &str) -> &str {
    let t = path.trim().trim_start_matches('/');
    match t.find('/') { Some(idx) => &t[idx + 1..], None => "" }
}
