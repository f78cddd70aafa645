//! Security engine configuration.
//!
//! Loaded from a JSON file (missing file => defaults), then overlaid with
//! environment variables. Unknown keys are ignored so older files keep working.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::dbtype::{EntityId, SiteId};
use crate::error::{AppError, AppResult};

pub const ENV_GLOBAL_SITE: &str = "MUDSEC_GLOBAL_SITE";
pub const ENV_MAX_CONTAINER_DEPTH: &str = "MUDSEC_MAX_CONTAINER_DEPTH";

/// Ids that are treated as admins without any capability membership. Kept for
/// compatibility with existing worlds whose bootstrap accounts predate the
/// ADMIN capability entity.
pub const BUILTIN_ADMIN_IDS: [EntityId; 2] = [EntityId::new(1, 1), EntityId::new(1, 2)];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SecurityConfig {
    /// Site whose entities are visible from every other site.
    pub global_site_id: SiteId,
    pub implicit_admin_ids: Vec<EntityId>,
    /// Cap on container/region hops walked by locality checks.
    pub max_container_depth: usize,
    /// Operation name -> checker names appended after the built-in chain.
    pub extra_checkers: BTreeMap<String, Vec<String>>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            global_site_id: 1,
            implicit_admin_ids: BUILTIN_ADMIN_IDS.to_vec(),
            max_container_depth: 32,
            extra_checkers: BTreeMap::new(),
        }
    }
}

impl SecurityConfig {
    pub fn load_or_default(path: &Path) -> AppResult<Self> {
        let cfg = match std::fs::read(path) {
            Ok(bytes) => {
                let cfg: SecurityConfig = serde_json::from_slice(&bytes)
                    .map_err(|e| AppError::config("config_parse".to_string(), format!("{}: {}", path.display(), e)))?;
                info!(target: "mudsec::config", "loaded security config from {}", path.display());
                cfg
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(target: "mudsec::config", "no config at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => return Err(e.into()),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn apply_env_overrides(&mut self) -> AppResult<()> {
        if let Ok(v) = std::env::var(ENV_GLOBAL_SITE) {
            self.global_site_id = v.trim().parse().map_err(|e| AppError::config("config_env".to_string(), format!("{}='{}': {}", ENV_GLOBAL_SITE, v, e)))?;
        }
        if let Ok(v) = std::env::var(ENV_MAX_CONTAINER_DEPTH) {
            self.max_container_depth = v.trim().parse().map_err(|e| AppError::config("config_env".to_string(), format!("{}='{}': {}", ENV_MAX_CONTAINER_DEPTH, v, e)))?;
        }
        self.validate()
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.global_site_id == 0 { return Err(AppError::config("config_invalid", "global_site_id must be non-zero")); }
        if self.max_container_depth == 0 { return Err(AppError::config("config_invalid", "max_container_depth must be at least 1")); }
        Ok(())
    }

    pub fn is_implicit_admin(&self, id: &EntityId) -> bool { self.implicit_admin_ids.contains(id) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = SecurityConfig::load_or_default(&dir.path().join("nope.json")).unwrap();
        assert_eq!(cfg, SecurityConfig::default());
        assert!(cfg.is_implicit_admin(&EntityId::new(1, 2)));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("security.json");
        std::fs::write(&p, r#"{"global_site_id": 7, "extra_checkers": {"get_contains": ["accept_all"]}}"#).unwrap();
        let cfg = SecurityConfig::load_or_default(&p).unwrap();
        assert_eq!(cfg.global_site_id, 7);
        assert_eq!(cfg.max_container_depth, 32);
        assert_eq!(cfg.extra_checkers["get_contains"], vec!["accept_all".to_string()]);
    }

    #[test]
    fn malformed_or_invalid_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("security.json");
        std::fs::write(&p, "{ not json").unwrap();
        assert_eq!(SecurityConfig::load_or_default(&p).unwrap_err().code_str(), "config_parse");
        std::fs::write(&p, r#"{"max_container_depth": 0}"#).unwrap();
        assert_eq!(SecurityConfig::load_or_default(&p).unwrap_err().code_str(), "config_invalid");
    }
}
