use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub type SiteId = u32;
pub type EntityNumber = u64;

/// Identifies an entity as a (site, number) pair. The all-zero id is the
/// invalid/default id; it never names a stored entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId {
    pub site_id: SiteId,
    pub entity_id: EntityNumber,
}

impl EntityId {
    pub const fn new(site_id: SiteId, entity_id: EntityNumber) -> Self { Self { site_id, entity_id } }

    pub fn is_default(&self) -> bool { self.site_id == 0 && self.entity_id == 0 }

    pub fn is_valid(&self) -> bool { self.site_id != 0 && self.entity_id != 0 }

    pub fn site(&self) -> SiteId { self.site_id }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}-{}", self.site_id, self.entity_id)
    }
}

impl FromStr for EntityId {
    type Err = String;

    /// Accepts `site-entity` with an optional leading `#`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim().trim_start_matches('#');
        let Some((site, num)) = t.split_once('-') else { return Err(format!("malformed entity id '{}'", s)); };
        let site_id = site.trim().parse::<SiteId>().map_err(|e| format!("bad site in '{}': {}", s, e))?;
        let entity_id = num.trim().parse::<EntityNumber>().map_err(|e| format!("bad entity number in '{}': {}", s, e))?;
        Ok(Self { site_id, entity_id })
    }
}
