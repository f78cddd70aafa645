//! Entity data model shared by the database, the event bus and the security
//! engine. Plain data only; locking and storage live in `dbinterface`.

mod ids;
mod entity_type;
mod security;
mod property;
mod lock;
mod entity;

pub use ids::{EntityId, EntityNumber, SiteId};
pub use entity_type::{EntityField, EntityType};
pub use security::{BasicFlagHandling, Security, SecurityFlag, MAX_SECURITY_IDS};
pub use property::{application_name, property_subpath, ApplicationProperties, PropertyValue};
pub use lock::Lock;
pub use entity::{ActionData, Entity, GroupData, ProgramData};
