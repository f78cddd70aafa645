//! Database collaborator: entity storage, reference-counted handles and
//! per-entity reader/writer lock tokens.

mod entity_ref;
mod database;

pub use entity_ref::{EntityRef, ReaderLockToken, WriterLockToken};
pub use database::{Database, SiteRecord, WorldSnapshot};
