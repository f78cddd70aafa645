//! Authorization for the shared world.
//!
//! Each [`Operation`] has a chain of [`SecurityChecker`]s. [`SecurityAccess`]
//! asks the chain in order and folds the votes: the first deny (or
//! accept-always) ends the evaluation, plain accepts only count when nobody
//! objects, and a chain where everyone skips denies.

mod access;
mod capability_cache;
mod checker;
pub mod checkers;
mod context;
mod error;
mod helpers;
mod operation;


pub use access::SecurityAccess;
pub use capability_cache::{CapabilityCache, CapabilityInvalidator};
pub use checker::SecurityChecker;
pub use context::{CacheKey, Context, ProcessId, CONTEXT_CACHE_SIZE};
pub use error::SecurityViolation;
pub use helpers::{CheckerHelpers, SecuritySnapshot};
pub use operation::{fold_results, Capability, CheckResult, Operation};
