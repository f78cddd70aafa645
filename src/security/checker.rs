use super::context::Context;
use super::operation::{CheckResult, Operation};
use crate::dbinterface::EntityRef;
use crate::dbtype::{EntityField, EntityType};

/// One vote in an operation's checker chain.
///
/// Every method defaults to `Skip`, so a checker only overrides the call
/// shapes it has an opinion on. Checkers are shared across threads and must
/// not keep per-request state; anything request-specific lives in the
/// [`Context`].
pub trait SecurityChecker: Send + Sync {
    /// Stable name used in configuration and logs.
    fn name(&self) -> &'static str;

    /// Operation with no target (global privileges).
    fn check(&self, _operation: Operation, _context: &Context) -> CheckResult { CheckResult::Skip }

    /// Operation parameterized by an entity type, e.g. creation.
    fn check_entity_type(&self, _operation: Operation, _context: &Context, _entity_type: EntityType) -> CheckResult { CheckResult::Skip }

    fn check_target(&self, _operation: Operation, _context: &Context, _target: &EntityRef) -> CheckResult { CheckResult::Skip }

    /// Application-scoped operation on `target`. `application` is already
    /// normalized to the application name.
    fn check_application(&self, _operation: Operation, _context: &Context, _target: &EntityRef, _application: &str) -> CheckResult { CheckResult::Skip }

    fn check_field(&self, _operation: Operation, _context: &Context, _target: &EntityRef, _field: EntityField) -> CheckResult { CheckResult::Skip }

    /// Two-entity operation. For transfers `target` is the destination and
    /// `source` the entity being moved.
    fn check_source(&self, _operation: Operation, _context: &Context, _target: &EntityRef, _source: &EntityRef) -> CheckResult { CheckResult::Skip }
}
