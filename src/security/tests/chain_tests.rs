use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::world::{World, GLOBAL, OTHER_SITE, SITE};
use crate::dbinterface::EntityRef;
use crate::dbtype::{EntityField, EntityId, EntityType, SecurityFlag};
use crate::security::{Capability, CheckResult, Context, Operation, SecurityChecker};

/// Accepts everything and counts how often it was asked.
#[derive(Default)]
struct Counting {
    calls: AtomicUsize,
}

impl Counting {
    fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
    fn hit(&self) -> CheckResult { self.calls.fetch_add(1, Ordering::SeqCst); CheckResult::Accept }
}

impl SecurityChecker for Counting {
    fn name(&self) -> &'static str { "counting" }
    fn check_target(&self, _: Operation, _: &Context, _: &EntityRef) -> CheckResult { self.hit() }
    fn check_field(&self, _: Operation, _: &Context, _: &EntityRef, _: EntityField) -> CheckResult { self.hit() }
    fn check_application(&self, _: Operation, _: &Context, _: &EntityRef, _: &str) -> CheckResult { self.hit() }
}

fn counting_world() -> (World, Arc<Counting>) {
    let counter = Arc::new(Counting::default());
    let as_checker = || counter.clone() as Arc<dyn SecurityChecker>;
    let extra = vec![
        (Operation::FindByNameRelative, as_checker()),
        (Operation::GetEntityField, as_checker()),
        (Operation::CreateApplication, as_checker()),
    ];
    (World::with_config(World::test_config(), extra), counter)
}

#[test]
fn repeated_checks_hit_the_context_cache() {
    let (w, counter) = counting_world();
    let alice = w.player("Alice", None);
    let rock = w.entity(EntityType::Thing, "rock", EntityId::default(), None);
    let mut ctx = w.ctx(&alice);

    assert_eq!(w.access.security_check_target(Operation::FindByNameRelative, &mut ctx, &rock, false), Ok(true));
    assert_eq!(w.access.security_check_target(Operation::FindByNameRelative, &mut ctx, &rock, false), Ok(true));
    assert_eq!(counter.calls(), 1);

    // A fresh context starts cold.
    let mut fresh = w.ctx(&alice);
    assert_eq!(w.access.security_check_target(Operation::FindByNameRelative, &mut fresh, &rock, false), Ok(true));
    assert_eq!(counter.calls(), 2);
}

#[test]
fn field_and_application_are_part_of_the_cache_key() {
    let (w, counter) = counting_world();
    let alice = w.player("Alice", None);
    let mut ctx = w.ctx(&alice);

    assert_eq!(w.access.security_check_field(Operation::GetEntityField, &mut ctx, &alice, EntityField::Id, false), Ok(true));
    assert_eq!(w.access.security_check_field(Operation::GetEntityField, &mut ctx, &alice, EntityField::Id, false), Ok(true));
    assert_eq!(counter.calls(), 1);
    assert_eq!(w.access.security_check_field(Operation::GetEntityField, &mut ctx, &alice, EntityField::Name, false), Ok(true));
    assert_eq!(counter.calls(), 2);

    assert_eq!(w.access.security_check_application(Operation::CreateApplication, &mut ctx, &alice, "mail", false), Ok(true));
    assert_eq!(w.access.security_check_application(Operation::CreateApplication, &mut ctx, &alice, "/mail/inbox", false), Ok(true));
    assert_eq!(counter.calls(), 3);
    assert_eq!(w.access.security_check_application(Operation::CreateApplication, &mut ctx, &alice, "bank", false), Ok(true));
    assert_eq!(counter.calls(), 4);

    ctx.reset_capabilities();
    assert_eq!(w.access.security_check_application(Operation::CreateApplication, &mut ctx, &alice, "bank", false), Ok(true));
    assert_eq!(counter.calls(), 5);
}

#[test]
fn other_sites_are_refused_even_for_admins() {
    let w = World::new();
    let admin_cap = w.capability(SITE, Capability::Admin);
    let alice = w.player("Alice", None);
    w.add_member(&admin_cap, &alice);
    let foreign = w.entity_in(OTHER_SITE, EntityType::Thing, "relic", EntityId::default(), None);
    foreign.write().unwrap().security_mut().other_flags = SecurityFlag::READ | SecurityFlag::WRITE;

    let mut ctx = w.ctx(&alice);
    for op in [Operation::GetContains, Operation::ConvertIdToName, Operation::DeleteEntity, Operation::FindByNameRelative] {
        assert_eq!(w.access.security_check_target(op, &mut ctx, &foreign, false), Ok(false), "{}", op);
    }
    assert!(ctx.is_admin());
    assert_eq!(w.access.security_check_field(Operation::SetEntityField, &mut ctx, &foreign, EntityField::Note, false), Ok(false));
}

#[test]
fn global_site_entities_are_reachable_but_not_administered() {
    let w = World::new();
    let admin_cap = w.capability(SITE, Capability::Admin);
    let alice = w.player("Alice", None);
    w.add_member(&admin_cap, &alice);
    let shared = w.entity_in(GLOBAL, EntityType::Thing, "signpost", EntityId::default(), None);

    let mut ctx = w.ctx(&alice);
    assert_eq!(w.access.security_check_target(Operation::GetContains, &mut ctx, &shared, false), Ok(false));
    shared.write().unwrap().security_mut().other_flags = SecurityFlag::READ;
    ctx.reset_capabilities();
    assert_eq!(w.access.security_check_target(Operation::GetContains, &mut ctx, &shared, false), Ok(true));
}

#[test]
fn admins_pass_on_their_own_site() {
    let w = World::new();
    let admin_cap = w.capability(SITE, Capability::Admin);
    let alice = w.player("Alice", None);
    let bob = w.player("Bob", None);
    w.add_member(&admin_cap, &alice);

    let mut admin_ctx = w.ctx(&alice);
    let mut plain_ctx = w.ctx(&bob);
    assert_eq!(w.access.security_check_field(Operation::SetEntityField, &mut admin_ctx, &bob, EntityField::Security, false), Ok(true));
    assert_eq!(w.access.security_check_field(Operation::SetEntityField, &mut plain_ctx, &alice, EntityField::Security, false), Ok(false));
    assert_eq!(w.access.security_check_entity_type(Operation::CreateEntity, &mut admin_ctx, EntityType::Program, false), Ok(true));
    assert_eq!(w.access.security_check(Operation::CharacterOnline, &mut admin_ctx, false), Ok(true));
    assert_eq!(w.access.security_check(Operation::CharacterOnline, &mut plain_ctx, false), Ok(false));
}

#[test]
fn invalid_arguments_never_raise() {
    let w = World::new();
    let alice = w.player("Alice", None);
    let mut ctx = w.ctx(&alice);
    let missing = EntityRef::invalid();
    assert_eq!(w.access.security_check_target(Operation::GetContains, &mut ctx, &missing, true), Ok(false));
    assert_eq!(w.access.security_check_field(Operation::GetEntityField, &mut ctx, &missing, EntityField::Id, true), Ok(false));
    assert_eq!(w.access.security_check_source(Operation::TransferEntity, &mut ctx, &alice, &missing, true), Ok(false));
    assert_eq!(w.access.security_check_application(Operation::GetApplicationProperty, &mut ctx, &alice, "", true), Ok(false));
    assert_eq!(w.access.security_check_application(Operation::GetApplicationProperty, &mut ctx, &alice, "/", true), Ok(false));
    assert_eq!(ctx.cached_results(), 0);
}

#[test]
fn throwing_variant_reports_the_denied_request() {
    let w = World::new();
    let alice = w.player("Alice", None);
    let bob = w.player("Bob", None);
    let mut ctx = w.ctx(&alice);

    let err = w.access.security_check_field(Operation::SetEntityField, &mut ctx, &bob, EntityField::Note, true).unwrap_err();
    assert_eq!(err.operation, Operation::SetEntityField);
    assert_eq!(err.requester, alice.id());
    assert_eq!(err.target, Some(bob.id()));
    assert_eq!(err.field, Some(EntityField::Note));
    assert!(err.to_string().contains("set_entity_field"));

    let err = w.access.security_check_entity_type(Operation::CreateEntity, &mut ctx, EntityType::Room, true).unwrap_err();
    assert_eq!(err.entity_type, Some(EntityType::Room));

    // Accepted checks never raise.
    assert_eq!(w.access.security_check_field(Operation::SetEntityField, &mut ctx, &alice, EntityField::Note, true), Ok(true));
}

#[test]
fn configured_extras_are_appended_and_bad_names_skipped() {
    let mut cfg = World::test_config();
    cfg.extra_checkers = BTreeMap::from([
        ("send_text_entity".to_string(), vec!["accept_all".to_string(), "no_such_checker".to_string()]),
        ("no_such_operation".to_string(), vec!["admin".to_string()]),
    ]);
    let w = World::with_config(cfg, Vec::new());
    assert_eq!(w.access.checker_names(Operation::SendTextEntity), vec!["cross_site", "admin", "send_text_entity", "accept_all"]);
    assert_eq!(w.access.checker_names(Operation::GetContains), vec!["cross_site", "admin", "get_contains"]);

    // A deny earlier in the chain still wins over the appended accept.
    let alice = w.player("Alice", None);
    let bob = w.player("Bob", None);
    let mut ctx = w.ctx(&alice);
    assert_eq!(w.access.security_check_target(Operation::SendTextEntity, &mut ctx, &bob, false), Ok(false));
}

#[test]
fn relative_name_lookup_is_always_allowed() {
    let w = World::new();
    let alice = w.player("Alice", None);
    let stranger = w.entity(EntityType::Thing, "box", EntityId::new(SITE, 999), None);
    let mut ctx = w.ctx(&alice);
    assert_eq!(w.access.security_check_target(Operation::FindByNameRelative, &mut ctx, &stranger, false), Ok(true));
    assert_eq!(w.access.security_check(Operation::FindCharacterByName, &mut ctx, false), Ok(false));
}
